//! Domain models and types for the extractor.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RestaurantGuid`], [`ManagementGroupGuid`])
//! - **Value types** ([`Category`], [`ExtractionWindow`])
//! - **Error types** ([`ExtractorError`], [`ToastApiError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ExtractorError>`]:
//!
//! ```rust
//! use toast_extractor::domain::{ExtractorError, Result};
//!
//! fn example(page_size: u32) -> Result<()> {
//!     if page_size == 0 {
//!         return Err(ExtractorError::Validation("page_size must be > 0".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod category;
pub mod errors;
pub mod ids;
pub mod result;
pub mod window;

// Re-export commonly used types for convenience
pub use category::Category;
pub use errors::{ExtractorError, ToastApiError};
pub use ids::{ManagementGroupGuid, RestaurantGuid};
pub use result::Result;
pub use window::ExtractionWindow;
