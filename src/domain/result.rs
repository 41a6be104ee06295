//! Result type alias for the extractor
//!
//! This module provides a convenient Result type alias that uses ExtractorError
//! as the error type.

use super::errors::ExtractorError;

/// Result type alias for extractor operations
///
/// # Examples
///
/// ```
/// use toast_extractor::domain::result::Result;
/// use toast_extractor::domain::errors::ExtractorError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ExtractorError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExtractorError>;
