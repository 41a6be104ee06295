// State management and watermark tracking

pub mod manager;
pub mod storage;
pub mod watermark;

pub use manager::StateManager;
pub use storage::{JsonFileStateStorage, StateStorage};
pub use watermark::Watermark;
