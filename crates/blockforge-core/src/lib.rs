pub mod block;
pub mod catalog;
pub mod error;
pub mod id;
pub mod log;
pub mod types;

// Re-export commonly used types
pub use block::{BlockRecord, Param, SourceLocation};
pub use catalog::Catalog;
pub use error::CoreError;
pub use id::BlockId;
pub use log::LogFields;
pub use types::{DataType, PurityLevel};
