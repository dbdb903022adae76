pub mod error;
pub mod policy;
pub mod processor;
pub mod report;
pub mod signature;
pub mod store;

// Re-export commonly used types
pub use error::{DedupError, StoreError};
pub use policy::{BlockAction, DedupAction, DedupPolicy, PolicyDecision, PolicyEngine, PolicyStats};
pub use processor::{DeduplicationProcessor, ProcessingReport};
pub use report::DedupReport;
pub use signature::{BlockSignature, DuplicateGroup, HasherStats, SignatureHasher};
pub use store::{CatalogStore, EntryError, JsonStore, LoadOutcome, MaterializeOutcome, MemoryStore};
