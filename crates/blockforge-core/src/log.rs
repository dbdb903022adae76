//! Flat key-value projection for result types.
//!
//! Every batch/result type in the workspace implements [`LogFields`] so hosts
//! can log outcomes as flat fields without committing to a serialization
//! format.

/// Projects a result type onto flat `(key, value)` pairs for logging.
pub trait LogFields {
    /// Returns the type's loggable fields. Keys are stable identifiers;
    /// values are already rendered.
    fn log_fields(&self) -> Vec<(&'static str, String)>;
}
