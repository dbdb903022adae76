pub mod mapper;
pub mod normalizer;
pub mod vocabulary;

// Re-export commonly used types
pub use mapper::{
    BlockMappingResult, MappingConfidence, MappingStats, ParameterMapper, ParameterMapping,
};
pub use normalizer::{AnalysisStats, InterfaceNormalizer, NormalizationOutcome, NormalizationReport};
pub use vocabulary::CanonicalVocabulary;
