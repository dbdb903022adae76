//! Compatibility scoring configuration.
//!
//! The score weights, thresholds, and conversion-risk table are overridable
//! defaults, not load-bearing invariants. [`CompatibilityConfig::validate`]
//! rejects out-of-range values up front: a bad threshold is programmer error
//! and fails fast, before any data flows through the checker.

use thiserror::Error;

use blockforge_core::DataType;

/// Configuration errors in the composition layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A weight, threshold, or risk value outside its allowed range.
    #[error("{name} out of range: {value} (expected {expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Tunable constants for compatibility scoring and trust gating.
#[derive(Debug, Clone)]
pub struct CompatibilityConfig {
    /// Weight of the type-match fraction in the overall score.
    pub type_weight: f64,
    /// Weight of the constraint score in the overall score.
    pub constraint_weight: f64,
    /// Weight of the trust score in the overall score.
    pub trust_weight: f64,
    /// Score deducted per constraint issue.
    pub constraint_penalty: f64,
    /// Minimum overall score for COMPATIBLE status.
    pub compatible_threshold: f64,
    /// Minimum overall score for PARTIAL status.
    pub partial_threshold: f64,
    /// Absolute trust floor below which a block is never trust-compatible.
    pub trust_floor: f64,
    /// Maximum allowed gap between two blocks' trust scores.
    pub max_trust_gap: f64,
    /// Risk weight per `(source, target)` conversion pair. Pairs not listed
    /// carry zero risk.
    pub conversion_risks: Vec<(DataType, DataType, f64)>,
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        CompatibilityConfig {
            type_weight: 0.4,
            constraint_weight: 0.4,
            trust_weight: 0.2,
            constraint_penalty: 0.2,
            compatible_threshold: 0.8,
            partial_threshold: 0.5,
            trust_floor: 0.2,
            max_trust_gap: 0.5,
            conversion_risks: vec![
                (DataType::Integer, DataType::Float, 0.0),
                (DataType::Float, DataType::Integer, 0.3),
                (DataType::String, DataType::Integer, 0.5),
                (DataType::String, DataType::Float, 0.5),
                (DataType::Any, DataType::Any, 0.1),
            ],
        }
    }
}

impl CompatibilityConfig {
    /// Checks every value is in range. Call before using a custom config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_range = [
            ("type_weight", self.type_weight),
            ("constraint_weight", self.constraint_weight),
            ("trust_weight", self.trust_weight),
            ("constraint_penalty", self.constraint_penalty),
            ("compatible_threshold", self.compatible_threshold),
            ("partial_threshold", self.partial_threshold),
            ("trust_floor", self.trust_floor),
            ("max_trust_gap", self.max_trust_gap),
        ];
        for (name, value) in unit_range {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    expected: "[0, 1]",
                });
            }
        }
        if self.partial_threshold > self.compatible_threshold {
            return Err(ConfigError::OutOfRange {
                name: "partial_threshold",
                value: self.partial_threshold,
                expected: "<= compatible_threshold",
            });
        }
        for (_, _, risk) in &self.conversion_risks {
            if !(0.0..=1.0).contains(risk) {
                return Err(ConfigError::OutOfRange {
                    name: "conversion_risk",
                    value: *risk,
                    expected: "[0, 1]",
                });
            }
        }
        Ok(())
    }

    /// Risk weight for a conversion pair; unlisted pairs carry zero risk.
    pub fn conversion_risk(&self, source: DataType, target: DataType) -> f64 {
        self.conversion_risks
            .iter()
            .find(|(s, t, _)| *s == source && *t == target)
            .map(|(_, _, risk)| *risk)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CompatibilityConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let config = CompatibilityConfig {
            type_weight: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "type_weight", .. })
        ));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let config = CompatibilityConfig {
            compatible_threshold: 0.4,
            partial_threshold: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_risk_is_rejected() {
        let config = CompatibilityConfig {
            conversion_risks: vec![(DataType::Float, DataType::Integer, -0.1)],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn risk_lookup_defaults_to_zero() {
        let config = CompatibilityConfig::default();
        assert_eq!(config.conversion_risk(DataType::Float, DataType::Integer), 0.3);
        assert_eq!(config.conversion_risk(DataType::String, DataType::Float), 0.5);
        assert_eq!(config.conversion_risk(DataType::List, DataType::Dict), 0.0);
    }
}
