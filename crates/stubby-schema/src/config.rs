//! Synthesis configuration, read from the `[config]` table of an API file.

use serde::Deserialize;

use crate::error::SchemaError;

/// Knobs for the constraint model, the search and the random synthesizer.
///
/// Every field has a default, so an API file may omit the table entirely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthConfig {
    /// Domain of RESULT-rooted integer variables.
    pub int_min: i64,
    pub int_max: i64,
    /// Grid step of RESULT-rooted real variables.
    pub real_precision: f64,
    /// Decimal places kept when a solved real is written back.
    pub real_decimals: u32,
    /// Exclusive upper bound on generated collection sizes.
    pub max_collection_size: usize,
    /// Nesting depth past which collections are empty and structs are null.
    pub max_depth: usize,
    /// Pattern for randomly generated strings.
    pub string_pattern: String,
    /// Extra repetitions allowed for unbounded regex repeats (`*`, `+`, `{m,}`).
    pub max_repeat: u32,
    /// Milliseconds z3 may spend on one satisfiability check.
    pub solve_timeout_ms: u32,
    /// Fixed seed for reproducible output; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            int_min: -1_000_000,
            int_max: 1_000_000,
            real_precision: 0.01,
            real_decimals: 2,
            max_collection_size: 10,
            max_depth: 6,
            string_pattern: "[a-zA-Z0-9]{0,10}".to_string(),
            max_repeat: 10,
            solve_timeout_ms: 10_000,
            seed: None,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<(), SchemaError> {
        let invalid = |message: &str| {
            Err(SchemaError::InvalidConfig {
                message: message.to_string(),
            })
        };
        if self.int_min > self.int_max {
            return invalid("int_min must not exceed int_max");
        }
        if !(self.real_precision > 0.0 && self.real_precision.is_finite()) {
            return invalid("real_precision must be a positive number");
        }
        if self.max_collection_size == 0 {
            return invalid("max_collection_size must be at least 1");
        }
        if self.solve_timeout_ms == 0 {
            return invalid("solve_timeout_ms must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SynthConfig::default();
        assert_eq!(config.int_max, 1_000_000);
        assert_eq!(config.real_decimals, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let config: SynthConfig = toml::from_str("seed = 7\nmax_depth = 2").unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.max_collection_size, 10);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<SynthConfig>("sed = 7").is_err());
    }

    #[test]
    fn validation_failures() {
        let config = SynthConfig {
            int_min: 5,
            int_max: 1,
            ..SynthConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "invalid configuration: int_min must not exceed int_max"
        );

        let config = SynthConfig {
            real_precision: 0.0,
            ..SynthConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
