//! Drafting strategy selection and validation.
//!
//! The generation loop picks a drafting strategy once per session from its
//! deserialized configuration. `DrafterConfig::build` is the validating
//! entry point: it rejects degenerate parameter combinations up front so the
//! drafters themselves can stay total functions with no defensive checks in
//! the per-token path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drafter::{
    KeyedNgramConfig, KeyedNgramMap, SelfDrafter, SimpleNgramConfig, SimpleNgramDrafter,
    MAX_TRACKED_OCCURRENCES,
};

/// Errors from drafter configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be non-zero")]
    ZeroField { field: &'static str },
    #[error("min_hits {min_hits} exceeds the occurrence counter cap {cap}")]
    MinHitsAboveCap { min_hits: u16, cap: u16 },
}

/// Which drafting strategy to run for a generation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrafterConfig {
    /// Simple n-gram echo drafter.
    Simple(SimpleNgramConfig),
    /// Keyed n-gram map with multi-value statistics.
    Keyed(KeyedNgramConfig),
}

impl Default for DrafterConfig {
    fn default() -> Self {
        Self::Keyed(KeyedNgramConfig::default())
    }
}

impl DrafterConfig {
    /// Check the configuration for degenerate values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Simple(config) => {
                non_zero(config.size_ngram, "size_ngram")?;
                non_zero(config.size_mgram, "size_mgram")?;
                non_zero(config.check_rate, "check_rate")?;
            }
            Self::Keyed(config) => {
                non_zero(config.size_key, "size_key")?;
                non_zero(config.size_value, "size_value")?;
                non_zero(config.check_rate, "check_rate")?;
                if config.min_hits > MAX_TRACKED_OCCURRENCES {
                    return Err(ConfigError::MinHitsAboveCap {
                        min_hits: config.min_hits,
                        cap: MAX_TRACKED_OCCURRENCES,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate and construct the configured drafter.
    pub fn build(&self) -> Result<Box<dyn SelfDrafter>, ConfigError> {
        self.validate()?;
        Ok(match self {
            Self::Simple(config) => Box::new(SimpleNgramDrafter::new(config.clone())),
            Self::Keyed(config) => Box::new(KeyedNgramMap::new(config.clone())),
        })
    }
}

fn non_zero(value: usize, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroField { field })
    } else {
        Ok(())
    }
}
