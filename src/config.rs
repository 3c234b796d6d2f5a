// ⚙️ Matching Configuration - Thresholds as Data
// Loaded from a JSON file; every field has a default.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Stop words stripped from names before the coefficient and substring stages.
///
/// Generic wind-farm vocabulary ("Wind Farm", "Extension", "Phase 2"...) says
/// nothing about identity, so it is removed before comparing.
pub const DEFAULT_RESERVED_WORDS: &[&str] = &[
    "communities",
    "community",
    "energy",
    "estate",
    "estates",
    "extension",
    "extensions",
    "farm",
    "farms",
    "park",
    "parks",
    "phase",
    "phases",
    "project",
    "projects",
    "renewable",
    "renewables",
    "resubmission",
    "turbine",
    "turbines",
    "wind",
];

// ============================================================================
// MATCHING CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Coefficient stage accepts when score > this (default: 0.9)
    pub coefficient_limit: f64,

    /// Substring stage accepts when score > this (default: 0.9)
    pub percentage_limit: f64,

    /// Edit-distance stage accepts when distance <= this (default: 2)
    pub edit_distance_limit: usize,

    /// Words dropped by the normalizer (matched case-insensitively)
    pub reserved_words: Vec<String>,
}

impl MatchingConfig {
    /// Load config from a JSON file; missing fields fall back to defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: MatchingConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Score limits must be finite and within [0.0, 1.0]
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_score_limit("coefficient_limit", self.coefficient_limit)?;
        check_score_limit("percentage_limit", self.percentage_limit)?;
        Ok(())
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        MatchingConfig {
            coefficient_limit: 0.9,
            percentage_limit: 0.9,
            edit_distance_limit: 2,
            reserved_words: DEFAULT_RESERVED_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

pub(crate) fn check_score_limit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidThreshold { name, value });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
