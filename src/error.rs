// ⚠️ Error types for the matching core
// Construction is the only place the core can fail; matching itself is total.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read matching config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse matching config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A collaborator (normalizer, metric or threshold) was never supplied
    #[error("Matcher is missing its {0}")]
    MissingCollaborator(&'static str),

    #[error("Invalid threshold {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
}
