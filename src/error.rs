// src/error.rs

use std::fmt;

/// Load failures a caller has to tell apart. Everything else in the
/// pipeline degrades to absent values instead of failing.
#[derive(Debug)]
pub enum IngestError {
    /// Neither a local path nor a remote URL was supplied.
    Configuration(String),
    /// The remote fetch failed (connection error or non-success status).
    Transport { url: String, reason: String },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            IngestError::Transport { url, reason } => {
                write!(f, "transport error fetching {}: {}", url, reason)
            }
        }
    }
}

impl std::error::Error for IngestError {}

impl IngestError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, IngestError::Configuration(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, IngestError::Transport { .. })
    }
}
