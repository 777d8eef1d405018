//! Error types for resumable.
//!
//! Taxonomy:
//! - Expected failures: nothing to resume from, no save location
//! - Infrastructure failures: filesystem, malformed files
//! - Internal invariant violations (bugs)

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for resumable.
#[derive(Debug, Error)]
pub enum ResumableError {
    // ═══════════════════════════════════════════════════════════════════
    // EXPECTED — the caller asked for something that is not there
    // ═══════════════════════════════════════════════════════════════════
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Nothing to resume from: {} & {}", display_opt(.input), .save.display())]
    NotFound {
        input: Option<PathBuf>,
        save: PathBuf,
    },

    #[error("Failed to infer save location: no save-as path, previous save, or input path")]
    SaveLocationUnknown,

    // ═══════════════════════════════════════════════════════════════════
    // INFRASTRUCTURE — filesystem and file contents
    // ═══════════════════════════════════════════════════════════════════
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Array file error: {0}")]
    Array(String),

    // ═══════════════════════════════════════════════════════════════════
    // INTERNAL — invariant broken (bug, should not happen)
    // ═══════════════════════════════════════════════════════════════════
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_opt(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<no input>".to_string(),
    }
}

impl ResumableError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error means "there was nothing on disk to work with".
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias for resumable.
pub type Result<T> = std::result::Result<T, ResumableError>;
