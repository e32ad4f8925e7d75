#![forbid(unsafe_code)]

//! Harness errors.

use std::fmt;
use std::path::PathBuf;

use frep_core::{MarkupError, ModelError};

/// Anything that stops a harness run.
#[derive(Debug)]
pub enum HarnessError {
    /// Reading an input file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An input file is not valid JSON for its role.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The markup was rejected.
    Markup(MarkupError),
    /// The model file could not be loaded or saved.
    Model(ModelError),
    /// A scripted operation could not be parsed.
    BadOp(String),
    /// A path named no live instance.
    UnknownPath(String),
    /// An instance has no field with that static name.
    UnknownField { path: String, field: String },
    /// Invalid command-line usage.
    Usage(String),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            HarnessError::Json { path, source } => {
                write!(f, "invalid JSON in {}: {source}", path.display())
            }
            HarnessError::Markup(e) => write!(f, "invalid markup: {e}"),
            HarnessError::Model(e) => write!(f, "model error: {e}"),
            HarnessError::BadOp(op) => write!(f, "cannot parse operation: {op}"),
            HarnessError::UnknownPath(path) => write!(f, "no instance at {path}"),
            HarnessError::UnknownField { path, field } => {
                write!(f, "instance {path} has no field {field}")
            }
            HarnessError::Usage(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Io { source, .. } => Some(source),
            HarnessError::Json { source, .. } => Some(source),
            HarnessError::Markup(e) => Some(e),
            HarnessError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MarkupError> for HarnessError {
    fn from(e: MarkupError) -> Self {
        HarnessError::Markup(e)
    }
}

impl From<ModelError> for HarnessError {
    fn from(e: ModelError) -> Self {
        HarnessError::Model(e)
    }
}
