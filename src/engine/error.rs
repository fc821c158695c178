//! Link engine error types

use std::path::PathBuf;
use thiserror::Error;

use crate::params::ParamKind;

/// Failures surfaced by the link engine
///
/// Missing links and out-of-range values are not errors; only link requests
/// for unsupported types and links-file problems are.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The parameter's type cannot be driven by a hardware control
    #[error("parameter '{name}' has type {kind}; only float, int, bool or trigger can be linked")]
    UnsupportedParameterType { name: String, kind: ParamKind },

    /// The links file does not exist
    #[error("links file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Reading or writing the links file failed
    #[error("links file I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The links file is not a JSON object of strings
    #[error("malformed links file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A saved binding names a parameter the tree does not have
    #[error("binding '{key}' refers to unknown parameter '{name}'")]
    UnresolvedParameterName { key: String, name: String },
}
