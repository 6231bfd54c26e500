//! Error types for handlers and the aggregator.

use std::path::PathBuf;
use thiserror::Error;

/// Failure produced by a handler while turning a file into a value.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid INI: {0}")]
    Ini(#[from] ini::ParseError),

    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Failure reported by a caller-supplied handler.
    #[error("{0}")]
    Custom(String),
}

impl ParseError {
    pub fn custom(message: impl Into<String>) -> Self {
        ParseError::Custom(message.into())
    }

    /// Read a whole file as UTF-8, tagging failures with the path.
    pub(crate) fn read_to_string(path: &std::path::Path) -> std::result::Result<String, ParseError> {
        std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    /// A handler failed on one source file.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A directory target could not be listed.
    #[error("failed to scan directory {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store could not be converted to or from its JSON form.
    #[error("store serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A settings file could not be read or decoded.
    #[error("failed to load settings from {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },
}

impl Error {
    /// Path of the file or directory the error refers to.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Parse { path, .. } | Error::Scan { path, .. } | Error::Settings { path, .. } => {
                Some(path)
            }
            Error::Json(_) => None,
        }
    }
}

/// Result type for aggregator operations.
pub type Result<T> = std::result::Result<T, Error>;
