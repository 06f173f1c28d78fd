use std::path::{Path, PathBuf};

use cover_sync_db::{OperationError, SchemaError};
use thiserror::Error;

/// Errors raised while loading or resolving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file isn't valid TOML or has unexpected fields
    #[error("Invalid settings file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A single setting has a value that can't be used
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl SettingsError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors that can stop a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing the root or a record folder failed
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Db(#[from] OperationError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A failure tied to one record folder
    #[error("id {name}: {source}")]
    Record {
        name: String,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn record(name: impl Into<String>, source: SyncError) -> Self {
        Self::Record {
            name: name.into(),
            source: Box::new(source),
        }
    }
}
