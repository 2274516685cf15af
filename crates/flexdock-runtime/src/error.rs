//! Error types for storage, configuration, persistence and the shell.

use std::io;
use std::path::PathBuf;

use flexdock_layout::{DispatchStatus, ModelError};
use thiserror::Error;

use crate::zones::Zone;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage file {} is not a JSON object of strings: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode storage document: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config rejected: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to encode layout record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to capture zone model: {0}")]
    Model(#[from] ModelError),
}

/// Failures of [`DockShell::move_tab_to_zone`](crate::DockShell::move_tab_to_zone).
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("tab {tab} is already in the {zone} zone")]
    SameZone { tab: String, zone: Zone },
    #[error("tab {tab} not found in the {zone} zone")]
    TabNotFound { tab: String, zone: Zone },
    #[error("tab {tab} cannot be dragged")]
    Locked { tab: String },
    #[error("the {zone} zone refused the move: {status}")]
    Refused { zone: Zone, status: DispatchStatus },
    #[error("a drag is in progress")]
    DragActive,
}
