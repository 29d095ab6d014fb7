//! Error types for shiori core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ShioriError
pub type Result<T> = std::result::Result<T, ShioriError>;

/// Top-level error type for all shiori operations
#[derive(Debug, Error)]
pub enum ShioriError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures of a single chapter source during an index build
///
/// Both variants are contained by the index builder: a failing source is
/// logged and contributes nothing, it never aborts the build.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source unreachable: {0}")]
    Unavailable(String),

    #[error("Malformed listing: {0}")]
    Malformed(String),
}

/// Errors loading or saving the file-resident library
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Library file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse library file: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a persistent-store client
///
/// `Conflict` is a unique-constraint collision (e.g. duplicate title) and
/// is recoverable by the caller, typically by retrying as an update.
/// `Failure` is not.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Entry already exists: {0}")]
    Conflict(String),

    #[error("Store failure: {0}")]
    Failure(String),
}

/// Invalid input to a reconciliation call
///
/// Reconciliation fails loudly on these instead of returning an empty
/// result, since an empty result is indistinguishable from "nothing to do".
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Reader has no usable identity")]
    MissingUser,

    #[error("Neither side of the reconciliation has any data")]
    NoData,
}
