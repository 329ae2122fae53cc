//! Stable error taxonomy for the intent boundary (spec §7).
//!
//! Every fault that can occur while executing an [`crate::intent::Intent`]
//! is represented here. The executor never lets a Rust panic or a raw
//! `Result::Err` cross the intent boundary: every [`EngineError`] is turned
//! into a flat failure record carrying `error`, `code`, and (when the
//! Error-Recovery Engine can produce any) `suggestions`.

use std::path::PathBuf;
use thiserror::Error;

/// Stable machine-readable error code, per spec §7's taxonomy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PathOutsideRoot,
    BlockedPath,
    DisallowedExtension,
    FileTooLarge,
    InvalidPath,
    FileNotFound,
    ParentNotFound,
    AlreadyExists,
    PermissionDenied,
    RateLimited,
    Cancelled,
    Internal,
}

impl ErrorCode {
    /// Whether the Error-Recovery Engine should be consulted for this code.
    #[must_use]
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorCode::FileNotFound | ErrorCode::ParentNotFound)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("path escapes root: {0}")]
    PathOutsideRoot(PathBuf),

    #[error("path matches a blocked segment: {0}")]
    BlockedPath(PathBuf),

    #[error("extension not allowed: {0}")]
    DisallowedExtension(String),

    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("parent directory not found: {0}")]
    ParentNotFound(PathBuf),

    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("rate limited: {max_requests} requests per {window_ms}ms exceeded for {key}")]
    RateLimited {
        key: String,
        max_requests: u32,
        window_ms: u64,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::PathOutsideRoot(_) => ErrorCode::PathOutsideRoot,
            EngineError::BlockedPath(_) => ErrorCode::BlockedPath,
            EngineError::DisallowedExtension(_) => ErrorCode::DisallowedExtension,
            EngineError::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            EngineError::InvalidPath(_) => ErrorCode::InvalidPath,
            EngineError::FileNotFound(_) => ErrorCode::FileNotFound,
            EngineError::ParentNotFound(_) => ErrorCode::ParentNotFound,
            EngineError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            EngineError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            EngineError::RateLimited { .. } => ErrorCode::RateLimited,
            EngineError::Cancelled => ErrorCode::Cancelled,
            EngineError::Internal(_) | EngineError::Io(_) => ErrorCode::Internal,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
