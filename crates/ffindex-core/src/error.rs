use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FfindexError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("namespace lock held by another process: {0}")]
    LockConflict(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("worker failed: {0}")]
    WorkerFailed(String),

    #[error("bad usage: {0}")]
    BadUsage(String),

    #[error("missing namespace: {0}")]
    MissingNamespace(String),
}

pub type FfindexResult<T> = Result<T, FfindexError>;

/// Maps a failure category to the process exit code `main` returns.
///
/// Kept as a small enum rather than raw integers scattered through `main`
/// so every exit path is named once, here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Success,
    LockConflict,
    BadUsage,
    WorkerFailure,
    IoFailure,
}

impl ExitReason {
    pub fn code(self) -> i32 {
        match self {
            ExitReason::Success => 0,
            ExitReason::LockConflict => 2,
            ExitReason::BadUsage => 3,
            ExitReason::WorkerFailure => 4,
            ExitReason::IoFailure => 5,
        }
    }

    /// Classify an error surfaced at the CLI boundary into an exit reason.
    pub fn classify(err: &anyhow::Error) -> ExitReason {
        if let Some(e) = err.downcast_ref::<FfindexError>() {
            return match e {
                FfindexError::LockConflict(_) => ExitReason::LockConflict,
                FfindexError::BadUsage(_) => ExitReason::BadUsage,
                FfindexError::WorkerFailed(_) => ExitReason::WorkerFailure,
                FfindexError::MissingNamespace(_) => ExitReason::BadUsage,
                FfindexError::Io(_) | FfindexError::Serialization(_) => ExitReason::IoFailure,
            };
        }
        ExitReason::IoFailure
    }
}
