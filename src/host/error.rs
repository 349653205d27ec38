// ABOUTME: Unified host error with SNAFU pattern.
// ABOUTME: Wraps filesystem and exec failures for programmatic handling.

use snafu::Snafu;

use super::traits::{ExecError, FsError};

/// Unified error for host operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HostError {
    #[snafu(display("filesystem operation failed: {source}"))]
    Fs { source: FsError },

    #[snafu(display("command execution failed: {source}"))]
    Exec { source: ExecError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostErrorKind {
    /// A path existed where a fresh one was required.
    PathExists,
    /// A required path was missing.
    PathMissing,
    /// A remote command exceeded its timeout.
    Timeout,
    /// The transport (SSH channel) failed.
    Transport,
    /// Any other operation failure.
    Operation,
}

impl HostError {
    pub fn kind(&self) -> HostErrorKind {
        match self {
            HostError::Fs { source } => match source {
                FsError::AlreadyExists(_) => HostErrorKind::PathExists,
                FsError::NotFound(_) => HostErrorKind::PathMissing,
                FsError::Transport(_) => HostErrorKind::Transport,
                FsError::Failed { .. } => HostErrorKind::Operation,
            },
            HostError::Exec { source } => match source {
                ExecError::Timeout(_) => HostErrorKind::Timeout,
                ExecError::Transport(_) => HostErrorKind::Transport,
                ExecError::Failed(_) => HostErrorKind::Operation,
            },
        }
    }
}

impl From<FsError> for HostError {
    fn from(source: FsError) -> Self {
        HostError::Fs { source }
    }
}

impl From<ExecError> for HostError {
    fn from(source: ExecError) -> Self {
        HostError::Exec { source }
    }
}
