// ABOUTME: Capability traits for deployment hosts.
// ABOUTME: FsOps covers remote filesystem state, ExecOps arbitrary commands.

use async_trait::async_trait;

use super::command::{ExecOutput, RemoteCommand};

/// Filesystem operations on the deployment target.
///
/// The orchestrator only ever touches the target through these methods, so a
/// test host can model the release layout in memory. `rename` is the one
/// primitive with an atomicity contract: within a single directory it either
/// fully replaces the destination or leaves it untouched.
#[async_trait]
pub trait FsOps: Send + Sync {
    async fn path_exists(&self, path: &str) -> Result<bool, FsError>;

    /// Create a directory. Fails if it already exists.
    async fn make_dir(&self, path: &str) -> Result<(), FsError>;

    /// Create a directory and any missing parents.
    async fn make_dir_all(&self, path: &str) -> Result<(), FsError>;

    /// Create or replace a symlink at `link` pointing to `target`.
    /// Never dereferences an existing link (ln -nfs semantics).
    async fn symlink(&self, target: &str, link: &str) -> Result<(), FsError>;

    /// Rename `from` onto `to`, replacing `to` if present.
    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError>;

    /// Read a symlink's target, or None if the path is absent.
    async fn read_link(&self, path: &str) -> Result<Option<String>, FsError>;

    /// Recursively delete a path. Deleting an absent path is not an error.
    async fn remove_all(&self, path: &str) -> Result<(), FsError>;

    /// Entry names in `dir`, newest modification first.
    /// An absent directory lists as empty.
    async fn list_dir_by_mtime(&self, dir: &str) -> Result<Vec<String>, FsError>;
}

/// Command execution on the deployment target.
#[async_trait]
pub trait ExecOps: Send + Sync {
    /// Run a command and capture its result. A non-zero exit status is a
    /// normal `Ok` outcome; `Err` means the command could not be run at all.
    async fn run(&self, cmd: &RemoteCommand) -> Result<ExecOutput, ExecError>;
}

/// Errors from filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("path already exists: {0}")]
    AlreadyExists(String),

    #[error("path not found: {0}")]
    NotFound(String),

    #[error("filesystem operation failed on {path}: {detail}")]
    Failed { path: String, detail: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors from command execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("failed to run command: {0}")]
    Failed(String),

    #[error("transport error: {0}")]
    Transport(String),
}
