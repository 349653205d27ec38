// ABOUTME: Error types for deployment operations.
// ABOUTME: One variant per fatal pipeline step, plus lock and host failures.

use chrono::{DateTime, Utc};

use crate::host::HostError;

/// Who holds a contested deploy lock.
#[derive(Debug, Clone)]
pub struct LockHolderInfo {
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

/// Errors that can occur during a deploy or rollback.
///
/// Every variant carries enough of the remote command's captured output to
/// tell the operator what failed without re-running anything.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// No free release path within the bounded retry budget.
    #[error("no free release path after {attempts} attempts")]
    PathCollisionExhausted { attempts: u32 },

    /// Source checkout into the release path failed.
    #[error("source fetch failed: {detail}")]
    SourceFetch { detail: String },

    /// A shared file or directory could not be linked into the release.
    #[error("failed to link shared path {name}: {detail}")]
    LinkShared { name: String, detail: String },

    /// A dependency install command failed.
    #[error("dependency install failed ({command}): {detail}")]
    DependencyInstall { command: String, detail: String },

    /// An asset build command failed.
    #[error("asset build failed ({command}): {detail}")]
    AssetBuild { command: String, detail: String },

    /// Permission or ownership setup on the release failed.
    #[error("permission setup failed: {detail}")]
    Permission { detail: String },

    /// The migration command failed and migrations are configured fatal.
    #[error("migration failed ({command}): {detail}")]
    Migration { command: String, detail: String },

    /// The live-pointer swap failed. The worst possible outcome, always
    /// fatal, always fires the failure hook.
    #[error("cutover failed: {detail}")]
    Cutover { detail: String },

    /// Rollback could not complete.
    #[error("rollback failed: {detail}")]
    Rollback { detail: String },

    /// A lifecycle hook failed at a fatal hook point.
    #[error("{hook} hook failed")]
    Hook { hook: &'static str },

    /// Deploy lock is held by another process.
    #[error("deploy lock held by {} (pid {}) since {}", info.holder, info.pid, info.started_at)]
    LockHeld { info: LockHolderInfo },

    /// Lock bookkeeping failed.
    #[error("deploy lock error: {0}")]
    Lock(String),

    /// A host operation failed outside any specific step contract.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    PathCollisionExhausted,
    SourceFetch,
    LinkShared,
    DependencyInstall,
    AssetBuild,
    Permission,
    Migration,
    Cutover,
    Rollback,
    Hook,
    LockHeld,
    Lock,
    Host,
}

impl DeployError {
    pub fn lock_error(detail: impl Into<String>) -> Self {
        DeployError::Lock(detail.into())
    }

    pub fn lock_held(holder: String, pid: u32, started_at: DateTime<Utc>) -> Self {
        DeployError::LockHeld {
            info: LockHolderInfo {
                holder,
                pid,
                started_at,
            },
        }
    }

    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::PathCollisionExhausted { .. } => DeployErrorKind::PathCollisionExhausted,
            DeployError::SourceFetch { .. } => DeployErrorKind::SourceFetch,
            DeployError::LinkShared { .. } => DeployErrorKind::LinkShared,
            DeployError::DependencyInstall { .. } => DeployErrorKind::DependencyInstall,
            DeployError::AssetBuild { .. } => DeployErrorKind::AssetBuild,
            DeployError::Permission { .. } => DeployErrorKind::Permission,
            DeployError::Migration { .. } => DeployErrorKind::Migration,
            DeployError::Cutover { .. } => DeployErrorKind::Cutover,
            DeployError::Rollback { .. } => DeployErrorKind::Rollback,
            DeployError::Hook { .. } => DeployErrorKind::Hook,
            DeployError::LockHeld { .. } => DeployErrorKind::LockHeld,
            DeployError::Lock(_) => DeployErrorKind::Lock,
            DeployError::Host(_) => DeployErrorKind::Host,
        }
    }

    /// The pipeline step this error belongs to, for operator-facing reports.
    pub fn step(&self) -> &'static str {
        match self {
            DeployError::PathCollisionExhausted { .. } => "create-release",
            DeployError::SourceFetch { .. } => "fetch-source",
            DeployError::LinkShared { .. } => "link-shared",
            DeployError::DependencyInstall { .. } => "install-dependencies",
            DeployError::AssetBuild { .. } => "compile-assets",
            DeployError::Permission { .. } => "set-permissions",
            DeployError::Migration { .. } => "migrate",
            DeployError::Cutover { .. } => "swap-live",
            DeployError::Rollback { .. } => "rollback",
            DeployError::Hook { .. } => "hook",
            DeployError::LockHeld { .. } | DeployError::Lock(_) => "lock",
            DeployError::Host(_) => "host",
        }
    }

    /// Lock holder details if this is a held-lock error.
    pub fn lock_holder_info(&self) -> Option<&LockHolderInfo> {
        match self {
            DeployError::LockHeld { info } => Some(info),
            _ => None,
        }
    }
}
