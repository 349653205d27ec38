// ABOUTME: Rollback entry point: re-point live at the previous release.
// ABOUTME: Quiesce, atomic swap, delete the newest release, resume.

use crate::config::Config;
use crate::host::{ExecOps, FsOps};

use super::cutover::point_live_at;
use super::error::DeployError;
use super::paths::DeployPaths;
use super::release::ReleaseHistory;
use super::transitions::run_best_effort;

/// What a rollback did, or why it did nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// Live now points at `to`; `from` was deleted.
    RolledBack { from: String, to: String },
    /// Fewer than two releases exist; nothing was changed.
    NoRollbackTarget,
}

/// Roll back to the previous release.
///
/// Fetches the history fresh, and only acts when at least two releases
/// exist: the currently-live app is quiesced (best effort), the live
/// pointer is atomically moved to the second-newest release, the newest
/// release is deleted, and the app is resumed (best effort).
///
/// # Errors
///
/// Returns `DeployError::Cutover` if the pointer swap fails; listing
/// failures surface as host errors. A failed deletion of the abandoned
/// release is logged, not fatal — the pointer has already moved.
pub async fn rollback_live<H: FsOps + ExecOps>(
    host: &H,
    config: &Config,
    paths: &DeployPaths,
) -> Result<RollbackOutcome, DeployError> {
    let history = ReleaseHistory::fetch(host, paths).await?;

    let (Some(newest), Some(target)) = (history.newest(), history.rollback_target()) else {
        return Ok(RollbackOutcome::NoRollbackTarget);
    };

    if let Some(argv) = &config.commands.maintenance_on {
        run_best_effort(host, argv, Some(&paths.live_link()), "maintenance-on").await;
    }

    point_live_at(host, paths, &target.path).await?;

    if let Err(e) = host.remove_all(&newest.path).await {
        tracing::warn!("failed to delete rolled-back release {}: {}", newest.name, e);
    }

    if let Some(argv) = &config.commands.maintenance_off {
        run_best_effort(host, argv, Some(&paths.live_link()), "maintenance-off").await;
    }

    Ok(RollbackOutcome::RolledBack {
        from: newest.name.clone(),
        to: target.name.clone(),
    })
}
