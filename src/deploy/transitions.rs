// ABOUTME: State transition methods for the deploy pipeline.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::marker::PhantomData;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::confirm::Confirm;
use crate::host::{ExecOps, ExecOutput, FsOps, HostError, RemoteCommand};
use crate::notify::Notifier;

use super::Deployment;
use super::cutover::point_live_at;
use super::error::DeployError;
use super::release::{ReleaseHistory, allocate_release};
use super::state::{
    AssetsCompiled, CachesCleared, Confirmed, DepsInstalled, Done, Idle, Linked, LiveSwapped,
    Migrated, PermissionsSet, Pruned, Quiesced, ReleaseCreated, Resumed, SourceFetched,
};

/// Outcome of the confirmation gate.
pub enum ConfirmOutcome {
    /// Proceed with the pipeline.
    Proceed(Deployment<Confirmed>),
    /// Operator declined; nothing was changed on the target.
    Declined,
}

// =============================================================================
// Internal helpers
// =============================================================================

impl<S> Deployment<S> {
    fn transition<T>(self) -> Deployment<T> {
        Deployment {
            config: self.config,
            target: self.target,
            paths: self.paths,
            release: self.release,
            pruned: self.pruned,
            _state: PhantomData,
        }
    }

    fn release_path(&self) -> &str {
        &self
            .release
            .as_ref()
            .expect("release must exist past create_release")
            .path
    }
}

/// Run a configured argv on the host, optionally in a working directory.
/// A non-zero exit is returned as `Ok` so callers can map it to their own
/// step error; `Err` means the command could not run at all.
async fn run_argv<H: ExecOps>(
    host: &H,
    argv: &[String],
    cwd: Option<&str>,
) -> Result<ExecOutput, DeployError> {
    let mut cmd =
        RemoteCommand::from_argv(argv).expect("command argv validated non-empty at config load");
    if let Some(dir) = cwd {
        cmd = cmd.cwd(dir);
    }
    host.run(&cmd).await.map_err(|e| HostError::from(e).into())
}

/// Run a best-effort command: output is logged, never gates the pipeline.
pub(crate) async fn run_best_effort<H: ExecOps>(
    host: &H,
    argv: &[String],
    cwd: Option<&str>,
    what: &str,
) {
    match run_argv(host, argv, cwd).await {
        Ok(output) if output.success() => {
            let text = output.stdout.trim();
            if !text.is_empty() {
                tracing::info!("{}: {}", what, text);
            }
        }
        Ok(output) => {
            tracing::warn!("{} reported failure: {}", what, output.detail());
        }
        Err(e) => {
            tracing::warn!("{} could not run: {}", what, e);
        }
    }
}

// =============================================================================
// Idle -> Confirmed
// =============================================================================

impl Deployment<Idle> {
    /// Gate the pipeline on operator confirmation for flagged targets.
    ///
    /// Targets without the `confirm` flag proceed immediately. Declining
    /// makes no remote changes and is not an error.
    #[must_use = "deployment state must be used"]
    pub fn confirm(self, confirmer: &dyn Confirm) -> ConfirmOutcome {
        if !self.target.confirm {
            return ConfirmOutcome::Proceed(self.transition());
        }

        let prompt = format!(
            "Are you sure you want to deploy {} to {}?",
            self.config.app, self.target.host
        );
        if confirmer.confirm(&prompt) {
            ConfirmOutcome::Proceed(self.transition())
        } else {
            ConfirmOutcome::Declined
        }
    }
}

// =============================================================================
// Confirmed -> ReleaseCreated
// =============================================================================

impl Deployment<Confirmed> {
    /// Allocate a fresh release directory named after `now`.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::PathCollisionExhausted` when no free path is
    /// found within the bounded retry budget.
    #[must_use = "deployment state must be used"]
    pub async fn create_release<H: FsOps>(
        mut self,
        host: &H,
        now: DateTime<Utc>,
    ) -> Result<Deployment<ReleaseCreated>, DeployError> {
        host.make_dir_all(&self.paths.releases_dir())
            .await
            .map_err(HostError::from)?;

        let release = allocate_release(host, &self.paths, now).await?;
        tracing::info!("release path: {}", release.path);

        self.release = Some(release);
        Ok(self.transition())
    }
}

// =============================================================================
// ReleaseCreated -> SourceFetched
// =============================================================================

impl Deployment<ReleaseCreated> {
    /// Materialize a shallow, single-branch checkout into the release path.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::SourceFetch` on a non-zero git exit status.
    #[must_use = "deployment state must be used"]
    pub async fn fetch_source<H: ExecOps>(
        self,
        host: &H,
    ) -> Result<Deployment<SourceFetched>, DeployError> {
        let branch = self.config.branch_for(&self.target).to_string();
        let cmd = RemoteCommand::new("git")
            .arg("clone")
            .arg("-b")
            .arg(branch)
            .args(["-q", "--depth", "1", "--single-branch"])
            .arg(&self.config.repository)
            .arg(self.release_path());

        let output = host.run(&cmd).await.map_err(HostError::from)?;
        if !output.success() {
            return Err(DeployError::SourceFetch {
                detail: output.detail().to_string(),
            });
        }

        Ok(self.transition())
    }
}

// =============================================================================
// SourceFetched -> Linked
// =============================================================================

impl Deployment<SourceFetched> {
    /// Link shared files and directories from `static/` into the release.
    ///
    /// Re-linking an existing link replaces it, so the step is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::LinkShared` naming the entry that failed.
    #[must_use = "deployment state must be used"]
    pub async fn link_shared<H: FsOps>(self, host: &H) -> Result<Deployment<Linked>, DeployError> {
        for name in self.config.shared.entries() {
            let target = self.paths.static_entry(name);
            let link = format!("{}/{}", self.release_path(), name);

            host.symlink(&target, &link)
                .await
                .map_err(|e| DeployError::LinkShared {
                    name: name.to_string(),
                    detail: e.to_string(),
                })?;
        }

        Ok(self.transition())
    }
}

// =============================================================================
// Linked -> DepsInstalled
// =============================================================================

impl Deployment<Linked> {
    /// Run the configured dependency install commands in the release path.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::DependencyInstall` for the first failing command.
    #[must_use = "deployment state must be used"]
    pub async fn install_dependencies<H: ExecOps>(
        self,
        host: &H,
    ) -> Result<Deployment<DepsInstalled>, DeployError> {
        for argv in &self.config.commands.install {
            let output = run_argv(host, argv, Some(self.release_path())).await?;
            if !output.success() {
                return Err(DeployError::DependencyInstall {
                    command: argv.join(" "),
                    detail: output.detail().to_string(),
                });
            }
        }

        Ok(self.transition())
    }
}

// =============================================================================
// DepsInstalled -> AssetsCompiled
// =============================================================================

impl Deployment<DepsInstalled> {
    /// Run the configured asset build commands in the release path.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::AssetBuild` for the first failing command.
    #[must_use = "deployment state must be used"]
    pub async fn compile_assets<H: ExecOps>(
        self,
        host: &H,
    ) -> Result<Deployment<AssetsCompiled>, DeployError> {
        for argv in &self.config.commands.build {
            let output = run_argv(host, argv, Some(self.release_path())).await?;
            if !output.success() {
                return Err(DeployError::AssetBuild {
                    command: argv.join(" "),
                    detail: output.detail().to_string(),
                });
            }
        }

        Ok(self.transition())
    }
}

// =============================================================================
// AssetsCompiled -> PermissionsSet
// =============================================================================

impl Deployment<AssetsCompiled> {
    /// Make writable dirs world-writable and chown the release to the
    /// deploy user.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Permission` on any failing command.
    #[must_use = "deployment state must be used"]
    pub async fn set_permissions<H: ExecOps>(
        self,
        host: &H,
    ) -> Result<Deployment<PermissionsSet>, DeployError> {
        for dir in &self.config.writable {
            let path = format!("{}/{}", self.release_path(), dir);
            let cmd = RemoteCommand::new("chmod").args(["-R", "a+w"]).arg(path);
            let output = host.run(&cmd).await.map_err(HostError::from)?;
            if !output.success() {
                return Err(DeployError::Permission {
                    detail: output.detail().to_string(),
                });
            }
        }

        let owner = self.target.ssh_user();
        let cmd = RemoteCommand::new("chown")
            .args(["-R", "-h"])
            .arg(format!("{}:{}", owner, owner))
            .arg(self.release_path());
        let output = host.run(&cmd).await.map_err(HostError::from)?;
        if !output.success() {
            return Err(DeployError::Permission {
                detail: output.detail().to_string(),
            });
        }

        Ok(self.transition())
    }
}

// =============================================================================
// PermissionsSet -> Quiesced
// =============================================================================

impl Deployment<PermissionsSet> {
    /// Put the *outgoing* application into maintenance mode. Best effort:
    /// a failed toggle is logged but never aborts the deploy.
    #[must_use = "deployment state must be used"]
    pub async fn quiesce<H: FsOps + ExecOps>(self, host: &H) -> Deployment<Quiesced> {
        let Some(argv) = self.config.commands.maintenance_on.clone() else {
            return self.transition();
        };

        match host.read_link(&self.paths.live_link()).await {
            Ok(Some(outgoing)) => {
                run_best_effort(host, &argv, Some(&outgoing), "maintenance-on").await;
            }
            Ok(None) => {
                tracing::debug!("no live release; skipping maintenance mode");
            }
            Err(e) => {
                tracing::warn!("could not resolve live release for quiesce: {}", e);
            }
        }

        self.transition()
    }
}

// =============================================================================
// Quiesced -> Migrated
// =============================================================================

impl Deployment<Quiesced> {
    /// Run the schema migration command in the release path.
    ///
    /// Whether a failed migration aborts the deploy is configurable
    /// (`migrate_fatal`, default true). A non-fatal failure is logged and
    /// the pipeline continues to cutover.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Migration` when the command fails and
    /// migrations are configured fatal.
    #[must_use = "deployment state must be used"]
    pub async fn migrate<H: ExecOps>(self, host: &H) -> Result<Deployment<Migrated>, DeployError> {
        let Some(argv) = self.config.commands.migrate.clone() else {
            return Ok(self.transition());
        };

        let output = run_argv(host, &argv, Some(self.release_path())).await?;
        if output.success() {
            let text = output.stdout.trim();
            if !text.is_empty() {
                tracing::info!("migrate: {}", text);
            }
        } else if self.config.migrate_fatal {
            return Err(DeployError::Migration {
                command: argv.join(" "),
                detail: output.detail().to_string(),
            });
        } else {
            tracing::warn!(
                "migration failed but migrate_fatal is off: {}",
                output.detail()
            );
        }

        Ok(self.transition())
    }
}

// =============================================================================
// Migrated -> LiveSwapped
// =============================================================================

impl Deployment<Migrated> {
    /// Atomically re-point the live symlink at the new release.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Cutover`. On failure the old pointer is still
    /// intact; at worst a stale staging link remains.
    #[must_use = "deployment state must be used"]
    pub async fn swap_live<H: FsOps>(
        self,
        host: &H,
    ) -> Result<Deployment<LiveSwapped>, DeployError> {
        let release_path = self.release_path().to_string();
        point_live_at(host, &self.paths, &release_path).await?;
        Ok(self.transition())
    }
}

// =============================================================================
// LiveSwapped -> Resumed
// =============================================================================

impl Deployment<LiveSwapped> {
    /// Lift maintenance mode on the new live release. Best effort.
    #[must_use = "deployment state must be used"]
    pub async fn resume<H: ExecOps>(self, host: &H) -> Deployment<Resumed> {
        if let Some(argv) = self.config.commands.maintenance_off.clone() {
            let live = self.paths.live_link();
            run_best_effort(host, &argv, Some(&live), "maintenance-off").await;
        }
        self.transition()
    }
}

// =============================================================================
// Resumed -> CachesCleared
// =============================================================================

impl Deployment<Resumed> {
    /// Invalidate external process-level caches. Best effort.
    #[must_use = "deployment state must be used"]
    pub async fn reset_cache<H: ExecOps>(self, host: &H) -> Deployment<CachesCleared> {
        if let Some(argv) = self.config.commands.reset_cache.clone() {
            run_best_effort(host, &argv, None, "reset-cache").await;
        }
        self.transition()
    }
}

// =============================================================================
// CachesCleared -> Pruned
// =============================================================================

impl Deployment<CachesCleared> {
    /// Delete releases beyond the retention window.
    ///
    /// The history is re-fetched here so the just-created release counts
    /// toward the window. The live release is never deleted, and one failed
    /// deletion does not stop the rest.
    ///
    /// # Errors
    ///
    /// Only listing failures are fatal; per-release deletion failures are
    /// logged and skipped.
    #[must_use = "deployment state must be used"]
    pub async fn prune<H: FsOps>(mut self, host: &H) -> Result<Deployment<Pruned>, DeployError> {
        let history = ReleaseHistory::fetch(host, &self.paths).await?;

        let live = match host.read_link(&self.paths.live_link()).await {
            Ok(live) => live,
            Err(e) => {
                // Without knowing the live release, deleting anything is a
                // gamble. Keep everything and let the next deploy prune.
                tracing::warn!("could not resolve live release; skipping prune: {}", e);
                return Ok(self.transition());
            }
        };

        let mut deleted = Vec::new();
        for entry in history.beyond(self.config.keep_releases) {
            if live.as_deref() == Some(entry.path.as_str()) {
                tracing::warn!(
                    "release {} is outside the retention window but live; keeping it",
                    entry.name
                );
                continue;
            }

            match host.remove_all(&entry.path).await {
                Ok(()) => {
                    tracing::info!("pruned release {}", entry.name);
                    deleted.push(entry.name.clone());
                }
                Err(e) => {
                    tracing::warn!("failed to prune release {}: {}", entry.name, e);
                }
            }
        }

        self.pruned = deleted;
        Ok(self.transition())
    }
}

// =============================================================================
// Pruned -> Done
// =============================================================================

impl Deployment<Pruned> {
    /// Send the completion notification. Fire and forget.
    #[must_use = "deployment state must be used"]
    pub async fn notify(self, notifier: &Notifier, elapsed: Duration) -> Deployment<Done> {
        notifier.deploy_finished(elapsed).await;
        self.transition()
    }
}
