// ABOUTME: Deploy lock to prevent concurrent deployments to the same target.
// ABOUTME: Atomic noclobber file creation under {deploy_path}/.strofi/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::host::{ExecOps, FsOps, RemoteCommand, quote};
use crate::types::AppName;

use super::error::DeployError;
use super::paths::DeployPaths;

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// App being deployed.
    pub app: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(app: &AppName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            app: app.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }
}

/// A held deploy lock on a target.
pub struct DeployLock<'a, H: FsOps + ExecOps> {
    host: &'a H,
    lock_path: String,
}

impl<H: FsOps + ExecOps> std::fmt::Debug for DeployLock<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployLock")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl<'a, H: FsOps + ExecOps> DeployLock<'a, H> {
    /// Acquire the deploy lock for a target.
    ///
    /// Uses shell noclobber mode for atomic acquisition (no TOCTOU race).
    /// Returns `DeployError::LockHeld` if another process holds the lock.
    /// Auto-breaks stale locks (>1 hour) with a warning.
    pub async fn acquire(
        host: &'a H,
        paths: &DeployPaths,
        app: &AppName,
        force: bool,
    ) -> Result<Self, DeployError> {
        let lock_path = paths.lock_file();

        host.make_dir_all(&paths.state_dir())
            .await
            .map_err(|e| DeployError::lock_error(format!("failed to create state dir: {}", e)))?;

        let lock_info = LockInfo::new(app);
        let lock_json = serde_json::to_string(&lock_info)
            .map_err(|e| DeployError::lock_error(format!("failed to serialize lock: {}", e)))?;

        // set -C makes > fail if the file already exists
        // (atomic create-if-not-exists).
        let acquire_script = format!(
            "(set -C; printf %s {} > {}) 2>/dev/null",
            quote(&lock_json),
            quote(&lock_path)
        );
        let acquire_cmd = RemoteCommand::new("sh").arg("-c").arg(&acquire_script);

        let result = host
            .run(&acquire_cmd)
            .await
            .map_err(|e| DeployError::lock_error(format!("failed to acquire lock: {}", e)))?;

        if result.success() {
            return Ok(Self { host, lock_path });
        }

        // Acquisition failed; decide whether the existing lock can be broken.
        let should_break = Self::check_existing_lock(host, &lock_path, force).await?;

        if !should_break {
            let read_cmd = RemoteCommand::new("cat").arg(&lock_path);
            if let Ok(output) = host.run(&read_cmd).await
                && let Ok(existing) = serde_json::from_str::<LockInfo>(&output.stdout)
            {
                return Err(DeployError::lock_held(
                    existing.holder,
                    existing.pid,
                    existing.started_at,
                ));
            }
            return Err(DeployError::lock_error(
                "lock held by another process".to_string(),
            ));
        }

        tracing::debug!("Removing stale/forced lock at {}", lock_path);
        let _ = host.remove_all(&lock_path).await;

        // Retry acquisition once.
        let result = host
            .run(&acquire_cmd)
            .await
            .map_err(|e| DeployError::lock_error(format!("failed to acquire lock: {}", e)))?;

        if !result.success() {
            return Err(DeployError::lock_error(
                "lock acquired by another process during break".to_string(),
            ));
        }

        Ok(Self { host, lock_path })
    }

    /// Check if an existing lock should be broken (stale, forced, or corrupted).
    async fn check_existing_lock(
        host: &H,
        lock_path: &str,
        force: bool,
    ) -> Result<bool, DeployError> {
        let read_cmd = RemoteCommand::new("cat").arg(lock_path);
        let output = host
            .run(&read_cmd)
            .await
            .map_err(|e| DeployError::lock_error(format!("failed to read lock info: {}", e)))?;

        if !output.success() {
            tracing::warn!("Lock info unreadable, breaking lock");
            return Ok(true);
        }

        match serde_json::from_str::<LockInfo>(&output.stdout) {
            Ok(existing_lock) => {
                if force {
                    tracing::warn!(
                        "Breaking lock held by {} (pid {}) since {}",
                        existing_lock.holder,
                        existing_lock.pid,
                        existing_lock.started_at
                    );
                    Ok(true)
                } else if existing_lock.is_stale() {
                    tracing::warn!(
                        "Auto-breaking stale lock held by {} (pid {}) since {}",
                        existing_lock.holder,
                        existing_lock.pid,
                        existing_lock.started_at
                    );
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(_) => {
                tracing::warn!("Lock info corrupted, breaking lock");
                Ok(true)
            }
        }
    }

    /// Release the lock.
    pub async fn release(self) -> Result<(), DeployError> {
        self.host
            .remove_all(&self.lock_path)
            .await
            .map_err(|e| DeployError::lock_error(format!("failed to remove lock: {}", e)))?;
        Ok(())
    }

    /// Run `fut` while holding the lock, releasing it afterwards whether the
    /// work succeeded or failed. This is what guarantees a failed deploy
    /// never leaves the target locked.
    pub async fn with_lock<T, E, F>(
        host: &'a H,
        paths: &DeployPaths,
        app: &AppName,
        force: bool,
        fut: F,
    ) -> Result<T, E>
    where
        E: From<DeployError>,
        F: Future<Output = Result<T, E>>,
    {
        let lock = Self::acquire(host, paths, app, force).await.map_err(E::from)?;
        let result = fut.await;
        if let Err(e) = lock.release().await {
            tracing::warn!("failed to release deploy lock: {}", e);
        }
        result
    }
}
