// ABOUTME: Release registry: allocation with bounded collision retry and history listing.
// ABOUTME: History is always re-fetched from the target, never cached across steps.

use chrono::{DateTime, Utc};

use crate::host::{FsError, FsOps, HostError};
use crate::types::ReleaseId;

use super::error::DeployError;
use super::paths::DeployPaths;

/// Cap on release-path allocation attempts. Collisions only happen when
/// many deploys land in the same minute, so exhausting this means
/// something is wrong with the target, not with the clock.
pub const MAX_CREATE_ATTEMPTS: u32 = 64;

/// One deployed code snapshot on the target. Immutable once created;
/// removed only by pruning or rollback.
#[derive(Debug, Clone)]
pub struct Release {
    pub id: ReleaseId,
    pub path: String,
}

/// Allocate a fresh release directory.
///
/// Candidate ids combine the deploy start time with a counter; each
/// candidate is checked for existence and created with a bare `mkdir` so a
/// concurrent allocation of the same path surfaces as a collision rather
/// than silently sharing the directory.
pub(crate) async fn allocate_release<H: FsOps>(
    host: &H,
    paths: &DeployPaths,
    now: DateTime<Utc>,
) -> Result<Release, DeployError> {
    let mut id = ReleaseId::from_timestamp(now, 0);

    for _ in 0..MAX_CREATE_ATTEMPTS {
        let path = paths.release_dir(&id);

        if !host.path_exists(&path).await.map_err(HostError::from)? {
            match host.make_dir(&path).await {
                Ok(()) => return Ok(Release { id, path }),
                // Lost the race to another allocator; try the next counter.
                Err(FsError::AlreadyExists(_)) => {}
                Err(e) => return Err(HostError::from(e).into()),
            }
        }

        id = id.next_candidate();
    }

    Err(DeployError::PathCollisionExhausted {
        attempts: MAX_CREATE_ATTEMPTS,
    })
}

/// One entry in the release history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub name: String,
    pub path: String,
}

/// Releases on the target, newest first by modification time.
///
/// Index 0 is the most recently *created* release, which is not necessarily
/// the live one: after a rollback, index 1 may be live while index 0 still
/// exists until pruned.
#[derive(Debug, Clone)]
pub struct ReleaseHistory {
    entries: Vec<HistoryEntry>,
}

impl ReleaseHistory {
    /// List the target's releases fresh. Directory entries that don't parse
    /// as release ids are ignored.
    pub async fn fetch<H: FsOps>(host: &H, paths: &DeployPaths) -> Result<Self, DeployError> {
        let names = host
            .list_dir_by_mtime(&paths.releases_dir())
            .await
            .map_err(HostError::from)?;

        let entries = names
            .into_iter()
            .filter(|name| {
                let valid = ReleaseId::parse(name).is_ok();
                if !valid {
                    tracing::debug!("ignoring non-release entry in releases dir: {}", name);
                }
                valid
            })
            .map(|name| HistoryEntry {
                path: paths.release_dir_named(&name),
                name,
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently created release.
    pub fn newest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    /// The release a rollback would activate (second newest).
    pub fn rollback_target(&self) -> Option<&HistoryEntry> {
        self.entries.get(1)
    }

    /// Entries outside the retention window.
    pub fn beyond(&self, keep: usize) -> &[HistoryEntry] {
        if keep >= self.entries.len() {
            &[]
        } else {
            &self.entries[keep..]
        }
    }
}
