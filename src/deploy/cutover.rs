// ABOUTME: Atomic live-pointer cutover shared by deploy and rollback.
// ABOUTME: Temp-name symlink plus rename; a reader never sees a missing pointer.

use crate::host::FsOps;

use super::error::DeployError;
use super::paths::DeployPaths;

/// Atomically point the live symlink at `release_path`.
///
/// The new link is created under a staging name in the same directory and
/// then renamed over `live`. Rename within one directory is atomic on POSIX
/// filesystems, so a concurrent reader observes either the old release or
/// the new one — never an absent or half-written pointer. Interruption
/// between the two operations leaves at worst a stale staging link and the
/// old pointer fully intact.
pub(crate) async fn point_live_at<H: FsOps>(
    host: &H,
    paths: &DeployPaths,
    release_path: &str,
) -> Result<(), DeployError> {
    let staging = paths.live_staging_link();

    host.symlink(release_path, &staging)
        .await
        .map_err(|e| DeployError::Cutover {
            detail: format!("failed to stage live link: {}", e),
        })?;

    host.rename(&staging, &paths.live_link())
        .await
        .map_err(|e| DeployError::Cutover {
            detail: format!("failed to publish live link: {}", e),
        })?;

    Ok(())
}
