// ABOUTME: Remote filesystem layout under a target's deploy path.
// ABOUTME: releases/, static/, the live pointer, and strofi's own state dir.

use crate::types::ReleaseId;

/// The release layout rooted at a target's deploy path.
///
/// Layout (compatibility-exact with existing targets):
/// - `{root}/releases/<release-id>/` — one directory per release
/// - `{root}/static/...` — shared resources linked into every release
/// - `{root}/live` — symlink naming the active release
/// - `{root}/.strofi/` — lock and state files
#[derive(Debug, Clone)]
pub struct DeployPaths {
    root: String,
}

impl DeployPaths {
    pub fn new(root: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.len() > 1 && root.ends_with('/') {
            root.pop();
        }
        Self { root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn releases_dir(&self) -> String {
        format!("{}/releases", self.root)
    }

    pub fn release_dir(&self, id: &ReleaseId) -> String {
        format!("{}/releases/{}", self.root, id)
    }

    pub fn release_dir_named(&self, name: &str) -> String {
        format!("{}/releases/{}", self.root, name)
    }

    pub fn static_dir(&self) -> String {
        format!("{}/static", self.root)
    }

    pub fn static_entry(&self, name: &str) -> String {
        format!("{}/static/{}", self.root, name)
    }

    pub fn live_link(&self) -> String {
        format!("{}/live", self.root)
    }

    /// Temporary name the new live symlink is created under before being
    /// renamed over `live`. Same directory as `live` so the rename is atomic.
    pub fn live_staging_link(&self) -> String {
        format!("{}/.live.next", self.root)
    }

    pub fn state_dir(&self) -> String {
        format!("{}/.strofi", self.root)
    }

    pub fn lock_file(&self) -> String {
        format!("{}/.strofi/deploy.lock", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn layout_paths() {
        let paths = DeployPaths::new("/srv/app");
        assert_eq!(paths.releases_dir(), "/srv/app/releases");
        assert_eq!(paths.static_dir(), "/srv/app/static");
        assert_eq!(paths.live_link(), "/srv/app/live");
        assert_eq!(paths.live_staging_link(), "/srv/app/.live.next");
        assert_eq!(paths.lock_file(), "/srv/app/.strofi/deploy.lock");
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let paths = DeployPaths::new("/srv/app//");
        assert_eq!(paths.root(), "/srv/app");
        assert_eq!(paths.live_link(), "/srv/app/live");
    }

    #[test]
    fn release_dir_uses_the_id() {
        let paths = DeployPaths::new("/srv/app");
        let at = Utc.with_ymd_and_hms(2024, 8, 7, 14, 30, 0).unwrap();
        let id = ReleaseId::from_timestamp(at, 2);
        assert_eq!(paths.release_dir(&id), "/srv/app/releases/08_07_14_30_2");
    }
}
