// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct, and the pipeline driver.

mod cutover;
mod deployment;
mod error;
mod lock;
mod paths;
mod pipeline;
mod release;
mod rollback;
mod state;
mod transitions;

pub use deployment::{DeploySummary, Deployment};
pub use error::{DeployError, DeployErrorKind, LockHolderInfo};
pub use lock::{DeployLock, LockInfo};
pub use paths::DeployPaths;
pub use pipeline::{DeployOutcome, run_deploy};
pub use release::{HistoryEntry, MAX_CREATE_ATTEMPTS, Release, ReleaseHistory};
pub use rollback::{RollbackOutcome, rollback_live};
pub use state::{
    AssetsCompiled, CachesCleared, Confirmed, DepsInstalled, Done, Idle, Linked, LiveSwapped,
    Migrated, PermissionsSet, Pruned, Quiesced, ReleaseCreated, Resumed, SourceFetched,
};
pub use transitions::ConfirmOutcome;
