// ABOUTME: Validated domain types for deployments.
// ABOUTME: Prevents malformed app names and release identifiers at the boundary.

mod app_name;
mod release_id;

pub use app_name::{AppName, AppNameError};
pub use release_id::{ParseReleaseIdError, ReleaseId};
