// ABOUTME: Compile-fail test verifying prune cannot run before cutover.
// ABOUTME: This test should fail to compile, validating state machine safety.

use strofi::deploy::{Deployment, Migrated};
use strofi::host::FsOps;

async fn try_early_prune<H: FsOps>(deployment: Deployment<Migrated>, host: &H) {
    // ERROR: prune() doesn't exist on Deployment<Migrated>
    deployment.prune(host).await;
}

fn main() {}
