// ABOUTME: Compile-fail test verifying swap_live cannot run before migrate.
// ABOUTME: This test should fail to compile, validating state machine safety.

use strofi::deploy::{Confirmed, Deployment};
use strofi::host::FsOps;

async fn try_early_cutover<H: FsOps>(deployment: Deployment<Confirmed>, host: &H) {
    // ERROR: swap_live() doesn't exist on Deployment<Confirmed>
    deployment.swap_live(host).await;
}

fn main() {}
