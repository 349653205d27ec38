// ABOUTME: Shared test support: the in-memory fake host and config builders.
// ABOUTME: Used by pipeline, cutover, prune, rollback, and lock tests.
#![allow(dead_code)]

pub mod fake_host;

use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

use strofi::config::Config;
use strofi::confirm::AlwaysConfirm;
use strofi::deploy::{
    ConfirmOutcome, DeployError, DeployOutcome, DeployPaths, Deployment, Migrated, run_deploy,
};
use strofi::hooks::HookRunner;
use strofi::notify::Notifier;
use strofi::output::{Output, OutputMode};

use fake_host::FakeHost;

pub const DEPLOY_ROOT: &str = "/srv/my-app";

/// A config whose single target points at the fake host's deploy root.
pub fn test_config() -> Config {
    Config::template()
}

pub fn test_paths() -> DeployPaths {
    DeployPaths::new(DEPLOY_ROOT)
}

/// A fixed deploy timestamp: 2024-08-07 14:30 UTC -> release "08_07_14_30_*".
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 7, 14, 30, 0).unwrap()
}

pub fn new_deployment(config: &Config) -> Deployment<strofi::deploy::Idle> {
    Deployment::new(config.clone(), config.targets.head.clone(), test_paths())
}

/// Run the whole pipeline with no hooks, no confirmation, quiet output.
pub async fn run_full_deploy(
    config: &Config,
    host: &FakeHost,
) -> Result<DeployOutcome, DeployError> {
    let hooks = HookRunner::new(Path::new("/nonexistent"));
    run_deploy(
        new_deployment(config),
        host,
        &hooks,
        &AlwaysConfirm,
        &Notifier::disabled(),
        &Output::new(OutputMode::Quiet),
    )
    .await
}

/// Same as `run_full_deploy` but with hooks discovered in `project_dir`.
pub async fn run_full_deploy_with_hooks(
    config: &Config,
    host: &FakeHost,
    project_dir: &Path,
) -> Result<DeployOutcome, DeployError> {
    let hooks = HookRunner::new(project_dir);
    run_deploy(
        new_deployment(config),
        host,
        &hooks,
        &AlwaysConfirm,
        &Notifier::disabled(),
        &Output::new(OutputMode::Quiet),
    )
    .await
}

/// Walk the pipeline up to the `Migrated` state (the step before cutover).
pub async fn advance_to_migrated(config: &Config, host: &FakeHost) -> Deployment<Migrated> {
    let ConfirmOutcome::Proceed(d) = new_deployment(config).confirm(&AlwaysConfirm) else {
        panic!("confirmation should not be required");
    };
    let d = d.create_release(host, fixed_now()).await.unwrap();
    let d = d.fetch_source(host).await.unwrap();
    let d = d.link_shared(host).await.unwrap();
    let d = d.install_dependencies(host).await.unwrap();
    let d = d.compile_assets(host).await.unwrap();
    let d = d.set_permissions(host).await.unwrap();
    let d = d.quiesce(host).await;
    d.migrate(host).await.unwrap()
}
