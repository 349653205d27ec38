// ABOUTME: Integration tests for the hooks system.
// ABOUTME: Tests hook discovery, execution, and environment variable passing.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use strofi::hooks::{HookContext, HookPoint, HookRunner};
use strofi::types::AppName;
use tempfile::TempDir;

fn create_hook(dir: &TempDir, name: &str, script: &str) {
    let hooks_dir = dir.path().join(".strofi").join("hooks");
    fs::create_dir_all(&hooks_dir).unwrap();

    let hook_path = hooks_dir.join(name);
    fs::write(&hook_path, script).unwrap();

    let mut perms = fs::metadata(&hook_path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&hook_path, perms).unwrap();
}

fn test_context() -> HookContext {
    HookContext {
        app: AppName::new("testapp").unwrap(),
        target: "test.example.com".to_string(),
        deploy_path: "/srv/testapp".to_string(),
        release: Some("08_07_14_30_0".to_string()),
    }
}

/// Test: pre-cutover hook runs and its output is captured.
#[tokio::test]
async fn pre_cutover_hook_runs() {
    let temp_dir = TempDir::new().unwrap();
    create_hook(
        &temp_dir,
        "pre-cutover",
        "#!/bin/sh\necho 'pre-cutover ran'\nexit 0\n",
    );

    let runner = HookRunner::new(temp_dir.path());
    assert!(runner.hook_exists(HookPoint::PreCutover));

    let result = runner.run(HookPoint::PreCutover, &test_context()).await;
    let result = result.expect("hook should have run");
    assert!(result.success);
    assert!(result.stdout.contains("pre-cutover ran"));
}

/// Test: deploy-failed hook runs on the failure path.
#[tokio::test]
async fn deploy_failed_hook_runs() {
    let temp_dir = TempDir::new().unwrap();
    create_hook(
        &temp_dir,
        "deploy-failed",
        "#!/bin/sh\necho 'cleaning up'\nexit 0\n",
    );

    let runner = HookRunner::new(temp_dir.path());
    let result = runner.run(HookPoint::DeployFailed, &test_context()).await;
    let result = result.expect("hook should have run");
    assert!(result.success);
    assert!(result.stdout.contains("cleaning up"));
}

/// Test: hook receives the deployment context as environment variables.
#[tokio::test]
async fn hook_receives_context_env() {
    let temp_dir = TempDir::new().unwrap();
    create_hook(
        &temp_dir,
        "post-deploy",
        "#!/bin/sh\necho \"$STROFI_APP $STROFI_TARGET $STROFI_RELEASE $STROFI_DEPLOY_PATH\"\n",
    );

    let runner = HookRunner::new(temp_dir.path());
    let result = runner
        .run(HookPoint::PostDeploy, &test_context())
        .await
        .expect("hook should have run");

    assert!(result.success);
    assert!(result.stdout.contains("testapp"));
    assert!(result.stdout.contains("test.example.com"));
    assert!(result.stdout.contains("08_07_14_30_0"));
    assert!(result.stdout.contains("/srv/testapp"));
}

/// Test: a failing hook reports its exit code and stderr.
#[tokio::test]
async fn failing_hook_reports_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    create_hook(
        &temp_dir,
        "pre-cutover",
        "#!/bin/sh\necho 'nope' >&2\nexit 3\n",
    );

    let runner = HookRunner::new(temp_dir.path());
    let result = runner
        .run(HookPoint::PreCutover, &test_context())
        .await
        .expect("hook should have run");

    assert!(!result.success);
    assert_eq!(result.exit_code, Some(3));
    assert!(result.stderr.contains("nope"));
}

/// Test: a missing hook is skipped, not an error.
#[tokio::test]
async fn missing_hook_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let runner = HookRunner::new(temp_dir.path());

    assert!(!runner.hook_exists(HookPoint::PostDeploy));
    let result = runner.run(HookPoint::PostDeploy, &test_context()).await;
    assert!(result.is_none());
}
