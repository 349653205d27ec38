// ABOUTME: Deploy command implementation.
// ABOUTME: Connects to each target, holds the deploy lock, and runs the pipeline.

use std::env;

use strofi::config::{Config, TargetConfig};
use strofi::confirm::{AlwaysConfirm, Confirm, StdinConfirmer};
use strofi::deploy::{DeployLock, DeployOutcome, DeployPaths, Deployment, run_deploy};
use strofi::diagnostics::{Diagnostics, Warning};
use strofi::error::{Error, Result};
use strofi::hooks::HookRunner;
use strofi::host::SshHost;
use strofi::notify::Notifier;
use strofi::output::Output;
use strofi::ssh::Session;

/// Deploy to all configured targets, one sequential pipeline per target.
pub async fn deploy(config: Config, force: bool, yes: bool, mut output: Output) -> Result<()> {
    output.start_timer();
    let cwd = env::current_dir()?;
    let hook_runner = HookRunner::new(&cwd);
    let notifier = Notifier::new(config.commands.notify.clone());
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "Deploying {} (branch {}) to {} target(s)",
        config.app,
        config.branch,
        config.targets.len()
    ));

    for target in &config.targets {
        let outcome = deploy_to_target(
            &config,
            target,
            force,
            yes,
            &hook_runner,
            &notifier,
            &output,
            &mut diag,
        )
        .await;

        match outcome {
            Ok(DeployOutcome::Completed(summary)) => {
                output.progress(&format!(
                    "  ✓ Deployed release {} to {}",
                    summary.release.id, target.host
                ));
                if !summary.pruned.is_empty() {
                    output.progress(&format!(
                        "  ✓ Pruned {} old release(s)",
                        summary.pruned.len()
                    ));
                }
            }
            Ok(DeployOutcome::Aborted) => {
                // Declining the confirmation stops the whole run, not just
                // this target.
                return Ok(());
            }
            Err(e) => {
                eprintln!("Failed to deploy to {}: {}", target.host, e);
                return Err(e);
            }
        }
    }

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    output.success("Deployment complete!");
    Ok(())
}

/// Deploy to a single target while holding its deploy lock.
#[allow(clippy::too_many_arguments)]
async fn deploy_to_target(
    config: &Config,
    target: &TargetConfig,
    force: bool,
    yes: bool,
    hook_runner: &HookRunner,
    notifier: &Notifier,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<DeployOutcome> {
    output.progress(&format!("  → Connecting to {}...", target.host));

    let session = Session::connect(target.ssh_session_config()).await?;
    let host = SshHost::new(session);

    let deploy_path = config.deploy_path_for(target)?;
    let paths = DeployPaths::new(deploy_path);

    let confirmer: &dyn Confirm = if yes { &AlwaysConfirm } else { &StdinConfirmer };

    output.progress("  → Acquiring deploy lock...");
    let result = DeployLock::with_lock(&host, &paths, &config.app, force, async {
        let deployment = Deployment::new(config.clone(), target.clone(), paths.clone());
        run_deploy(deployment, &host, hook_runner, confirmer, notifier, output)
            .await
            .map_err(Error::from)
    })
    .await;

    // Disconnect SSH session (non-fatal if it fails)
    if let Err(e) = host.into_session().disconnect().await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            target.host, e
        )));
    }

    result
}
