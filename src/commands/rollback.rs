// ABOUTME: Rollback command implementation.
// ABOUTME: Re-points each target's live release at its predecessor.

use strofi::config::{Config, TargetConfig};
use strofi::deploy::{DeployPaths, RollbackOutcome, rollback_live};
use strofi::diagnostics::{Diagnostics, Warning};
use strofi::error::Result;
use strofi::host::SshHost;
use strofi::output::Output;
use strofi::ssh::Session;

/// Rollback to previous release on all configured targets.
pub async fn rollback(config: Config, mut output: Output) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "Rolling back {} on {} target(s)",
        config.app,
        config.targets.len()
    ));

    for target in &config.targets {
        if let Err(e) = rollback_on_target(&config, target, &output, &mut diag).await {
            eprintln!("Failed to rollback on {}: {}", target.host, e);
            return Err(e);
        }
    }

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    output.success("Rollback complete!");
    Ok(())
}

/// Rollback on a single target.
async fn rollback_on_target(
    config: &Config,
    target: &TargetConfig,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<()> {
    output.progress(&format!("  → Connecting to {}...", target.host));

    let session = Session::connect(target.ssh_session_config()).await?;
    let host = SshHost::new(session);

    let deploy_path = config.deploy_path_for(target)?;
    let paths = DeployPaths::new(deploy_path);

    output.progress("  → Swapping live release...");
    let outcome = rollback_live(&host, config, &paths).await?;

    match outcome {
        RollbackOutcome::RolledBack { from, to } => {
            output.progress(&format!(
                "  ✓ Rollback to `{}` release was successful (removed `{}`)",
                to, from
            ));
        }
        RollbackOutcome::NoRollbackTarget => {
            output.progress("  No more releases you can revert to.");
        }
    }

    if let Err(e) = host.into_session().disconnect().await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            target.host, e
        )));
    }

    Ok(())
}
