// ABOUTME: Drives the deploy pipeline end to end for one target.
// ABOUTME: Generic over the host so tests can run it against an in-memory target.

use chrono::Utc;

use crate::confirm::Confirm;
use crate::hooks::{HookContext, HookPoint, HookRunner};
use crate::host::{ExecOps, FsOps};
use crate::notify::Notifier;
use crate::output::Output;

use super::deployment::{DeploySummary, Deployment};
use super::error::DeployError;
use super::state::{Confirmed, Idle, Pruned};
use super::transitions::ConfirmOutcome;

/// Result of running the pipeline against one target.
#[derive(Debug)]
pub enum DeployOutcome {
    /// Pipeline ran to completion.
    Completed(DeploySummary),
    /// Operator declined confirmation; the target is untouched.
    Aborted,
}

/// Run the full deploy pipeline against one target.
///
/// The failure hook fires exactly once, on the first fatal error; the
/// post-deploy hook fires only after a completed pipeline. A declined
/// confirmation aborts before any remote change and fires no hooks.
pub async fn run_deploy<H: FsOps + ExecOps>(
    deployment: Deployment<Idle>,
    host: &H,
    hooks: &HookRunner,
    confirmer: &dyn Confirm,
    notifier: &Notifier,
    output: &Output,
) -> Result<DeployOutcome, DeployError> {
    let mut context = HookContext {
        app: deployment.app().clone(),
        target: deployment.target().host.clone(),
        deploy_path: deployment.paths().root().to_string(),
        release: None,
    };

    let deployment = match deployment.confirm(confirmer) {
        ConfirmOutcome::Proceed(d) => d,
        ConfirmOutcome::Declined => {
            output.progress("Ok, quitting.");
            return Ok(DeployOutcome::Aborted);
        }
    };

    match drive(deployment, host, hooks, output, &mut context).await {
        Ok(deployment) => {
            let deployment = deployment.notify(notifier, output.elapsed()).await;
            let summary = deployment.finish();

            if let Some(result) = hooks.run(HookPoint::PostDeploy, &context).await
                && !result.success
            {
                tracing::warn!("post-deploy hook failed");
            }

            Ok(DeployOutcome::Completed(summary))
        }
        Err(e) => {
            tracing::error!("deploy failed at {}: {}", e.step(), e);

            if let Some(result) = hooks.run(HookPoint::DeployFailed, &context).await
                && !result.success
            {
                tracing::warn!("deploy-failed hook failed");
            }

            Err(e)
        }
    }
}

/// The fatal portion of the pipeline. Any error here bubbles up to fire the
/// failure hook exactly once in `run_deploy`.
async fn drive<H: FsOps + ExecOps>(
    deployment: Deployment<Confirmed>,
    host: &H,
    hooks: &HookRunner,
    output: &Output,
    context: &mut HookContext,
) -> Result<Deployment<Pruned>, DeployError> {
    output.progress("  → Creating release...");
    let deployment = deployment.create_release(host, Utc::now()).await?;

    let release = deployment
        .release()
        .expect("release must exist past create_release");
    context.release = Some(release.id.to_string());
    output.progress(&format!("  → Release path: {}", release.path));

    output.progress("  → Fetching source...");
    let deployment = deployment.fetch_source(host).await?;

    output.progress("  → Linking shared paths...");
    let deployment = deployment.link_shared(host).await?;

    output.progress("  → Installing dependencies...");
    let deployment = deployment.install_dependencies(host).await?;

    output.progress("  → Compiling assets...");
    let deployment = deployment.compile_assets(host).await?;

    output.progress("  → Setting permissions...");
    let deployment = deployment.set_permissions(host).await?;

    output.progress("  → Entering maintenance mode...");
    let deployment = deployment.quiesce(host).await;

    output.progress("  → Running migrations...");
    let deployment = deployment.migrate(host).await?;

    if let Some(result) = hooks.run(HookPoint::PreCutover, context).await
        && !result.success
    {
        return Err(DeployError::Hook {
            hook: "pre-cutover",
        });
    }

    output.progress("  → Swapping live release...");
    let deployment = deployment.swap_live(host).await?;

    output.progress("  → Resuming application...");
    let deployment = deployment.resume(host).await;

    output.progress("  → Resetting caches...");
    let deployment = deployment.reset_cache(host).await;

    output.progress("  → Pruning old releases...");
    let deployment = deployment.prune(host).await?;

    Ok(deployment)
}
