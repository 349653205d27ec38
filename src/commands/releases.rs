// ABOUTME: Releases command implementation.
// ABOUTME: Lists each target's release history with the live release marked.

use strofi::config::{Config, TargetConfig};
use strofi::deploy::{DeployPaths, ReleaseHistory};
use strofi::error::Result;
use strofi::host::{FsOps, SshHost};
use strofi::output::Output;
use strofi::ssh::Session;

/// List releases on all configured targets.
pub async fn releases(config: Config, output: Output) -> Result<()> {
    for target in &config.targets {
        list_target(&config, target, &output).await?;
    }
    Ok(())
}

async fn list_target(config: &Config, target: &TargetConfig, output: &Output) -> Result<()> {
    let session = Session::connect(target.ssh_session_config()).await?;
    let host = SshHost::new(session);

    let deploy_path = config.deploy_path_for(target)?;
    let paths = DeployPaths::new(deploy_path);

    let history = ReleaseHistory::fetch(&host, &paths).await?;
    let live = host
        .read_link(&paths.live_link())
        .await
        .map_err(strofi::host::HostError::from)
        .map_err(strofi::deploy::DeployError::from)?;

    output.progress(&format!("Releases on {} ({}):", target.host, paths.root()));
    if history.is_empty() {
        output.progress("  (none)");
    }
    for entry in history.entries() {
        if live.as_deref() == Some(entry.path.as_str()) {
            output.progress(&format!("  * {} (live)", entry.name));
        } else {
            output.progress(&format!("  - {}", entry.name));
        }
    }

    if let Err(e) = host.into_session().disconnect().await {
        tracing::warn!("SSH disconnect failed for {}: {}", target.host, e);
    }

    Ok(())
}
