// ABOUTME: Fire-and-forget completion notification.
// ABOUTME: Runs a local command with the elapsed deploy duration in its env.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Format a duration as MM:SS for notification text.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Runs the configured local notification command when a pipeline finishes.
///
/// Failures are logged and never affect the deploy result.
pub struct Notifier {
    argv: Option<Vec<String>>,
}

impl Notifier {
    pub fn new(argv: Option<Vec<String>>) -> Self {
        Self { argv }
    }

    /// No notification configured.
    pub fn disabled() -> Self {
        Self { argv: None }
    }

    pub async fn deploy_finished(&self, elapsed: Duration) {
        let Some(argv) = &self.argv else {
            return;
        };
        let Some((program, args)) = argv.split_first() else {
            return;
        };

        let formatted = format_elapsed(elapsed);
        let result = Command::new(program)
            .args(args)
            .env("STROFI_ELAPSED", &formatted)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(status) if status.success() => {
                tracing::debug!("notification command completed ({})", formatted);
            }
            Ok(status) => {
                tracing::warn!("notification command exited with {:?}", status.code());
            }
            Err(e) => {
                tracing::warn!("failed to run notification command: {}", e);
            }
        }
    }
}
