// ABOUTME: Hooks system for deployment lifecycle events.
// ABOUTME: Discovers and executes shell scripts at pre-cutover, post-deploy, and failure points.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::types::AppName;

/// Hook execution points in the deployment lifecycle.
///
/// Points are a closed enum; scripts are resolved by filename at
/// construction-time paths, never by runtime string lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    /// Immediately before the live pointer swap. Failure aborts the deploy
    /// while the old release is still live.
    PreCutover,
    /// After successful deployment. Failure logs a warning.
    PostDeploy,
    /// On any fatal pipeline error. Failure logs a warning.
    DeployFailed,
}

impl HookPoint {
    /// Get the hook filename for this point.
    pub fn filename(&self) -> &'static str {
        match self {
            HookPoint::PreCutover => "pre-cutover",
            HookPoint::PostDeploy => "post-deploy",
            HookPoint::DeployFailed => "deploy-failed",
        }
    }

    /// Whether failure at this hook point should abort deployment.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HookPoint::PreCutover)
    }
}

/// Context passed to hooks via environment variables.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub app: AppName,
    pub target: String,
    pub deploy_path: String,
    pub release: Option<String>,
}

impl HookContext {
    /// Convert context to environment variables.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("STROFI_APP".to_string(), self.app.to_string());
        env.insert("STROFI_TARGET".to_string(), self.target.clone());
        env.insert("STROFI_DEPLOY_PATH".to_string(), self.deploy_path.clone());
        if let Some(ref release) = self.release {
            env.insert("STROFI_RELEASE".to_string(), release.clone());
        }
        env
    }
}

/// Result of running a hook.
#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Discovers and runs hooks from a project directory.
pub struct HookRunner {
    hooks_dir: PathBuf,
}

impl HookRunner {
    /// Create a new hook runner looking for hooks in the given project directory.
    pub fn new(project_dir: &Path) -> Self {
        Self {
            hooks_dir: project_dir.join(".strofi").join("hooks"),
        }
    }

    /// Check if a hook exists for the given point.
    pub fn hook_exists(&self, point: HookPoint) -> bool {
        self.hook_path(point).is_file()
    }

    fn hook_path(&self, point: HookPoint) -> PathBuf {
        self.hooks_dir.join(point.filename())
    }

    /// Run a hook if it exists.
    ///
    /// Returns None if the hook doesn't exist, or Some(HookResult) if it was run.
    pub async fn run(&self, point: HookPoint, context: &HookContext) -> Option<HookResult> {
        let hook_path = self.hook_path(point);

        if !hook_path.is_file() {
            return None;
        }

        tracing::info!("Running {} hook: {}", point.filename(), hook_path.display());

        let env_vars = context.to_env();

        let output = Command::new(&hook_path)
            .envs(&env_vars)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                let result = HookResult {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if result.success {
                    tracing::info!("{} hook completed successfully", point.filename());
                } else {
                    tracing::warn!(
                        "{} hook failed with exit code {:?}",
                        point.filename(),
                        result.exit_code
                    );
                }

                Some(result)
            }
            Err(e) => {
                tracing::error!("Failed to execute {} hook: {}", point.filename(), e);
                Some(HookResult {
                    success: false,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_point_filenames() {
        assert_eq!(HookPoint::PreCutover.filename(), "pre-cutover");
        assert_eq!(HookPoint::PostDeploy.filename(), "post-deploy");
        assert_eq!(HookPoint::DeployFailed.filename(), "deploy-failed");
    }

    #[test]
    fn pre_cutover_is_fatal() {
        assert!(HookPoint::PreCutover.is_fatal());
        assert!(!HookPoint::PostDeploy.is_fatal());
        assert!(!HookPoint::DeployFailed.is_fatal());
    }

    #[test]
    fn hook_context_to_env() {
        let context = HookContext {
            app: AppName::new("myapp").unwrap(),
            target: "app.example.com".to_string(),
            deploy_path: "/srv/myapp".to_string(),
            release: Some("08_07_14_30_0".to_string()),
        };

        let env = context.to_env();
        assert_eq!(env.get("STROFI_APP"), Some(&"myapp".to_string()));
        assert_eq!(
            env.get("STROFI_TARGET"),
            Some(&"app.example.com".to_string())
        );
        assert_eq!(env.get("STROFI_DEPLOY_PATH"), Some(&"/srv/myapp".to_string()));
        assert_eq!(
            env.get("STROFI_RELEASE"),
            Some(&"08_07_14_30_0".to_string())
        );
    }

    #[test]
    fn hook_context_without_release() {
        let context = HookContext {
            app: AppName::new("myapp").unwrap(),
            target: "localhost".to_string(),
            deploy_path: "/srv/myapp".to_string(),
            release: None,
        };

        let env = context.to_env();
        assert!(!env.contains_key("STROFI_RELEASE"));
    }

    #[test]
    fn hook_runner_checks_hooks_dir() {
        let runner = HookRunner::new(Path::new("/nonexistent"));
        assert!(!runner.hook_exists(HookPoint::PreCutover));
    }
}
