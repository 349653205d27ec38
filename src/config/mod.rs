// ABOUTME: Configuration types and parsing for strofi.yml.
// ABOUTME: Handles YAML parsing, validation, and destination merging.

mod deserialize;
mod target;

pub use target::TargetConfig;

use crate::error::{Error, Result};
use crate::types::AppName;
use deserialize::{deserialize_app_name, deserialize_targets, deserialize_targets_option};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "strofi.yml";
pub const CONFIG_FILENAME_ALT: &str = "strofi.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".strofi/config.yml";

pub const DEFAULT_KEEP_RELEASES: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_app_name")]
    pub app: AppName,

    /// Git URL (or anything the remote `git clone` accepts).
    pub repository: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(deserialize_with = "deserialize_targets")]
    pub targets: NonEmpty<TargetConfig>,

    /// Default deploy path for targets that don't set their own.
    #[serde(default)]
    pub deploy_path: Option<String>,

    #[serde(default)]
    pub shared: SharedConfig,

    /// Directories inside a release made world-writable before cutover.
    #[serde(default)]
    pub writable: Vec<String>,

    /// Retention window: releases beyond this count are pruned.
    #[serde(default = "default_keep_releases")]
    pub keep_releases: usize,

    /// Whether a failed migration aborts the deploy before cutover.
    #[serde(default = "default_migrate_fatal")]
    pub migrate_fatal: bool,

    #[serde(default)]
    pub commands: CommandsConfig,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,
}

/// Shared files and directories linked from `{deploy_path}/static/` into
/// every release.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub dirs: Vec<String>,
}

impl SharedConfig {
    /// All shared entry names, files first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .chain(self.dirs.iter())
            .map(String::as_str)
    }
}

/// Command argument vectors for the build and lifecycle steps. Structured
/// argv lists, never template strings; an absent entry skips the step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandsConfig {
    /// Dependency install commands, run in order in the release path.
    #[serde(default)]
    pub install: Vec<Vec<String>>,

    /// Asset build commands, run in order in the release path.
    #[serde(default)]
    pub build: Vec<Vec<String>>,

    /// Schema migration command, run in the release path.
    #[serde(default)]
    pub migrate: Option<Vec<String>>,

    /// Put the app into maintenance mode (run in a release path).
    #[serde(default)]
    pub maintenance_on: Option<Vec<String>>,

    /// Lift maintenance mode (run in the live path).
    #[serde(default)]
    pub maintenance_off: Option<Vec<String>>,

    /// Invalidate external process-level caches after cutover.
    #[serde(default)]
    pub reset_cache: Option<Vec<String>>,

    /// Local notification command run at pipeline completion.
    #[serde(default)]
    pub notify: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default, deserialize_with = "deserialize_targets_option")]
    pub targets: Option<NonEmpty<TargetConfig>>,

    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub keep_releases: Option<usize>,

    #[serde(default)]
    pub deploy_path: Option<String>,
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_keep_releases() -> usize {
    DEFAULT_KEEP_RELEASES
}

fn default_migrate_fatal() -> bool {
    true
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Apply a named destination's overrides.
    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(ref targets) = dest.targets {
            merged.targets = targets.clone();
        }
        if let Some(ref branch) = dest.branch {
            merged.branch = branch.clone();
        }
        if let Some(keep) = dest.keep_releases {
            merged.keep_releases = keep;
        }
        if let Some(ref deploy_path) = dest.deploy_path {
            merged.deploy_path = Some(deploy_path.clone());
        }

        merged.validate()?;
        Ok(merged)
    }

    /// The deploy path for a target, falling back to the top-level default.
    pub fn deploy_path_for(&self, target: &TargetConfig) -> Result<String> {
        target
            .deploy_path
            .clone()
            .or_else(|| self.deploy_path.clone())
            .ok_or_else(|| {
                Error::InvalidConfig(format!("target {} has no deploy_path", target.host))
            })
    }

    /// The branch to check out on a target.
    pub fn branch_for<'a>(&'a self, target: &'a TargetConfig) -> &'a str {
        target.branch.as_deref().unwrap_or(&self.branch)
    }

    fn validate(&self) -> Result<()> {
        if self.keep_releases == 0 {
            return Err(Error::InvalidConfig(
                "keep_releases must be at least 1".to_string(),
            ));
        }

        let check_argv = |name: &str, argv: &[String]| -> Result<()> {
            if argv.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "commands.{} entry cannot be empty",
                    name
                )));
            }
            Ok(())
        };

        for argv in &self.commands.install {
            check_argv("install", argv)?;
        }
        for argv in &self.commands.build {
            check_argv("build", argv)?;
        }
        for (name, argv) in [
            ("migrate", &self.commands.migrate),
            ("maintenance_on", &self.commands.maintenance_on),
            ("maintenance_off", &self.commands.maintenance_off),
            ("reset_cache", &self.commands.reset_cache),
            ("notify", &self.commands.notify),
        ] {
            if let Some(argv) = argv {
                check_argv(name, argv)?;
            }
        }

        Ok(())
    }

    pub fn template() -> Self {
        Config {
            app: AppName::new("my-app").unwrap(),
            repository: "https://github.com/org/my-app.git".to_string(),
            branch: default_branch(),
            targets: NonEmpty::new(TargetConfig {
                host: "server.example.com".to_string(),
                port: 22,
                user: Some("deploy".to_string()),
                identity_file: None,
                deploy_path: Some("/srv/my-app".to_string()),
                branch: None,
                confirm: false,
                trust_first_connection: true,
                command_timeout: std::time::Duration::from_secs(300),
            }),
            deploy_path: None,
            shared: SharedConfig::default(),
            writable: Vec::new(),
            keep_releases: DEFAULT_KEEP_RELEASES,
            migrate_fatal: true,
            commands: CommandsConfig::default(),
            destinations: HashMap::new(),
        }
    }
}

pub fn init_config(dir: &Path, app: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(a) = app {
        config.app = AppName::new(a).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let first_target = config.targets.first();
    format!(
        r#"app: {}
repository: {}
branch: {}
keep_releases: {}

targets:
  - host: {}
    user: {}
    deploy_path: {}

shared:
  files: []
  dirs: []

writable: []

commands:
  install: []
  build: []
"#,
        config.app,
        config.repository,
        config.branch,
        config.keep_releases,
        first_target.host,
        first_target.user.as_deref().unwrap_or("deploy"),
        first_target.deploy_path.as_deref().unwrap_or("/srv/app"),
    )
}
