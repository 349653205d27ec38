// ABOUTME: Deployment target configuration for SSH connections.
// ABOUTME: Parses formats like "host", "user@host", "host:port", "user@host:port".

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::ssh::SessionConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    /// Private key path; `~` is expanded relative to $HOME.
    #[serde(default)]
    pub identity_file: Option<String>,
    /// Root of the release layout on this target. Falls back to the
    /// top-level `deploy_path` when absent.
    #[serde(default)]
    pub deploy_path: Option<String>,
    /// Branch override for this target.
    #[serde(default)]
    pub branch: Option<String>,
    /// Require interactive confirmation before deploying here.
    #[serde(default)]
    pub confirm: bool,
    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

fn default_port() -> u16 {
    22
}

fn default_trust_first_connection() -> bool {
    true
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

impl TargetConfig {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("target address cannot be empty".to_string());
        }

        // Parse format: [user@]host[:port]
        let (user_part, rest) = if let Some(at_pos) = s.find('@') {
            (Some(&s[..at_pos]), &s[at_pos + 1..])
        } else {
            (None, s)
        };

        let (host, port) = if let Some(colon_pos) = rest.rfind(':') {
            let port_str = &rest[colon_pos + 1..];
            let port = port_str
                .parse::<u16>()
                .map_err(|_| format!("invalid port: {}", port_str))?;
            (&rest[..colon_pos], port)
        } else {
            (rest, 22)
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(TargetConfig {
            host: host.to_string(),
            port,
            user: user_part.map(|s| s.to_string()),
            identity_file: None,
            deploy_path: None,
            branch: None,
            confirm: false,
            trust_first_connection: true,
            command_timeout: default_command_timeout(),
        })
    }

    /// The user to authenticate as, falling back to $USER then "root".
    pub fn ssh_user(&self) -> String {
        self.user.clone().unwrap_or_else(|| {
            std::env::var("USER").unwrap_or_else(|_| "root".to_string())
        })
    }

    /// Build an SSH session config for this target.
    pub fn ssh_session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new(&self.host, self.ssh_user())
            .port(self.port)
            .trust_on_first_use(self.trust_first_connection)
            .command_timeout(self.command_timeout);

        if let Some(identity) = &self.identity_file {
            let expanded = shellexpand::tilde(identity);
            config = config.identity_file(PathBuf::from(expanded.as_ref()));
        }

        config
    }
}
