// ABOUTME: SSH-backed implementation of the host capability traits.
// ABOUTME: Every operation is a structured command rendered at this boundary.

use async_trait::async_trait;

use super::command::{ExecOutput, RemoteCommand};
use super::traits::{ExecError, ExecOps, FsError, FsOps};
use crate::ssh::Session;

/// A deployment target reached over SSH.
pub struct SshHost {
    session: Session,
}

impl SshHost {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    async fn exec(&self, cmd: &RemoteCommand) -> Result<ExecOutput, ExecError> {
        let output = self
            .session
            .exec(&cmd.render())
            .await
            .map_err(|e| match e {
                crate::ssh::Error::CommandTimeout(d) => ExecError::Timeout(d),
                other => ExecError::Transport(other.to_string()),
            })?;
        Ok(ExecOutput {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn exec_fs(&self, cmd: &RemoteCommand) -> Result<ExecOutput, FsError> {
        self.exec(cmd).await.map_err(|e| match e {
            ExecError::Transport(msg) => FsError::Transport(msg),
            other => FsError::Transport(other.to_string()),
        })
    }
}

#[async_trait]
impl FsOps for SshHost {
    async fn path_exists(&self, path: &str) -> Result<bool, FsError> {
        let cmd = RemoteCommand::new("test").arg("-e").arg(path);
        Ok(self.exec_fs(&cmd).await?.success())
    }

    async fn make_dir(&self, path: &str) -> Result<(), FsError> {
        let cmd = RemoteCommand::new("mkdir").arg(path);
        let output = self.exec_fs(&cmd).await?;
        if output.success() {
            return Ok(());
        }
        if output.stderr.contains("File exists") {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        Err(FsError::Failed {
            path: path.to_string(),
            detail: output.detail().to_string(),
        })
    }

    async fn make_dir_all(&self, path: &str) -> Result<(), FsError> {
        let cmd = RemoteCommand::new("mkdir").arg("-p").arg(path);
        let output = self.exec_fs(&cmd).await?;
        if output.success() {
            return Ok(());
        }
        Err(FsError::Failed {
            path: path.to_string(),
            detail: output.detail().to_string(),
        })
    }

    async fn symlink(&self, target: &str, link: &str) -> Result<(), FsError> {
        let cmd = RemoteCommand::new("ln").args(["-nfs", target, link]);
        let output = self.exec_fs(&cmd).await?;
        if output.success() {
            return Ok(());
        }
        Err(FsError::Failed {
            path: link.to_string(),
            detail: output.detail().to_string(),
        })
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        // -T keeps the rename a single directory-entry replacement even when
        // the destination is a symlink to a directory.
        let cmd = RemoteCommand::new("mv").args(["-Tf", from, to]);
        let output = self.exec_fs(&cmd).await?;
        if output.success() {
            return Ok(());
        }
        Err(FsError::Failed {
            path: to.to_string(),
            detail: output.detail().to_string(),
        })
    }

    async fn read_link(&self, path: &str) -> Result<Option<String>, FsError> {
        let cmd = RemoteCommand::new("readlink").arg("--").arg(path);
        let output = self.exec_fs(&cmd).await?;
        if !output.success() {
            return Ok(None);
        }
        let target = output.stdout.trim().to_string();
        if target.is_empty() {
            return Ok(None);
        }
        Ok(Some(target))
    }

    async fn remove_all(&self, path: &str) -> Result<(), FsError> {
        let cmd = RemoteCommand::new("rm").args(["-rf", "--", path]);
        let output = self.exec_fs(&cmd).await?;
        if output.success() {
            return Ok(());
        }
        Err(FsError::Failed {
            path: path.to_string(),
            detail: output.detail().to_string(),
        })
    }

    async fn list_dir_by_mtime(&self, dir: &str) -> Result<Vec<String>, FsError> {
        let cmd = RemoteCommand::new("ls").args(["-1t", "--", dir]);
        let output = self.exec_fs(&cmd).await?;
        if !output.success() {
            // A target that has never been deployed to has no releases dir.
            if output.stderr.contains("No such file") {
                return Ok(Vec::new());
            }
            return Err(FsError::Failed {
                path: dir.to_string(),
                detail: output.detail().to_string(),
            });
        }
        Ok(output
            .stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

#[async_trait]
impl ExecOps for SshHost {
    async fn run(&self, cmd: &RemoteCommand) -> Result<ExecOutput, ExecError> {
        self.exec(cmd).await
    }
}
