// ABOUTME: Structured remote command construction and shell rendering.
// ABOUTME: Argument vectors are quoted only at the rendering boundary.

/// Quote a string for a POSIX shell.
///
/// Wraps in single quotes and escapes embedded single quotes with the
/// standard `'\''` sequence, so configuration values can never splice
/// additional shell syntax into a rendered command.
pub fn quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@'))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// A command to run on the remote host: a program, an argument vector,
/// and an optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<String>,
}

impl RemoteCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Build from an argument vector. Returns None for an empty vector.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            cwd: None,
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Human-readable form for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Render to a shell command line. Every segment is quoted.
    pub fn render(&self) -> String {
        let mut line = String::new();
        if let Some(dir) = &self.cwd {
            line.push_str("cd ");
            line.push_str(&quote(dir));
            line.push_str(" && ");
        }
        line.push_str(&quote(&self.program));
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote(arg));
        }
        line
    }
}

/// Captured result of a remote command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: u32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stderr if non-empty, otherwise stdout. Used to surface the most
    /// useful half of a failed command's output in error messages.
    pub fn detail(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_segments_are_not_quoted() {
        assert_eq!(quote("git"), "git");
        assert_eq!(quote("/var/www/app"), "/var/www/app");
    }

    #[test]
    fn segments_with_spaces_are_quoted() {
        assert_eq!(quote("a b"), "'a b'");
    }

    #[test]
    fn embedded_single_quotes_are_escaped() {
        assert_eq!(quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn empty_segment_renders_as_empty_quotes() {
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn render_includes_cwd_prefix() {
        let cmd = RemoteCommand::new("git")
            .args(["status", "--short"])
            .cwd("/srv/app releases");
        assert_eq!(cmd.render(), "cd '/srv/app releases' && git status --short");
    }

    #[test]
    fn render_quotes_hostile_arguments() {
        let cmd = RemoteCommand::new("echo").arg("$(rm -rf /)");
        assert_eq!(cmd.render(), "echo '$(rm -rf /)'");
    }

    #[test]
    fn from_argv_rejects_empty() {
        assert!(RemoteCommand::from_argv(&[]).is_none());
        let cmd = RemoteCommand::from_argv(&["ls".to_string(), "-l".to_string()]).unwrap();
        assert_eq!(cmd.program(), "ls");
    }
}
