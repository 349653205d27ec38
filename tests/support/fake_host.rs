// ABOUTME: In-memory deployment target implementing FsOps and ExecOps.
// ABOUTME: Models dirs, symlinks, and mtimes; supports failure injection.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use strofi::host::{ExecError, ExecOps, ExecOutput, FsError, FsOps, RemoteCommand};

#[derive(Debug, Clone)]
enum Entry {
    Dir,
    Symlink(String),
    File(String),
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    mtimes: HashMap<String, u64>,
    clock: u64,
    commands: Vec<String>,
    fail_programs: HashMap<String, String>,
    fail_rename: bool,
    fail_remove: HashSet<String>,
}

impl State {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn insert(&mut self, path: &str, entry: Entry) {
        let now = self.tick();
        self.entries.insert(path.to_string(), entry);
        self.mtimes.insert(path.to_string(), now);
    }
}

/// An in-memory deployment target.
pub struct FakeHost {
    state: Mutex<State>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    // --- setup -------------------------------------------------------------

    /// Create a directory with the next logical mtime.
    pub fn add_dir(&self, path: &str) {
        self.state.lock().unwrap().insert(path, Entry::Dir);
    }

    pub fn add_symlink(&self, path: &str, target: &str) {
        self.state
            .lock()
            .unwrap()
            .insert(path, Entry::Symlink(target.to_string()));
    }

    pub fn add_file(&self, path: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .insert(path, Entry::File(content.to_string()));
    }

    /// Make every invocation of `program` exit 1 with the given stderr.
    pub fn fail_program(&self, program: &str, stderr: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_programs
            .insert(program.to_string(), stderr.to_string());
    }

    /// Make the next rename fail, simulating interruption between the
    /// staging link and the publish rename.
    pub fn fail_rename(&self) {
        self.state.lock().unwrap().fail_rename = true;
    }

    /// Make deletion of `path` fail.
    pub fn fail_remove(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_remove
            .insert(path.to_string());
    }

    // --- inspection --------------------------------------------------------

    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().unwrap().entries.contains_key(path)
    }

    pub fn link_target(&self, path: &str) -> Option<String> {
        match self.state.lock().unwrap().entries.get(path) {
            Some(Entry::Symlink(target)) => Some(target.clone()),
            _ => None,
        }
    }

    pub fn file_content(&self, path: &str) -> Option<String> {
        match self.state.lock().unwrap().entries.get(path) {
            Some(Entry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Rendered command lines in execution order.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Direct child names of `dir`, unsorted.
    pub fn child_names(&self, dir: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        direct_children(&state, dir).into_iter().map(|(n, _)| n).collect()
    }
}

fn direct_children(state: &State, dir: &str) -> Vec<(String, u64)> {
    let prefix = format!("{}/", dir.trim_end_matches('/'));
    state
        .entries
        .keys()
        .filter_map(|path| {
            let rest = path.strip_prefix(&prefix)?;
            if rest.is_empty() || rest.contains('/') {
                return None;
            }
            Some((rest.to_string(), *state.mtimes.get(path).unwrap_or(&0)))
        })
        .collect()
}

/// Undo the POSIX single-quote escaping applied by `strofi::host::quote`.
fn shell_unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        s[1..s.len() - 1].replace("'\\''", "'")
    } else {
        s.to_string()
    }
}

#[async_trait]
impl FsOps for FakeHost {
    async fn path_exists(&self, path: &str) -> Result<bool, FsError> {
        Ok(self.state.lock().unwrap().entries.contains_key(path))
    }

    async fn make_dir(&self, path: &str) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        if state.entries.contains_key(path) {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        state.insert(path, Entry::Dir);
        Ok(())
    }

    async fn make_dir_all(&self, path: &str) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        if !state.entries.contains_key(path) {
            state.insert(path, Entry::Dir);
        }
        Ok(())
    }

    async fn symlink(&self, target: &str, link: &str) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        state.insert(link, Entry::Symlink(target.to_string()));
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_rename {
            state.fail_rename = false;
            return Err(FsError::Failed {
                path: to.to_string(),
                detail: "injected rename failure".to_string(),
            });
        }
        let entry = state
            .entries
            .remove(from)
            .ok_or_else(|| FsError::NotFound(from.to_string()))?;
        state.mtimes.remove(from);
        state.insert(to, entry);
        Ok(())
    }

    async fn read_link(&self, path: &str) -> Result<Option<String>, FsError> {
        match self.state.lock().unwrap().entries.get(path) {
            Some(Entry::Symlink(target)) => Ok(Some(target.clone())),
            _ => Ok(None),
        }
    }

    async fn remove_all(&self, path: &str) -> Result<(), FsError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_remove.contains(path) {
            return Err(FsError::Failed {
                path: path.to_string(),
                detail: "injected remove failure".to_string(),
            });
        }
        let prefix = format!("{}/", path);
        state
            .entries
            .retain(|p, _| p != path && !p.starts_with(&prefix));
        state.mtimes.retain(|p, _| p != path && !p.starts_with(&prefix));
        Ok(())
    }

    async fn list_dir_by_mtime(&self, dir: &str) -> Result<Vec<String>, FsError> {
        let state = self.state.lock().unwrap();
        let mut children = direct_children(&state, dir);
        children.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(children.into_iter().map(|(name, _)| name).collect())
    }
}

#[async_trait]
impl ExecOps for FakeHost {
    async fn run(&self, cmd: &RemoteCommand) -> Result<ExecOutput, ExecError> {
        let rendered = cmd.render();
        let program = cmd.program().to_string();

        let mut state = self.state.lock().unwrap();
        state.commands.push(rendered.clone());

        if let Some(stderr) = state.fail_programs.get(&program) {
            return Ok(ExecOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: stderr.clone(),
            });
        }

        // The deploy lock acquires via `sh -c '(set -C; printf %s <json> > <path>)'`
        // and inspects via `cat <path>`; model both so lock tests work.
        if program == "sh" && rendered.contains("set -C") {
            let script = rendered
                .split_once("sh -c ")
                .map(|(_, s)| shell_unquote(s))
                .unwrap_or_default();
            // Shape: (set -C; printf %s <json> > <path>) 2>/dev/null
            let script = script.trim();
            let script = script.strip_suffix("2>/dev/null").unwrap_or(script).trim();
            let script = script.strip_prefix('(').unwrap_or(script);
            let script = script.strip_suffix(')').unwrap_or(script).trim();
            if let Some((content_part, path_part)) = script.rsplit_once('>') {
                let path = shell_unquote(path_part);
                let content = content_part
                    .split_once("printf %s ")
                    .map(|(_, c)| shell_unquote(c))
                    .unwrap_or_default();
                if state.entries.contains_key(&path) {
                    return Ok(ExecOutput {
                        exit_code: 1,
                        stdout: String::new(),
                        stderr: "cannot create: file exists".to_string(),
                    });
                }
                state.insert(&path, Entry::File(content));
                return Ok(ExecOutput {
                    exit_code: 0,
                    stdout: String::new(),
                    stderr: String::new(),
                });
            }
        }

        if program == "cat" {
            let path = rendered.trim_start_matches("cat ");
            let path = shell_unquote(path);
            return match state.entries.get(&path) {
                Some(Entry::File(content)) => Ok(ExecOutput {
                    exit_code: 0,
                    stdout: content.clone(),
                    stderr: String::new(),
                }),
                _ => Ok(ExecOutput {
                    exit_code: 1,
                    stdout: String::new(),
                    stderr: "No such file or directory".to_string(),
                }),
            };
        }

        Ok(ExecOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}
