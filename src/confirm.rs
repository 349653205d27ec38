// ABOUTME: Interactive confirmation collaborator for gated targets.
// ABOUTME: Production-flagged targets prompt before any remote change.

use std::io::{self, BufRead, Write};

/// Asks the operator a yes/no question.
pub trait Confirm {
    /// Returns true to proceed. Declining aborts the pipeline with no
    /// changes made; it is not an error.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Reads the answer from stdin.
pub struct StdinConfirmer;

impl Confirm for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Always proceeds. Used for `--yes` and for targets without the
/// confirmation flag.
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
