// ABOUTME: SSH client module for remote target connections.
// ABOUTME: Supports identity files, SSH agent, and known_hosts verification.

mod client;
mod error;

pub use client::{CommandOutput, Session, SessionConfig};
pub use error::{Error, Result};
