// ABOUTME: Remote host abstraction for deployment targets.
// ABOUTME: Capability traits plus the SSH-backed implementation.

mod command;
mod error;
mod ssh;
mod traits;

pub use command::{ExecOutput, RemoteCommand, quote};
pub use error::{HostError, HostErrorKind};
pub use ssh::SshHost;
pub use traits::{ExecError, ExecOps, FsError, FsOps};
