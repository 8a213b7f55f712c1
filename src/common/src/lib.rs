//! Common types shared by the collector binary and its SSH transport

pub mod error;
pub mod ssh;

pub use error::{AppError, Result as CommonResult};
pub use ssh::{HostKeyVerification, SshAuth, SshSettings, DEFAULT_SSH_PORT};
