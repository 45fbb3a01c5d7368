//! SFTP implementation of the flowpull remote transport.
//!
//! Drives the blocking `ssh2` library from async code: every remote
//! operation runs on the tokio blocking pool while the session itself is
//! shared behind a mutex.

/// SFTP client, session and transport implementation.
pub mod client;

pub use client::{SftpClient, SftpClientBuilder, SftpSession, SftpTransport};
