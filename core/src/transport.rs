//! Remote transport capability: connecting to a pull endpoint, listing
//! directory entries and downloading file content.
//!
//! A [`RemoteTransport`] opens one [`RemoteSession`] per transfer run. The
//! session owns the remote connection; the orchestrator releases it through
//! [`RemoteSession::close`] exactly once per run regardless of outcome.

use crate::secrets::Credential;
use bytes::Bytes;

/// Errors raised by remote transport operations.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to open remote session to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: crate::BoxError,
    },
    #[error("Failed to list remote directory {path}: {source}")]
    List {
        path: String,
        #[source]
        source: crate::BoxError,
    },
    #[error("Failed to download remote file {path}: {source}")]
    Download {
        path: String,
        #[source]
        source: crate::BoxError,
    },
    #[error("Failed to close remote session: {source}")]
    Close {
        #[source]
        source: crate::BoxError,
    },
}

/// Connection coordinates for a remote pull endpoint.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct RemoteEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
}

/// Kind of a remote directory entry.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum EntryKind {
    /// Regular file; the only kind that is transferred.
    File,
    /// Directory; skipped, never descended into.
    Directory,
    /// Anything else (symlinks, devices, ...); skipped.
    Other,
}

/// One entry of a remote directory listing.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct RemoteEntry {
    /// Bare entry name, without any directory component.
    pub name: String,
    pub kind: EntryKind,
}

/// Opens remote sessions.
#[async_trait::async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Opens an authenticated session to the endpoint. A `None` credential
    /// means none was configured; implementations may fall back to ambient
    /// authentication (e.g. an SSH agent).
    async fn connect(
        &self,
        endpoint: &RemoteEndpoint,
        credential: Option<&Credential>,
    ) -> Result<Box<dyn RemoteSession>, Error>;
}

/// An open session to a remote pull endpoint.
#[async_trait::async_trait]
pub trait RemoteSession: Send + Sync {
    /// Enumerates the entries directly under `path`, in listing order.
    async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>, Error>;

    /// Downloads the full content of the file at `path`.
    async fn download(&self, path: &str) -> Result<Bytes, Error>;

    /// Releases the remote connection. Invoked exactly once per run.
    async fn close(&self) -> Result<(), Error>;
}
