//! SFTP session management built on `ssh2`.
//!
//! `ssh2` is a blocking library; the session lives behind an
//! `Arc<Mutex<..>>` and every remote operation is dispatched to the tokio
//! blocking pool. One session serves one transfer run and cannot safely
//! multiplex concurrent directory operations, so operations are strictly
//! sequential.

use bytes::Bytes;
use flowpull_core::secrets::Credential;
use flowpull_core::transport::{
    EntryKind, RemoteEndpoint, RemoteEntry, RemoteSession, RemoteTransport,
};
use ssh2::Session;
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Errors raised by the SFTP client.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO operation failed with error: {source}")]
    IO {
        #[source]
        source: std::io::Error,
    },
    #[error("Could not resolve remote address {addr}")]
    AddressResolve { addr: String },
    #[error("SSH operation failed with error: {source}")]
    Ssh {
        #[source]
        source: ssh2::Error,
    },
    #[error("Authentication was not accepted by the remote host")]
    AuthenticationFailed,
    #[error("Blocking task failed with error: {source}")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Missing required builder attribute: {0}")]
    MissingBuilderAttribute(String),
}

/// Maps a remote stat to the entry kind used by the transfer loop.
fn entry_kind(stat: &ssh2::FileStat) -> EntryKind {
    if stat.is_file() {
        EntryKind::File
    } else if stat.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Other
    }
}

/// Connected ssh2 state shared with the blocking pool.
struct Inner {
    session: Session,
    sftp: ssh2::Sftp,
}

impl Inner {
    fn list(&self, path: &str) -> Result<Vec<RemoteEntry>, Error> {
        let raw = self
            .sftp
            .readdir(Path::new(path))
            .map_err(|source| Error::Ssh { source })?;

        let entries = raw
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                if name.is_empty() || name == "." || name == ".." {
                    return None;
                }
                Some(RemoteEntry {
                    name,
                    kind: entry_kind(&stat),
                })
            })
            .collect();

        Ok(entries)
    }

    fn download(&self, path: &str) -> Result<Bytes, Error> {
        let mut file = self
            .sftp
            .open(Path::new(path))
            .map_err(|source| Error::Ssh { source })?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|source| Error::IO { source })?;

        Ok(Bytes::from(buf))
    }

    fn close(&self) -> Result<(), Error> {
        self.session
            .disconnect(None, "session closed", None)
            .map_err(|source| Error::Ssh { source })
    }
}

/// Builder for [`SftpClient`] instances.
#[derive(Default)]
pub struct SftpClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    credential: Option<Credential>,
    timeout: Option<Duration>,
}

impl SftpClientBuilder {
    pub fn new() -> SftpClientBuilder {
        SftpClientBuilder {
            ..Default::default()
        }
    }

    pub fn host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Sets the credential; `None` keeps agent authentication as the
    /// fallback.
    pub fn credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    /// Bounds the TCP connect and each subsequent blocking operation.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SftpClient, Error> {
        Ok(SftpClient {
            host: self
                .host
                .ok_or_else(|| Error::MissingBuilderAttribute("host".to_string()))?,
            port: self.port.unwrap_or(flowpull_core::flow::DEFAULT_SFTP_PORT),
            username: self
                .username
                .ok_or_else(|| Error::MissingBuilderAttribute("username".to_string()))?,
            credential: self.credential,
            timeout: self.timeout,
        })
    }
}

/// Unconnected SFTP client configuration.
#[derive(Debug)]
pub struct SftpClient {
    host: String,
    port: u16,
    username: String,
    credential: Option<Credential>,
    timeout: Option<Duration>,
}

impl SftpClient {
    /// Opens the TCP connection, performs the SSH handshake, authenticates
    /// and opens the SFTP channel.
    pub async fn connect(self) -> Result<SftpSession, Error> {
        let inner = tokio::task::spawn_blocking(move || self.connect_blocking())
            .await
            .map_err(|source| Error::TaskJoin { source })??;

        Ok(SftpSession {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    fn connect_blocking(self) -> Result<Inner, Error> {
        let addr = format!("{}:{}", self.host, self.port);
        let sock_addr = addr
            .to_socket_addrs()
            .map_err(|source| Error::IO { source })?
            .next()
            .ok_or_else(|| Error::AddressResolve { addr: addr.clone() })?;

        let tcp = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(&sock_addr, timeout)
                .map_err(|source| Error::IO { source })?,
            None => TcpStream::connect(sock_addr).map_err(|source| Error::IO { source })?,
        };

        let mut session = Session::new().map_err(|source| Error::Ssh { source })?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|source| Error::Ssh { source })?;

        if let Some(timeout) = self.timeout {
            session.set_timeout(timeout.as_millis() as u32);
        }

        match &self.credential {
            Some(Credential::Password(password)) => session
                .userauth_password(&self.username, password)
                .map_err(|source| Error::Ssh { source })?,
            Some(Credential::PrivateKey(key)) => session
                .userauth_pubkey_memory(&self.username, None, key, None)
                .map_err(|source| Error::Ssh { source })?,
            // No credential configured: let an SSH agent supply the
            // identity if one is available.
            None => session
                .userauth_agent(&self.username)
                .map_err(|source| Error::Ssh { source })?,
        }

        if !session.authenticated() {
            return Err(Error::AuthenticationFailed);
        }

        debug!(host = %self.host, port = self.port, "sftp session authenticated");

        let sftp = session.sftp().map_err(|source| Error::Ssh { source })?;

        Ok(Inner { session, sftp })
    }
}

/// An open SFTP session implementing the remote session capability.
pub struct SftpSession {
    inner: Arc<Mutex<Inner>>,
}

impl SftpSession {
    fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a previous blocking op panicked; the
        // session state itself is still usable for cleanup.
        match inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait::async_trait]
impl RemoteSession for SftpSession {
    async fn list(
        &self,
        path: &str,
    ) -> Result<Vec<RemoteEntry>, flowpull_core::transport::Error> {
        let inner = Arc::clone(&self.inner);
        let path_owned = path.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let guard = Self::lock(&inner);
            guard.list(&path_owned)
        })
        .await
        .map_err(|source| Error::TaskJoin { source })
        .and_then(|r| r);

        result.map_err(|source| flowpull_core::transport::Error::List {
            path: path.to_string(),
            source: Box::new(source),
        })
    }

    async fn download(&self, path: &str) -> Result<Bytes, flowpull_core::transport::Error> {
        let inner = Arc::clone(&self.inner);
        let path_owned = path.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let guard = Self::lock(&inner);
            guard.download(&path_owned)
        })
        .await
        .map_err(|source| Error::TaskJoin { source })
        .and_then(|r| r);

        result.map_err(|source| flowpull_core::transport::Error::Download {
            path: path.to_string(),
            source: Box::new(source),
        })
    }

    async fn close(&self) -> Result<(), flowpull_core::transport::Error> {
        let inner = Arc::clone(&self.inner);

        let result = tokio::task::spawn_blocking(move || {
            let guard = Self::lock(&inner);
            guard.close()
        })
        .await
        .map_err(|source| Error::TaskJoin { source })
        .and_then(|r| r);

        result.map_err(|source| flowpull_core::transport::Error::Close {
            source: Box::new(source),
        })
    }
}

/// Remote transport that opens one [`SftpSession`] per transfer run.
#[derive(Default)]
pub struct SftpTransport {
    connect_timeout: Option<Duration>,
}

impl SftpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl RemoteTransport for SftpTransport {
    async fn connect(
        &self,
        endpoint: &RemoteEndpoint,
        credential: Option<&Credential>,
    ) -> Result<Box<dyn RemoteSession>, flowpull_core::transport::Error> {
        let session = async {
            let client = SftpClientBuilder::new()
                .host(endpoint.host.clone())
                .port(endpoint.port)
                .username(endpoint.username.clone())
                .credential(credential.cloned())
                .timeout(self.connect_timeout)
                .build()?;
            client.connect().await
        }
        .await
        .map_err(|source| flowpull_core::transport::Error::Connect {
            host: endpoint.host.clone(),
            port: endpoint.port,
            source: Box::new(source),
        })?;

        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = SftpClientBuilder::new()
            .host("files.example.com".to_string())
            .username("ingest".to_string())
            .credential(Some(Credential::Password("hunter2".to_string())))
            .build()
            .unwrap();
        assert_eq!(client.port, flowpull_core::flow::DEFAULT_SFTP_PORT);

        let result = SftpClientBuilder::new()
            .host("files.example.com".to_string())
            .build();
        assert!(matches!(
            result.unwrap_err(),
            Error::MissingBuilderAttribute(attr) if attr == "username"
        ));
    }

    #[test]
    fn test_entry_kind_mapping() {
        let stat = |perm: u32| ssh2::FileStat {
            size: None,
            uid: None,
            gid: None,
            perm: Some(perm),
            atime: None,
            mtime: None,
        };

        assert_eq!(entry_kind(&stat(0o100644)), EntryKind::File);
        assert_eq!(entry_kind(&stat(0o040755)), EntryKind::Directory);
        assert_eq!(entry_kind(&stat(0o120777)), EntryKind::Other);
    }
}
