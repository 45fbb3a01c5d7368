//! The transfer orchestrator.
//!
//! One `run` drives one flow: look the definition up, validate it, resolve
//! the credential, open the remote session, enumerate entries, move each
//! regular file into object storage, and release the session. The session
//! is closed exactly once per run on both the success and failure path; a
//! close failure is logged and never changes the run's outcome, so cleanup
//! cannot mask or be masked by the primary result.

use crate::config::TransferOptions;
use crate::path::{object_key, remote_file_path};
use flowpull_core::directory::FlowDirectory;
use flowpull_core::secrets::{resolve_credential, CredentialResolver};
use flowpull_core::store::ObjectStoreWriter;
use flowpull_core::transport::{EntryKind, RemoteEntry, RemoteSession, RemoteTransport};
use flowpull_core::BoxError;
use futures_util::{stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Errors that can end a transfer run.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Flow not found: {0}")]
    FlowNotFound(String),
    #[error("Flow lookup failed: {source}")]
    Directory {
        #[source]
        source: flowpull_core::directory::Error,
    },
    #[error("Flow {flow_id} does not describe a remote pull transfer: {source}")]
    InvalidFlowConfiguration {
        flow_id: String,
        #[source]
        source: flowpull_core::flow::Error,
    },
    #[error("Credential resolution failed: {source}")]
    CredentialUnavailable {
        #[source]
        source: flowpull_core::secrets::Error,
    },
    #[error("Failed to open remote session: {source}")]
    Connection {
        #[source]
        source: BoxError,
    },
    #[error("Failed to list remote entries: {source}")]
    Listing {
        #[source]
        source: BoxError,
    },
    #[error("Transfer aborted after {files_transferred} transferred file(s): {source}")]
    TransferIO {
        /// Files already uploaded before the failing entry. Those uploads
        /// remain in the target store; no rollback is performed.
        files_transferred: usize,
        #[source]
        source: BoxError,
    },
    #[error("Missing required builder attribute: {0}")]
    MissingBuilderAttribute(String),
}

/// Result record of a completed run, immutable once produced.
#[derive(PartialEq, Eq, Clone, Debug, Deserialize, Serialize)]
pub struct TransferSummary {
    /// The flow that was executed.
    pub flow_id: String,
    /// Number of `File`-kind entries successfully uploaded.
    pub files_transferred: usize,
    /// Destination bucket.
    pub bucket: String,
    /// Normalized destination prefix ("" or ending in one separator).
    pub prefix: String,
}

/// Orchestrates transfer runs over the capability traits.
///
/// Holds no mutable state of its own: concurrent `run` invocations are
/// independent units, each with its own remote session and one file's bytes
/// in flight at a time.
pub struct TransferOrchestrator {
    directory: Arc<dyn FlowDirectory>,
    secrets: Arc<dyn CredentialResolver>,
    transport: Arc<dyn RemoteTransport>,
    store: Arc<dyn ObjectStoreWriter>,
    options: TransferOptions,
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TransferOrchestrator {
    /// Executes the flow and returns its transfer summary.
    #[tracing::instrument(skip(self), fields(flow.id = %flow_id))]
    pub async fn run(&self, flow_id: &str) -> Result<TransferSummary, Error> {
        info!("starting transfer run");

        let flow = self
            .directory
            .get(flow_id)
            .await
            .map_err(|source| Error::Directory { source })?
            .ok_or_else(|| Error::FlowNotFound(flow_id.to_string()))?;

        let (source, target) =
            flow.transfer_configs()
                .map_err(|source| Error::InvalidFlowConfiguration {
                    flow_id: flow_id.to_string(),
                    source,
                })?;

        let credential = resolve_credential(source, self.secrets.as_ref())
            .await
            .map_err(|source| Error::CredentialUnavailable { source })?;

        let endpoint = source.endpoint();
        let session = match self
            .with_deadline(self.transport.connect(&endpoint, credential.as_ref()))
            .await
        {
            Ok(Ok(session)) => session,
            Ok(Err(source)) => {
                return Err(Error::Connection {
                    source: Box::new(source),
                })
            }
            Err(elapsed) => {
                return Err(Error::Connection {
                    source: Box::new(elapsed),
                })
            }
        };
        info!(host = %endpoint.host, port = endpoint.port, "remote session established");

        let remote_dir = source.directory().to_string();
        let bucket = target.bucket.clone();
        let prefix = target.normalized_prefix();

        // From here on a session exists: it is released exactly once,
        // whatever the transfer outcome.
        let result = self
            .transfer_entries(session.as_ref(), &remote_dir, &bucket, &prefix)
            .await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "failed to close remote session");
        }

        let files_transferred = result?;
        info!(
            files_transferred,
            bucket = %bucket,
            prefix = %prefix,
            "transfer run completed"
        );

        Ok(TransferSummary {
            flow_id: flow_id.to_string(),
            files_transferred,
            bucket,
            prefix,
        })
    }

    /// Lists the remote directory and folds the `File`-kind entries through
    /// the per-file transfer, strictly sequentially.
    async fn transfer_entries(
        &self,
        session: &dyn RemoteSession,
        remote_dir: &str,
        bucket: &str,
        prefix: &str,
    ) -> Result<usize, Error> {
        let entries = match self.with_deadline(session.list(remote_dir)).await {
            Ok(Ok(entries)) => entries,
            Ok(Err(source)) => {
                return Err(Error::Listing {
                    source: Box::new(source),
                })
            }
            Err(elapsed) => {
                return Err(Error::Listing {
                    source: Box::new(elapsed),
                })
            }
        };

        let files: Vec<RemoteEntry> = entries
            .into_iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .collect();
        info!(path = %remote_dir, files = files.len(), "remote listing complete");

        let retry = self.options.retry.clone().unwrap_or_default();
        let retry = &retry;

        stream::iter(files.into_iter().map(Ok::<_, Error>))
            .try_fold(0usize, |transferred, entry| async move {
                let remote_path = remote_file_path(remote_dir, &entry.name);
                let key = object_key(prefix, &entry.name);

                tokio_retry::Retry::spawn(retry.strategy(), || async {
                    match self
                        .transfer_file(session, &remote_path, bucket, &key)
                        .await
                    {
                        Ok(()) => Ok(()),
                        Err(e) => {
                            warn!(path = %remote_path, error = %e, "file transfer attempt failed");
                            Err(e)
                        }
                    }
                })
                .await
                .map_err(|source| Error::TransferIO {
                    files_transferred: transferred,
                    source,
                })?;

                Ok(transferred + 1)
            })
            .await
    }

    /// Moves one file: full download, then one upload.
    async fn transfer_file(
        &self,
        session: &dyn RemoteSession,
        remote_path: &str,
        bucket: &str,
        key: &str,
    ) -> Result<(), BoxError> {
        info!(path = %remote_path, "downloading remote file");
        let data = match self.with_deadline(session.download(remote_path)).await {
            Ok(Ok(data)) => data,
            Ok(Err(source)) => return Err(Box::new(source)),
            Err(elapsed) => return Err(Box::new(elapsed)),
        };

        info!(bucket = %bucket, key = %key, bytes = data.len(), "uploading object");
        match self.with_deadline(self.store.put(bucket, key, data)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(Box::new(source)),
            Err(elapsed) => Err(Box::new(elapsed)),
        }
    }

    /// Applies the configured operation deadline to one suspension point.
    async fn with_deadline<F>(
        &self,
        operation: F,
    ) -> Result<F::Output, tokio::time::error::Elapsed>
    where
        F: std::future::Future,
    {
        match self.options.operation_timeout {
            Some(deadline) => tokio::time::timeout(deadline, operation).await,
            None => Ok(operation.await),
        }
    }
}

/// Builder pattern for constructing TransferOrchestrator instances.
#[derive(Default)]
pub struct TransferOrchestratorBuilder {
    directory: Option<Arc<dyn FlowDirectory>>,
    secrets: Option<Arc<dyn CredentialResolver>>,
    transport: Option<Arc<dyn RemoteTransport>>,
    store: Option<Arc<dyn ObjectStoreWriter>>,
    options: Option<TransferOptions>,
}

impl TransferOrchestratorBuilder {
    pub fn new() -> TransferOrchestratorBuilder {
        TransferOrchestratorBuilder {
            ..Default::default()
        }
    }

    pub fn directory(mut self, directory: Arc<dyn FlowDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn secrets(mut self, secrets: Arc<dyn CredentialResolver>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn RemoteTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn store(mut self, store: Arc<dyn ObjectStoreWriter>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn options(mut self, options: TransferOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn build(self) -> Result<TransferOrchestrator, Error> {
        Ok(TransferOrchestrator {
            directory: self
                .directory
                .ok_or_else(|| Error::MissingBuilderAttribute("directory".to_string()))?,
            secrets: self
                .secrets
                .ok_or_else(|| Error::MissingBuilderAttribute("secrets".to_string()))?,
            transport: self
                .transport
                .ok_or_else(|| Error::MissingBuilderAttribute("transport".to_string()))?,
            store: self
                .store
                .ok_or_else(|| Error::MissingBuilderAttribute("store".to_string()))?,
            options: self.options.unwrap_or_default(),
        })
    }
}
