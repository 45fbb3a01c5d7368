//! Application lifecycle: wires the real collaborators into the transfer
//! orchestrator and executes every discovered flow.

use crate::config::AppConfig;
use crate::directory::ConfigFlowDirectory;
use flowpull_core::secrets::{CredentialResolver, FileCredentialResolver, MemoryCredentialResolver};
use flowpull_object_store::WriterBuilder;
use flowpull_sftp::SftpTransport;
use flowpull_transfer::TransferOrchestratorBuilder;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Errors that can occur during application execution.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Flow discovery path is invalid or cannot be converted to a string.
    #[error("Invalid flow discovery path")]
    InvalidPath,
    /// Flow discovery or parsing error.
    #[error(transparent)]
    Directory(#[from] crate::directory::Error),
    /// Credentials file error.
    #[error("Failed to load credentials: {source}")]
    Secrets {
        #[source]
        source: flowpull_core::secrets::Error,
    },
    /// Orchestrator construction error.
    #[error("Failed to build orchestrator: {source}")]
    Orchestrator {
        #[source]
        source: flowpull_transfer::Error,
    },
}

/// Main application that discovers flows and runs their transfers.
pub struct App {
    /// Global application configuration.
    pub config: AppConfig,
}

impl flowpull_core::runner::Runner for App {
    type Error = Error;

    /// Discovers flow definitions, wires the SFTP transport, object store
    /// writer and credential resolver into one orchestrator, then runs
    /// every flow as an independent concurrent unit.
    #[tracing::instrument(skip(self), name = "app")]
    async fn run(self) -> Result<(), Error> {
        let pattern = self
            .config
            .flows
            .path
            .as_ref()
            .and_then(|path| path.to_str())
            .ok_or(Error::InvalidPath)?;

        let directory = ConfigFlowDirectory::discover(pattern)?;
        info!(flows = directory.len(), "flow directory loaded");

        let resolver: Arc<dyn CredentialResolver> = match &self.config.secrets {
            Some(options) => Arc::new(
                FileCredentialResolver::from_file(&options.credentials_path)
                    .map_err(|source| Error::Secrets { source })?,
            ),
            // Without a secrets file every configured credential_ref is
            // unresolvable, which fails runs up front instead of attempting
            // unauthenticated connections.
            None => Arc::new(MemoryCredentialResolver::new()),
        };

        let transfer_options = self.config.transfer.clone().unwrap_or_default();

        let transport =
            SftpTransport::new().connect_timeout(transfer_options.operation_timeout);

        let mut writer_builder = WriterBuilder::new();
        if let Some(client_options) = self
            .config
            .store
            .as_ref()
            .and_then(|options| options.client_options.clone())
        {
            writer_builder = writer_builder.client_options(client_options);
        }

        let flow_ids = directory.flow_ids();
        let orchestrator = Arc::new(
            TransferOrchestratorBuilder::new()
                .directory(Arc::new(directory))
                .secrets(resolver)
                .transport(Arc::new(transport))
                .store(Arc::new(writer_builder.build()))
                .options(transfer_options)
                .build()
                .map_err(|source| Error::Orchestrator { source })?,
        );

        // Each run is an independent unit of work; run them concurrently
        // and let failures surface per flow.
        let mut handles = Vec::new();
        for flow_id in flow_ids {
            let orchestrator = Arc::clone(&orchestrator);
            let span = tracing::Span::current();
            let handle = tokio::spawn(
                async move {
                    match orchestrator.run(&flow_id).await {
                        Ok(summary) => info!(
                            flow.id = %summary.flow_id,
                            files_transferred = summary.files_transferred,
                            bucket = %summary.bucket,
                            "flow transfer succeeded"
                        ),
                        Err(e) => error!(flow.id = %flow_id, "Flow transfer failed: {e}"),
                    }
                }
                .instrument(span),
            );
            handles.push(handle);
        }

        futures_util::future::join_all(handles).await;

        Ok(())
    }
}
