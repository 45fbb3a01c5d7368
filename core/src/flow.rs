//! Flow definitions pairing a remote pull source with an object storage
//! destination.
//!
//! A [`FlowDefinition`] is owned by the flow directory and read-only to the
//! engine. Source and target configurations are tagged enums so that a flow
//! describing anything other than an SFTP pull into object storage is
//! rejected before any network activity.

use serde::{Deserialize, Serialize};

/// Default port for SFTP sources.
pub const DEFAULT_SFTP_PORT: u16 = 22;

/// Default remote directory when none is configured.
pub const DEFAULT_REMOTE_PATH: &str = ".";

fn default_port() -> u16 {
    DEFAULT_SFTP_PORT
}

/// Errors raised while validating a flow's transfer configuration.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Flow has no source configuration or one with the wrong tag.
    #[error("flow does not contain a valid sftp source_config")]
    MissingSourceConfig,
    /// Flow has no target configuration or one with the wrong tag.
    #[error("flow does not contain a valid object store target_config")]
    MissingTargetConfig,
}

/// A flow definition pairing one pull source with one storage destination.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct FlowDefinition {
    /// Unique flow identifier.
    pub id: String,
    /// Optional human-readable name for logging.
    #[serde(default)]
    pub name: Option<String>,
    /// Where files are pulled from.
    #[serde(default)]
    pub source_config: Option<SourceConfig>,
    /// Where files are written to.
    #[serde(default)]
    pub target_config: Option<TargetConfig>,
}

impl FlowDefinition {
    /// Extracts the SFTP source and object store target or fails with a
    /// configuration error. No side effects; called before any connection
    /// attempt.
    pub fn transfer_configs(&self) -> Result<(&SftpSourceConfig, &ObjectStoreTargetConfig), Error> {
        let source = match &self.source_config {
            Some(SourceConfig::Sftp(config)) => config,
            None => return Err(Error::MissingSourceConfig),
        };
        let target = match &self.target_config {
            Some(TargetConfig::ObjectStore(config)) => config,
            None => return Err(Error::MissingTargetConfig),
        };
        Ok((source, target))
    }
}

/// Supported source configurations, tagged by `type`.
///
/// Unknown tags fail at deserialization time, before a flow ever reaches
/// the orchestrator.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Remote pull over SFTP.
    Sftp(SftpSourceConfig),
}

/// Supported target configurations, tagged by `type`.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetConfig {
    /// Object storage bucket destination.
    ObjectStore(ObjectStoreTargetConfig),
}

/// Authentication method for an SFTP source.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Password authentication; `credential_ref` resolves to a password.
    #[default]
    Password,
    /// Public key authentication; `credential_ref` resolves to key material.
    PrivateKey,
}

/// SFTP pull source configuration.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct SftpSourceConfig {
    /// Remote host name or address.
    pub host: String,
    /// Remote port, defaults to 22.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user name.
    pub username: String,
    /// Which credential resolution path to use.
    #[serde(default)]
    pub auth_method: AuthMethod,
    /// Opaque reference resolved to secret material at run time. The secret
    /// itself is never stored in the flow definition.
    #[serde(default)]
    pub credential_ref: Option<String>,
    /// Remote directory to enumerate. Blank or absent means the session's
    /// initial directory (".").
    #[serde(default)]
    pub remote_path: Option<String>,
}

impl SftpSourceConfig {
    /// Effective remote directory: configured path trimmed, or "." when
    /// unset or blank.
    pub fn directory(&self) -> &str {
        match self.remote_path.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_REMOTE_PATH,
            Some(path) => path,
        }
    }

    /// Connection endpoint derived from this source.
    pub fn endpoint(&self) -> crate::transport::RemoteEndpoint {
        crate::transport::RemoteEndpoint {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
        }
    }
}

/// Object storage destination configuration.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct ObjectStoreTargetConfig {
    /// Destination bucket.
    pub bucket: String,
    /// Optional key prefix.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl ObjectStoreTargetConfig {
    /// Prefix normalized to either the empty string or a value ending in
    /// exactly one separator.
    pub fn normalized_prefix(&self) -> String {
        match self.prefix.as_deref() {
            None => String::new(),
            Some(prefix) => {
                let trimmed = prefix.trim_end_matches('/');
                if trimmed.is_empty() {
                    String::new()
                } else {
                    format!("{trimmed}/")
                }
            }
        }
    }
}
