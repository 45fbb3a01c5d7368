//! Configuration structures for the flowpull application.
//!
//! The main configuration is loaded from the file named by `CONFIG_PATH`;
//! flow definitions are discovered as separate YAML or JSON documents.

use flowpull_core::flow::FlowDefinition;
use flowpull_transfer::TransferOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main application configuration.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct AppConfig {
    /// Flow discovery options.
    pub flows: FlowOptions,
    /// Optional credential resolution configuration.
    #[serde(default)]
    pub secrets: Option<SecretsOptions>,
    /// Optional object store client configuration.
    #[serde(default)]
    pub store: Option<StoreOptions>,
    /// Optional transfer options applied to every run.
    #[serde(default)]
    pub transfer: Option<TransferOptions>,
}

/// Flow loading configuration.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct FlowOptions {
    /// Glob pattern for discovering flow definition files
    /// (e.g. "/etc/flowpull/flows/*.yaml").
    pub path: Option<PathBuf>,
}

/// Credential resolution configuration.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct SecretsOptions {
    /// Path to the JSON file mapping credential references to secrets.
    pub credentials_path: PathBuf,
}

/// Object store client configuration.
#[derive(PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
pub struct StoreOptions {
    /// Client connection options passed through to the object store
    /// backend (region, endpoint, credentials and the like).
    #[serde(default)]
    pub client_options: Option<HashMap<String, String>>,
}

/// Top-level document for an individual flow definition file.
#[derive(PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct FlowFile {
    /// The flow definition.
    pub flow: FlowDefinition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_app_config_minimal() {
        let yaml = r#"
            flows:
              path: "/etc/flowpull/flows/*.yaml"
        "#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.flows.path.is_some());
        assert!(config.secrets.is_none());
        assert!(config.store.is_none());
        assert!(config.transfer.is_none());
    }

    #[test]
    fn test_app_config_full() {
        let yaml = r#"
            flows:
              path: "/flows/*.yaml"
            secrets:
              credentials_path: "/etc/flowpull/credentials.json"
            store:
              client_options:
                aws_region: eu-central-1
            transfer:
              operation_timeout: "45s"
              retry:
                max_attempts: 2
        "#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(
            config.secrets.unwrap().credentials_path,
            PathBuf::from("/etc/flowpull/credentials.json")
        );
        let client_options = config.store.unwrap().client_options.unwrap();
        assert_eq!(
            client_options.get("aws_region"),
            Some(&"eu-central-1".to_string())
        );
        let transfer = config.transfer.unwrap();
        assert_eq!(transfer.operation_timeout, Some(Duration::from_secs(45)));
        assert_eq!(transfer.retry.unwrap().max_attempts, 2);
    }

    #[test]
    fn test_app_config_round_trip() {
        let config = AppConfig {
            flows: FlowOptions {
                path: Some(PathBuf::from("/flows/*.yaml")),
            },
            secrets: None,
            store: Some(StoreOptions {
                client_options: None,
            }),
            transfer: None,
        };

        let serialized = serde_yaml::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_yaml::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_flow_file_document() {
        let yaml = r#"
            flow:
              id: f1
              source_config:
                type: sftp
                host: files.example.com
                username: ingest
                auth_method: private_key
                credential_ref: vault/f1/key
              target_config:
                type: object_store
                bucket: landing
                prefix: in
        "#;
        let file: FlowFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.flow.id, "f1");
        let (source, target) = file.flow.transfer_configs().unwrap();
        assert_eq!(source.credential_ref.as_deref(), Some("vault/f1/key"));
        assert_eq!(target.normalized_prefix(), "in/");
    }
}
