//! Flow directory backed by configuration files on disk.
//!
//! Flow definitions are YAML or JSON documents discovered through a glob
//! pattern and loaded once at startup. Lookups then serve from memory, so
//! a definition is stable for the duration of a run.

use crate::config::FlowFile;
use config::Config;
use flowpull_core::flow::FlowDefinition;
use std::collections::HashMap;
use tracing::info;

/// Errors that can occur while discovering flow definition files.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input/output operation failed.
    #[error("IO operation failed on path {path}: {source}")]
    IO {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// File system error occurred while globbing flow configuration files.
    #[error("Failed to glob flow configuration files: {source}")]
    Glob {
        #[source]
        source: glob::GlobError,
    },
    /// Invalid glob pattern provided for flow discovery.
    #[error("Invalid glob pattern: {source}")]
    Pattern {
        #[source]
        source: glob::PatternError,
    },
    /// Configuration parsing or deserialization error.
    #[error("Failed to parse flow definition: {source}")]
    Config {
        #[source]
        source: config::ConfigError,
    },
}

/// In-memory directory of flow definitions discovered from disk.
#[derive(Debug)]
pub struct ConfigFlowDirectory {
    flows: HashMap<String, FlowDefinition>,
}

impl ConfigFlowDirectory {
    /// Discovers and parses every flow definition matching the pattern.
    pub fn discover(pattern: &str) -> Result<Self, Error> {
        let mut flows = HashMap::new();

        for path in glob::glob(pattern).map_err(|source| Error::Pattern { source })? {
            let path = path.map_err(|source| Error::Glob { source })?;
            info!("Loading flow: {:?}", path);
            let contents = std::fs::read_to_string(&path).map_err(|source| Error::IO {
                path: path.clone(),
                source,
            })?;

            // Determine file format from extension.
            let file_format = match path.extension().and_then(|s| s.to_str()) {
                Some("yaml") | Some("yml") => config::FileFormat::Yaml,
                Some("json") => config::FileFormat::Json,
                _ => config::FileFormat::Json,
            };

            let config = Config::builder()
                .add_source(config::File::from_str(&contents, file_format))
                .build()
                .map_err(|source| Error::Config { source })?;
            let file = config
                .try_deserialize::<FlowFile>()
                .map_err(|source| Error::Config { source })?;

            flows.insert(file.flow.id.clone(), file.flow);
        }

        Ok(Self { flows })
    }

    /// Identifiers of all discovered flows, in stable order.
    pub fn flow_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.flows.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

#[async_trait::async_trait]
impl flowpull_core::directory::FlowDirectory for ConfigFlowDirectory {
    async fn get(
        &self,
        flow_id: &str,
    ) -> Result<Option<FlowDefinition>, flowpull_core::directory::Error> {
        Ok(self.flows.get(flow_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowpull_core::directory::FlowDirectory;
    use std::io::Write;

    const FLOW_YAML: &str = r#"
flow:
  id: f1
  source_config:
    type: sftp
    host: files.example.com
    username: ingest
  target_config:
    type: object_store
    bucket: landing
    prefix: in
"#;

    const FLOW_JSON: &str = r#"{
  "flow": {
    "id": "f2",
    "source_config": {
      "type": "sftp",
      "host": "other.example.com",
      "username": "ingest"
    },
    "target_config": {
      "type": "object_store",
      "bucket": "archive"
    }
  }
}"#;

    #[tokio::test]
    async fn test_discover_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut yaml = std::fs::File::create(dir.path().join("f1.yaml")).unwrap();
        yaml.write_all(FLOW_YAML.as_bytes()).unwrap();
        let mut json = std::fs::File::create(dir.path().join("f2.json")).unwrap();
        json.write_all(FLOW_JSON.as_bytes()).unwrap();

        let pattern = format!("{}/*", dir.path().display());
        let directory = ConfigFlowDirectory::discover(&pattern).unwrap();

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.flow_ids(), vec!["f1", "f2"]);

        let flow = directory.get("f1").await.unwrap().unwrap();
        let (source, target) = flow.transfer_configs().unwrap();
        assert_eq!(source.host, "files.example.com");
        assert_eq!(target.bucket, "landing");

        assert!(directory.get("absent").await.unwrap().is_none());
    }

    #[test]
    fn test_discover_empty_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.yaml", dir.path().display());
        let directory = ConfigFlowDirectory::discover(&pattern).unwrap();
        assert!(directory.is_empty());
    }

    #[test]
    fn test_discover_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "flow:\n  name: no-id\n").unwrap();

        let pattern = format!("{}/*.yaml", dir.path().display());
        let result = ConfigFlowDirectory::discover(&pattern);
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
    }
}
