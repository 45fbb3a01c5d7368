//! Object storage writer implementing the flowpull store capability.

use bytes::Bytes;
use object_store::{ObjectStore, PutPayload};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors raised by the writer.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Object store client failed with error: {source}")]
    Client {
        #[source]
        source: super::client::Error,
    },
    #[error("Object store operation failed with error: {source}")]
    ObjectStore {
        #[source]
        source: object_store::Error,
    },
}

/// Uploads payloads to buckets, building and caching one store client per
/// bucket for the writer's lifetime.
pub struct Writer {
    client_options: HashMap<String, String>,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl Writer {
    /// Registers a pre-built store for a bucket. Used to plug in
    /// non-default backends (e.g. an in-memory store in tests).
    pub async fn insert_store(&self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) {
        self.stores.lock().await.insert(bucket.into(), store);
    }

    async fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, Error> {
        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }

        let store = super::client::build_store(bucket, &self.client_options)
            .map_err(|source| Error::Client { source })?;
        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

#[async_trait::async_trait]
impl flowpull_core::store::ObjectStoreWriter for Writer {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
    ) -> Result<(), flowpull_core::store::Error> {
        let result = async {
            let store = self.store_for(bucket).await?;
            let path = object_store::path::Path::from(key);
            let payload = PutPayload::from_bytes(data);
            store
                .put(&path, payload)
                .await
                .map_err(|source| Error::ObjectStore { source })
        }
        .await;

        match result {
            Ok(put_result) => {
                debug!(bucket, key, e_tag = ?put_result.e_tag, "object uploaded");
                Ok(())
            }
            Err(source) => Err(flowpull_core::store::Error::Put {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(source),
            }),
        }
    }
}

/// Builder pattern for constructing Writer instances.
#[derive(Default)]
pub struct WriterBuilder {
    client_options: Option<HashMap<String, String>>,
}

impl WriterBuilder {
    pub fn new() -> WriterBuilder {
        WriterBuilder {
            ..Default::default()
        }
    }

    /// Sets client connection options passed through to the object store
    /// backend.
    pub fn client_options(mut self, options: HashMap<String, String>) -> Self {
        self.client_options = Some(options);
        self
    }

    pub fn build(self) -> Writer {
        Writer {
            client_options: self.client_options.unwrap_or_default(),
            stores: Mutex::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowpull_core::store::ObjectStoreWriter;
    use object_store::memory::InMemory;

    #[tokio::test]
    async fn test_put_round_trip() {
        let writer = WriterBuilder::new().build();
        let memory: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        writer.insert_store("landing", Arc::clone(&memory)).await;

        writer
            .put("landing", "in/a.csv", Bytes::from_static(b"x,y\n1,2\n"))
            .await
            .unwrap();

        let stored = memory
            .get(&object_store::path::Path::from("in/a.csv"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(stored, Bytes::from_static(b"x,y\n1,2\n"));
    }

    #[tokio::test]
    async fn test_store_cached_per_bucket() {
        let writer = WriterBuilder::new().build();
        let memory: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        writer.insert_store("landing", memory).await;

        writer
            .put("landing", "one", Bytes::from_static(b"1"))
            .await
            .unwrap();
        writer
            .put("landing", "two", Bytes::from_static(b"2"))
            .await
            .unwrap();

        assert_eq!(writer.stores.lock().await.len(), 1);
    }
}
