//! Construction of `object_store` clients for destination buckets.

use object_store::ObjectStore;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Errors raised while building an object store client.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid bucket URL: {source}")]
    ParseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("Object store operation failed with error: {source}")]
    ObjectStore {
        #[source]
        source: object_store::Error,
    },
}

/// Builds a store rooted at `s3://<bucket>` with the provided client
/// options (region, endpoint, credentials and the like).
pub fn build_store(
    bucket: &str,
    options: &HashMap<String, String>,
) -> Result<Arc<dyn ObjectStore>, Error> {
    let url =
        Url::parse(&format!("s3://{bucket}")).map_err(|source| Error::ParseUrl { source })?;

    let (store, _root) = object_store::parse_url_opts(
        &url,
        options.iter().map(|(key, value)| (key.as_str(), value.clone())),
    )
    .map_err(|source| Error::ObjectStore { source })?;

    Ok(Arc::from(store))
}
