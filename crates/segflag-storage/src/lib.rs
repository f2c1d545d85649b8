mod local_backend;
mod opendal_backend;
pub mod retry;
mod runtime;

pub use local_backend::LocalBackend;
pub use opendal_backend::OpendalBackend;
pub use retry::RetryingBackend;

use serde::{Deserialize, Serialize};

use segflag_types::error::{Result, SegflagError};

/// Durable key→bytes object storage.
///
/// The contract is deliberately small: overwrite-on-put, no transactions, no
/// compare-and-swap. A missing key reads as `None`, never as an error, since
/// "no blob yet" is a normal state for per-user data.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, data: &[u8]) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    fn exists(&self, key: &str) -> Result<bool>;
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Retry settings for remote backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_retry_max_delay_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

/// Connection settings for the object store, resolved from configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Store URL: bare path, `file://`, `s3://bucket/prefix`, or
    /// `gs://bucket/prefix`.
    pub url: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Path to a service-account JSON file, for GCS buckets.
    #[serde(default)]
    pub credential_path: Option<String>,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Build a storage backend from the configuration, dispatching on URL scheme.
pub fn backend_from_config(cfg: &StorageConfig) -> Result<Box<dyn StorageBackend>> {
    if let Some(rest) = cfg.url.strip_prefix("s3://") {
        let (bucket, root) = split_bucket_url(rest);
        let region = cfg.region.as_deref().unwrap_or("us-east-1");
        let backend = OpendalBackend::s3(
            bucket,
            region,
            root,
            cfg.endpoint.as_deref(),
            cfg.access_key_id.as_deref(),
            cfg.secret_access_key.as_deref(),
        )?;
        Ok(Box::new(RetryingBackend::new(
            Box::new(backend),
            cfg.retry.clone(),
        )))
    } else if let Some(rest) = cfg.url.strip_prefix("gs://") {
        let (bucket, root) = split_bucket_url(rest);
        let backend = OpendalBackend::gcs(bucket, root, cfg.credential_path.as_deref())?;
        Ok(Box::new(RetryingBackend::new(
            Box::new(backend),
            cfg.retry.clone(),
        )))
    } else {
        let path = cfg.url.strip_prefix("file://").unwrap_or(&cfg.url);
        if path.is_empty() {
            return Err(SegflagError::Config("storage url is empty".to_string()));
        }
        Ok(Box::new(LocalBackend::new(path)?))
    }
}

/// Split `bucket/some/prefix` into the bucket name and a `/`-rooted prefix.
fn split_bucket_url(rest: &str) -> (&str, &str) {
    match rest.split_once('/') {
        Some((bucket, root)) => (bucket, root),
        None => (rest, "/"),
    }
}
