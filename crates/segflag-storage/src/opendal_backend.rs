use opendal::layers::BlockingLayer;
use opendal::{BlockingOperator, Operator};

use segflag_types::error::{Result, SegflagError};

use crate::runtime::ASYNC_RUNTIME;
use crate::StorageBackend;

/// Remote object store accessed through opendal's blocking operator.
///
/// Covers the S3 and GCS buckets where review deployments keep their master
/// CSV, imagery, and per-user blobs.
pub struct OpendalBackend {
    op: BlockingOperator,
}

impl OpendalBackend {
    /// Create a backend for an S3 (or S3-compatible) bucket.
    pub fn s3(
        bucket: &str,
        region: &str,
        root: &str,
        endpoint: Option<&str>,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
    ) -> Result<Self> {
        let mut builder = opendal::services::S3::default()
            .bucket(bucket)
            .region(region)
            .root(root);
        if let Some(ep) = endpoint {
            builder = builder.endpoint(ep);
        }
        if let Some(key_id) = access_key_id {
            builder = builder.access_key_id(key_id);
        }
        if let Some(secret) = secret_access_key {
            builder = builder.secret_access_key(secret);
        }
        let op = Operator::new(builder)
            .map_err(|e| SegflagError::Config(format!("s3 init: {e}")))?
            .finish();
        Self::finish_blocking(op)
    }

    /// Create a backend for a Google Cloud Storage bucket, optionally with an
    /// explicit service-account credential file.
    pub fn gcs(bucket: &str, root: &str, credential_path: Option<&str>) -> Result<Self> {
        let mut builder = opendal::services::Gcs::default().bucket(bucket).root(root);
        if let Some(path) = credential_path {
            builder = builder.credential_path(path);
        }
        let op = Operator::new(builder)
            .map_err(|e| SegflagError::Config(format!("gcs init: {e}")))?
            .finish();
        Self::finish_blocking(op)
    }

    /// Wrap an async operator in the blocking bridge. The layer captures a
    /// handle to our runtime, so it must be created inside its context.
    fn finish_blocking(op: Operator) -> Result<Self> {
        let _guard = ASYNC_RUNTIME.enter();
        let layer = BlockingLayer::create()
            .map_err(|e| SegflagError::Config(format!("blocking layer init: {e}")))?;
        Ok(Self {
            op: op.layer(layer).blocking(),
        })
    }
}

impl StorageBackend for OpendalBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.op.read(key) {
            Ok(buf) => Ok(Some(buf.to_vec())),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SegflagError::from(e)),
        }
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.op
            .write(key, data.to_vec())
            .map_err(SegflagError::from)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.op.delete(key).map_err(SegflagError::from)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        match self.op.stat(key) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SegflagError::from(e)),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.op.list(prefix).map_err(SegflagError::from)?;
        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.path().to_string();
            // Skip directory markers
            if !path.ends_with('/') {
                keys.push(path);
            }
        }
        Ok(keys)
    }
}
