use std::time::Duration;

use segflag_types::error::{Result, SegflagError};

use crate::{RetryConfig, StorageBackend};

/// Whether a storage failure is transient and worth re-issuing the
/// operation for.
pub fn is_retryable(err: &SegflagError) -> bool {
    match err {
        SegflagError::Unavailable(_) => true,
        SegflagError::Storage(e) => e.is_temporary(),
        SegflagError::Io(e) => is_retryable_io(e),
        _ => false,
    }
}

/// Whether an I/O error is transient and worth retrying.
pub fn is_retryable_io(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted
    )
}

/// Retry a storage operation on transient failures with exponential backoff
/// plus jitter. The unit of work (one load, one save, one fetch) is short
/// lived and re-issued wholesale, never resumed.
pub fn retry_storage<T>(
    config: &RetryConfig,
    op_name: &str,
    f: impl Fn() -> Result<T>,
) -> Result<T> {
    let mut delay_ms = config.retry_delay_ms;
    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let jitter = rand::random::<u64>() % delay_ms.max(1);
            std::thread::sleep(Duration::from_millis(delay_ms + jitter));
            delay_ms = (delay_ms * 2).min(config.retry_max_delay_ms);
        }
        match f() {
            Ok(val) => return Ok(val),
            Err(e) if is_retryable(&e) && attempt < config.max_retries => {
                tracing::warn!(
                    "{op_name}: transient storage error (attempt {}/{}), retrying: {e}",
                    attempt + 1,
                    config.max_retries,
                );
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap())
}

/// Backend wrapper that re-issues each operation through [`retry_storage`].
///
/// Applied to remote backends only; local filesystem failures are not
/// transient in the same sense.
pub struct RetryingBackend {
    inner: Box<dyn StorageBackend>,
    config: RetryConfig,
}

impl RetryingBackend {
    pub fn new(inner: Box<dyn StorageBackend>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

impl StorageBackend for RetryingBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        retry_storage(&self.config, "get", || self.inner.get(key))
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        retry_storage(&self.config, "put", || self.inner.put(key, data))
    }

    fn delete(&self, key: &str) -> Result<()> {
        retry_storage(&self.config, "delete", || self.inner.delete(key))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        retry_storage(&self.config, "exists", || self.inner.exists(key))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        retry_storage(&self.config, "list", || self.inner.list(prefix))
    }
}
