use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use segflag_storage::StorageBackend;
use segflag_types::error::{Result, SegflagError};
use segflag_types::user::{Roster, User};

/// In-memory storage backend for testing. Thread-safe via Mutex.
pub struct MemoryBackend {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self.data.lock().unwrap();
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let mut map = self.data.lock().unwrap();
        map.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut map = self.data.lock().unwrap();
        map.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let map = self.data.lock().unwrap();
        Ok(map.contains_key(key))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let map = self.data.lock().unwrap();
        Ok(map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Backend whose writes can be switched to fail with a transient error,
/// for exercising the flush failure path.
pub struct FailingPutBackend {
    inner: MemoryBackend,
    fail_puts: AtomicBool,
}

impl FailingPutBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            fail_puts: AtomicBool::new(false),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }
}

impl StorageBackend for FailingPutBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(SegflagError::Unavailable("injected put failure".into()));
        }
        self.inner.put(key, data)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix)
    }
}

/// Roster shared by most tests.
pub fn test_roster() -> Roster {
    Roster::new(["Ellen", "Paul", "Cathy"].map(String::from))
}

pub fn user(roster: &Roster, name: &str) -> User {
    roster.resolve(name).unwrap()
}

/// A small master CSV with the columns the core consumes plus passthrough
/// metadata, including a quoted field.
pub fn sample_catalog_csv() -> &'static str {
    "imgName,normalizedPath,maskPath,maskPath_old,imgQuality,notes\n\
     x123.png,images/x123.png,masks/x123.png,masks_old/x123.png,good,\"clear, well lit\"\n\
     y456.png,images/y456.png,masks/y456.png,masks_old/y456.png,poor,\n\
     z789.png,images/z789.png,masks/z789.png,masks_old/z789.png,good,review me\n"
}
