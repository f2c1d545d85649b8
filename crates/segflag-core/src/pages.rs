use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use segflag_storage::StorageBackend;
use segflag_types::error::{Result, SegflagError};
use segflag_types::user::User;

pub(crate) const PAGES_PREFIX: &str = "pages/";

/// Storage key for a user's page blob: `pages/<user>.json`.
fn page_blob_key(user: &User) -> String {
    format!("{PAGES_PREFIX}{user}.json")
}

/// Per-user review position, persisted so a reviewer resumes where they
/// left off. Optionally carries an assigned page or inclusive page range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub page_number: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_end: Option<u32>,
    /// RFC3339 time of the last explicit navigation save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size,
            assigned_page: None,
            assigned_start: None,
            assigned_end: None,
            updated_at: None,
        }
    }

    /// Total pages for a view of `view_len` records, never less than 1.
    pub fn total_pages(view_len: usize, page_size: u32) -> u32 {
        let size = page_size.max(1) as usize;
        (view_len.saturating_sub(1) / size + 1) as u32
    }

    /// Clamp the page number into `[1, total_pages]`. Applied whenever the
    /// active filtered view changes size.
    pub fn clamp(&mut self, total_pages: u32) {
        self.page_number = self.page_number.clamp(1, total_pages.max(1));
    }

    /// Index range `[start, end)` of this cursor's page within a view of
    /// `view_len` records.
    pub fn slice_bounds(&self, view_len: usize) -> (usize, usize) {
        let start = (self.page_number.saturating_sub(1) as usize) * self.page_size.max(1) as usize;
        let start = start.min(view_len);
        let end = (start + self.page_size as usize).min(view_len);
        (start, end)
    }
}

/// Load a user's page cursor. A missing blob is a normal state and yields
/// the defaults: page 1 at the configured page size.
pub fn load_page_cursor(
    storage: &dyn StorageBackend,
    user: &User,
    default_page_size: u32,
) -> Result<PageCursor> {
    let key = page_blob_key(user);
    match storage.get(&key)? {
        Some(data) => serde_json::from_slice(&data).map_err(|e| SegflagError::MalformedBlob {
            key,
            reason: e.to_string(),
        }),
        None => Ok(PageCursor::new(default_page_size)),
    }
}

/// Persist the cursor. Called on explicit navigation only, not on every
/// page render, to avoid write amplification from incidental reruns.
pub fn save_page_cursor(
    storage: &dyn StorageBackend,
    user: &User,
    cursor: &PageCursor,
) -> Result<()> {
    let mut stamped = cursor.clone();
    stamped.updated_at = Some(Utc::now().to_rfc3339());
    let data = serde_json::to_vec_pretty(&stamped)?;
    storage.put(&page_blob_key(user), &data)?;
    debug!(user = %user, page = cursor.page_number, "saved page cursor");
    Ok(())
}
