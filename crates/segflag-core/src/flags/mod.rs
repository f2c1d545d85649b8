pub mod aggregate;
pub mod pending;

use std::collections::BTreeSet;

use tracing::debug;

use segflag_storage::StorageBackend;
use segflag_types::error::{Result, SegflagError};
use segflag_types::item_id::ItemId;
use segflag_types::user::User;

pub(crate) const FLAGS_PREFIX: &str = "flags/";

/// Storage key for a user's flag blob: `flags/<user>.json`.
pub(crate) fn flag_blob_key(user: &User) -> String {
    format!("{FLAGS_PREFIX}{user}.json")
}

/// Extract the owning user name from a flag blob key, if it matches.
pub(crate) fn parse_flag_owner(key: &str) -> Option<&str> {
    key.strip_prefix(FLAGS_PREFIX)
        .and_then(|s| s.strip_suffix(".json"))
}

/// Load a user's flag set from their blob.
///
/// A missing blob is a normal state and reads as an empty set. Identifiers
/// are renormalized on load, so a blob written by hand or by an older build
/// is safe to use directly.
pub fn load_flags(storage: &dyn StorageBackend, user: &User) -> Result<BTreeSet<ItemId>> {
    let key = flag_blob_key(user);
    match storage.get(&key)? {
        Some(data) => parse_flag_blob(&key, &data),
        None => Ok(BTreeSet::new()),
    }
}

/// Persist a user's flag set as a sorted JSON array of identifiers.
///
/// Blind overwrite: the owning user's flush is the only writer for this key,
/// so no compare-and-swap is needed. Sorting makes the output deterministic
/// and diff-friendly.
pub fn save_flags(storage: &dyn StorageBackend, user: &User, set: &BTreeSet<ItemId>) -> Result<()> {
    // BTreeSet iterates in sorted order already.
    let ids: Vec<&str> = set.iter().map(ItemId::as_str).collect();
    let data = serde_json::to_vec_pretty(&ids)?;
    storage.put(&flag_blob_key(user), &data)?;
    debug!(user = %user, count = set.len(), "saved flag set");
    Ok(())
}

pub(crate) fn parse_flag_blob(key: &str, data: &[u8]) -> Result<BTreeSet<ItemId>> {
    let ids: Vec<ItemId> =
        serde_json::from_slice(data).map_err(|e| SegflagError::MalformedBlob {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    Ok(ids.into_iter().filter(|id| !id.is_empty()).collect())
}
