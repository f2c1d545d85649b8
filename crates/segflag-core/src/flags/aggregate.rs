use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use segflag_storage::StorageBackend;
use segflag_types::error::Result;
use segflag_types::item_id::ItemId;
use segflag_types::user::{Roster, User};

use super::{parse_flag_blob, parse_flag_owner, FLAGS_PREFIX};

/// Derived mapping from item identifier to the set of users who flagged it.
/// Always reconstructable from the union of the per-user blobs.
pub type AggregatedFlags = BTreeMap<ItemId, BTreeSet<User>>;

/// Versioned cache over the aggregated flag map.
///
/// `bump()` advances the cache-bust version; `get_or_build()` rebuilds the
/// snapshot only when the version has moved past the one the cached copy was
/// built at. The version is explicit state passed through calls, not hidden
/// process-wide globals.
#[derive(Debug, Default)]
pub struct AggregateCache {
    version: u64,
    built_version: Option<u64>,
    snapshot: AggregatedFlags,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate the cached snapshot. Called by flush after every mutating
    /// save, exactly once.
    pub fn bump(&mut self) {
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Return the aggregated map, rebuilding it first if stale.
    ///
    /// The rebuild is an O(total flagged items) scan over every per-user
    /// blob. Readers may run concurrently with another user's flush and
    /// momentarily miss that user's very latest change; the next bump
    /// self-corrects.
    pub fn get_or_build(
        &mut self,
        storage: &dyn StorageBackend,
        roster: &Roster,
    ) -> Result<&AggregatedFlags> {
        if self.built_version != Some(self.version) {
            self.snapshot = build_aggregate(storage, roster)?;
            self.built_version = Some(self.version);
        }
        Ok(&self.snapshot)
    }
}

/// Scan every per-user blob under `flags/` and union their contents,
/// attributing each identifier to the blob's owning user.
///
/// A malformed or unreadable blob skips only that user's contribution; the
/// rest of the map is still produced.
pub fn build_aggregate(storage: &dyn StorageBackend, roster: &Roster) -> Result<AggregatedFlags> {
    let mut map = AggregatedFlags::new();
    for key in storage.list(FLAGS_PREFIX)? {
        let Some(name) = parse_flag_owner(&key) else {
            continue;
        };
        let Ok(user) = roster.resolve(name) else {
            warn!(key = %key, "flag blob owner is not on the roster, skipping");
            continue;
        };
        let data = match storage.get(&key) {
            Ok(Some(data)) => data,
            Ok(None) => continue, // deleted between list and get
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read flag blob, skipping user");
                continue;
            }
        };
        let set = match parse_flag_blob(&key, &data) {
            Ok(set) => set,
            Err(e) => {
                warn!(key = %key, error = %e, "malformed flag blob, skipping user");
                continue;
            }
        };
        for item in set {
            map.entry(item).or_default().insert(user.clone());
        }
    }
    debug!(items = map.len(), "rebuilt aggregated flag map");
    Ok(map)
}
