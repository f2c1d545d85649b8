use std::collections::BTreeMap;
use std::mem;

use tracing::debug;

use segflag_storage::StorageBackend;
use segflag_types::error::Result;
use segflag_types::item_id::ItemId;
use segflag_types::user::User;

use super::aggregate::AggregateCache;
use super::{load_flags, save_flags};

/// Unsaved checkbox toggles for one user's interactive session.
///
/// Staging the same item repeatedly keeps only the latest desired state; no
/// toggle history is kept.
#[derive(Debug, Default)]
pub struct PendingUpdates {
    staged: BTreeMap<ItemId, bool>,
}

impl PendingUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the desired flagged state for an item. Last write wins.
    pub fn stage(&mut self, item: ItemId, flagged: bool) {
        self.staged.insert(item, flagged);
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    fn drain(&mut self) -> BTreeMap<ItemId, bool> {
        mem::take(&mut self.staged)
    }
}

/// Reconcile staged toggles against the user's authoritative flag set and
/// persist the result. Returns whether anything changed.
///
/// The buffer is drained before the save is attempted: a failed save leaves
/// the buffer empty and surfaces the error, so the caller can tell the user
/// their edit may need to be redone rather than silently retrying stale
/// state. The aggregation cache is bumped exactly once per mutating save and
/// never for a no-op flush.
///
/// Flush is the only writer path for a user's flags and must not run
/// concurrently for the same user; callers serialize it per session.
pub fn flush(
    storage: &dyn StorageBackend,
    user: &User,
    pending: &mut PendingUpdates,
    cache: &mut AggregateCache,
) -> Result<bool> {
    let staged = pending.drain();
    if staged.is_empty() {
        return Ok(false);
    }

    // The blob, not any session cache, is the source of truth reconciled
    // against.
    let mut set = load_flags(storage, user)?;

    let mut changed = false;
    for (item, flagged) in staged {
        changed |= if flagged {
            set.insert(item)
        } else {
            set.remove(&item)
        };
    }

    if !changed {
        debug!(user = %user, "flush staged no effective change");
        return Ok(false);
    }

    save_flags(storage, user, &set)?;
    cache.bump();
    Ok(true)
}
