use segflag_storage::StorageBackend;
use segflag_types::error::SegflagError;
use segflag_types::item_id::ItemId;

use crate::flags::aggregate::AggregateCache;
use crate::flags::pending::{flush, PendingUpdates};
use crate::flags::{load_flags, save_flags};
use crate::testutil::{test_roster, user, FailingPutBackend, MemoryBackend};

fn id(name: &str) -> ItemId {
    ItemId::normalize(name)
}

#[test]
fn flush_applies_staged_adds_and_removes() {
    let storage = MemoryBackend::new();
    let roster = test_roster();
    let ellen = user(&roster, "Ellen");
    let mut cache = AggregateCache::new();

    save_flags(&storage, &ellen, &[id("old.png")].into_iter().collect()).unwrap();

    let mut pending = PendingUpdates::new();
    pending.stage(id("new.png"), true);
    pending.stage(id("old.png"), false);

    let changed = flush(&storage, &ellen, &mut pending, &mut cache).unwrap();
    assert!(changed);
    assert!(pending.is_empty());

    let set = load_flags(&storage, &ellen).unwrap();
    assert_eq!(set, [id("new.png")].into_iter().collect());
}

#[test]
fn last_staged_toggle_wins() {
    let storage = MemoryBackend::new();
    let roster = test_roster();
    let ellen = user(&roster, "Ellen");
    let mut cache = AggregateCache::new();

    let mut pending = PendingUpdates::new();
    pending.stage(id("x123.png"), true);
    pending.stage(id("x123.png"), false);
    pending.stage(id("x123.png"), true);
    assert_eq!(pending.len(), 1);

    flush(&storage, &ellen, &mut pending, &mut cache).unwrap();
    assert!(load_flags(&storage, &ellen).unwrap().contains(&id("x123.png")));
}

#[test]
fn mutating_flush_bumps_cache_exactly_once() {
    let storage = MemoryBackend::new();
    let roster = test_roster();
    let ellen = user(&roster, "Ellen");
    let mut cache = AggregateCache::new();

    let mut pending = PendingUpdates::new();
    pending.stage(id("a.png"), true);
    pending.stage(id("b.png"), true);
    flush(&storage, &ellen, &mut pending, &mut cache).unwrap();
    assert_eq!(cache.version(), 1);
}

#[test]
fn flush_is_idempotent() {
    let storage = MemoryBackend::new();
    let roster = test_roster();
    let ellen = user(&roster, "Ellen");
    let mut cache = AggregateCache::new();

    let mut pending = PendingUpdates::new();
    pending.stage(id("x123.png"), true);
    assert!(flush(&storage, &ellen, &mut pending, &mut cache).unwrap());
    let set_after_first = load_flags(&storage, &ellen).unwrap();
    let version_after_first = cache.version();

    // Second flush with nothing newly staged: no change, no version bump.
    assert!(!flush(&storage, &ellen, &mut pending, &mut cache).unwrap());
    assert_eq!(load_flags(&storage, &ellen).unwrap(), set_after_first);
    assert_eq!(cache.version(), version_after_first);
}

#[test]
fn noop_flush_does_not_bump_or_write() {
    let storage = MemoryBackend::new();
    let roster = test_roster();
    let ellen = user(&roster, "Ellen");
    let mut cache = AggregateCache::new();

    save_flags(&storage, &ellen, &[id("x123.png")].into_iter().collect()).unwrap();
    let blob_before = storage.get("flags/Ellen.json").unwrap();

    // Staging the state the blob already has is a no-op.
    let mut pending = PendingUpdates::new();
    pending.stage(id("x123.png"), true);
    pending.stage(id("absent.png"), false);

    let changed = flush(&storage, &ellen, &mut pending, &mut cache).unwrap();
    assert!(!changed);
    assert_eq!(cache.version(), 0);
    assert_eq!(storage.get("flags/Ellen.json").unwrap(), blob_before);
}

#[test]
fn failed_save_still_drains_buffer_and_surfaces_error() {
    let storage = FailingPutBackend::new();
    let roster = test_roster();
    let ellen = user(&roster, "Ellen");
    let mut cache = AggregateCache::new();

    storage.fail_puts(true);
    let mut pending = PendingUpdates::new();
    pending.stage(id("x123.png"), true);

    let err = flush(&storage, &ellen, &mut pending, &mut cache).unwrap_err();
    assert!(matches!(err, SegflagError::Unavailable(_)));
    // Buffer drained even though the save failed; the caller decides whether
    // to prompt the user to redo the edit.
    assert!(pending.is_empty());
    // And the failed flush must not advance the cache version.
    assert_eq!(cache.version(), 0);

    // Nothing was persisted.
    storage.fail_puts(false);
    assert!(load_flags(&storage, &ellen).unwrap().is_empty());
}
