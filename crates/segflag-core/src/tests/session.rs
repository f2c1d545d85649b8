use segflag_types::error::SegflagError;
use segflag_types::item_id::ItemId;

use crate::catalog::ViewMode;
use crate::config::ReviewConfig;
use crate::flags::aggregate::AggregateCache;
use crate::flags::load_flags;
use crate::session::SessionContext;
use crate::testutil::MemoryBackend;

fn config() -> ReviewConfig {
    ReviewConfig::from_yaml_str(
        r#"
storage:
  url: /tmp/segflag-test
master_csv_key: masters/master.csv
reviewers: [Ellen, Paul]
password: shared-secret
"#,
    )
    .unwrap()
}

#[test]
fn login_with_correct_password() {
    let session = SessionContext::login(&config(), "Ellen", "shared-secret").unwrap();
    assert_eq!(session.user().as_str(), "Ellen");
    assert_eq!(session.view, ViewMode::All);
    assert!(!session.has_pending());
}

#[test]
fn login_rejects_wrong_password() {
    let err = SessionContext::login(&config(), "Ellen", "nope").unwrap_err();
    assert!(matches!(err, SegflagError::InvalidPassword));
}

#[test]
fn login_rejects_unknown_user() {
    let err = SessionContext::login(&config(), "Mallory", "shared-secret").unwrap_err();
    assert!(matches!(err, SegflagError::UnknownUser(_)));
}

#[test]
fn stage_and_flush_through_the_session() {
    let storage = MemoryBackend::new();
    let mut cache = AggregateCache::new();
    let mut session = SessionContext::login(&config(), "Ellen", "shared-secret").unwrap();

    session.stage_flag(ItemId::normalize("x123.png"), true);
    assert!(session.has_pending());
    assert_eq!(session.pending_len(), 1);

    let changed = session.flush(&storage, &mut cache).unwrap();
    assert!(changed);
    assert!(!session.has_pending());

    let set = load_flags(&storage, session.user()).unwrap();
    assert!(set.contains(&ItemId::normalize("x123.png")));
}
