use segflag_storage::StorageBackend;
use segflag_types::error::{Result, SegflagError};
use segflag_types::item_id::ItemId;
use segflag_types::user::User;

use crate::catalog::ViewMode;
use crate::config::ReviewConfig;
use crate::flags::aggregate::AggregateCache;
use crate::flags::pending::{self, PendingUpdates};

/// Explicit per-session state: who is reviewing, what they have staged, and
/// which filtered view they are looking at.
///
/// Core operations take this context (or its parts) as arguments; nothing
/// lives in ambient globals. One logical session exists per user, which is
/// what makes blind-overwrite persistence of that user's blobs safe.
#[derive(Debug)]
pub struct SessionContext {
    user: User,
    pending: PendingUpdates,
    pub view: ViewMode,
}

impl SessionContext {
    /// Check the shared reviewer password and start a session for a roster
    /// member. An unknown name and a wrong password are distinct errors so
    /// the login form can report them separately.
    pub fn login(config: &ReviewConfig, name: &str, password: &str) -> Result<Self> {
        let user = config.roster().resolve(name)?;
        if password != config.password {
            return Err(SegflagError::InvalidPassword);
        }
        Ok(Self {
            user,
            pending: PendingUpdates::new(),
            view: ViewMode::All,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Record the desired flag state for an item; the latest toggle wins.
    pub fn stage_flag(&mut self, item: ItemId, flagged: bool) {
        self.pending.stage(item, flagged);
    }

    /// Persist staged toggles for this session's user. See
    /// [`pending::flush`] for the buffer and cache-bust contract.
    pub fn flush(
        &mut self,
        storage: &dyn StorageBackend,
        cache: &mut AggregateCache,
    ) -> Result<bool> {
        pending::flush(storage, &self.user, &mut self.pending, cache)
    }
}
