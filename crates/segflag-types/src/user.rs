use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegflagError};

/// A reviewer identity. Users are drawn from a fixed [`Roster`] and selected
/// at login; they are never created or destroyed at runtime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(String);

impl User {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed, configured set of reviewer names.
///
/// Resolving a name not on the roster is a contract violation fatal to that
/// one operation, not to the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    names: BTreeSet<String>,
}

impl Roster {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().map(|n| n.trim().to_string()).collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<User> {
        let name = name.trim();
        if self.names.contains(name) {
            Ok(User(name.to_string()))
        } else {
            Err(SegflagError::UnknownUser(name.to_string()))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name.trim())
    }

    /// All reviewers, in sorted order.
    pub fn users(&self) -> impl Iterator<Item = User> + '_ {
        self.names.iter().map(|n| User(n.clone()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
