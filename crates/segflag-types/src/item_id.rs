use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Normalized identifier naming one catalog record's imagery.
///
/// Raw values arrive from CSV columns, blob contents, and UI callbacks with
/// inconsistent spellings: directory prefixes, stray whitespace. Every entry
/// point normalizes before any set or map operation, so two spellings of the
/// same item can never produce duplicate entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Reduce a raw path or name to its trimmed basename.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
        ItemId(base.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Deserialization renormalizes so identifiers read from a legacy or
// hand-edited blob are safe to use directly.
impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ItemId::normalize(&raw))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_directory_prefix() {
        assert_eq!(ItemId::normalize("masks/2024/x123.png").as_str(), "x123.png");
        assert_eq!(ItemId::normalize("x123.png").as_str(), "x123.png");
    }

    #[test]
    fn normalize_trims_whitespace() {
        assert_eq!(ItemId::normalize("  x123.png \n").as_str(), "x123.png");
    }

    #[test]
    fn normalize_handles_backslash_paths() {
        assert_eq!(ItemId::normalize("masks\\x123.png").as_str(), "x123.png");
    }

    #[test]
    fn path_variants_collapse_to_one_key() {
        let a = ItemId::normalize("imgs/x123.png");
        let b = ItemId::normalize(" x123.png");
        let c = ItemId::normalize("x123.png");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn deserialization_renormalizes() {
        let id: ItemId = serde_json::from_str("\"  legacy/dir/x9.png\"").unwrap();
        assert_eq!(id.as_str(), "x9.png");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ItemId::normalize("x123.png");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"x123.png\"");
    }
}
