use std::path::Path;

use serde::{Deserialize, Serialize};

use segflag_storage::StorageConfig;
use segflag_types::error::{Result, SegflagError};
use segflag_types::user::Roster;

/// Top-level configuration for the flagging tool, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewConfig {
    /// Object store holding the master CSV, imagery, and per-user blobs.
    pub storage: StorageConfig,
    /// Storage key of the master catalog CSV.
    pub master_csv_key: String,
    /// Reviewer names allowed to log in. Fixed for the deployment; users are
    /// selected at login, never created at runtime.
    pub reviewers: Vec<String>,
    /// Shared static reviewer password. Authentication strength is not this
    /// tool's concern; the roster is the real identity control.
    pub password: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Opacity used for every mask overlay pass.
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: u8,
}

fn default_page_size() -> u32 {
    50
}

fn default_overlay_alpha() -> u8 {
    crate::overlay::DEFAULT_ALPHA
}

impl ReviewConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: ReviewConfig =
            serde_yaml::from_str(text).map_err(|e| SegflagError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.reviewers.is_empty() {
            return Err(SegflagError::Config(
                "at least one reviewer is required".to_string(),
            ));
        }
        if self.master_csv_key.is_empty() {
            return Err(SegflagError::Config("master_csv_key is empty".to_string()));
        }
        if self.default_page_size == 0 {
            return Err(SegflagError::Config(
                "default_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn roster(&self) -> Roster {
        Roster::new(self.reviewers.iter().cloned())
    }
}
