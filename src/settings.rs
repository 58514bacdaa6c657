use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Persistence for the ordered tag list.
pub trait TagStore: Send + Sync {
    /// Stored tags in order. An empty list means "nothing stored yet".
    fn load(&self) -> Result<Vec<String>>;
    fn save(&self, tags: &[String]) -> Result<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    tags: Vec<String>,
}

/// `settings.json` in the data directory.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read(&self) -> Result<UserSettings> {
        if !self.path.exists() {
            return Ok(UserSettings::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

impl TagStore for SettingsStore {
    fn load(&self) -> Result<Vec<String>> {
        Ok(self.read()?.tags)
    }

    fn save(&self, tags: &[String]) -> Result<()> {
        // Keep whatever else lives in the file; fall back to a fresh document
        // when the existing one is unreadable.
        let mut data = self.read().unwrap_or_default();
        data.tags = tags.to_vec();
        self.persist(&data)
    }
}
