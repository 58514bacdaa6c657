use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{info, warn};

use crate::settings::TagStore;

/// The built-in tag that can never be removed.
pub const SENTINEL_TAG: &str = "Pacing";

/// Tags offered when nothing usable is stored.
pub const DEFAULT_TAGS: &[&str] = &["Work", "Meeting", SENTINEL_TAG];

/// Ordered, de-duplicated tag list backed by a [`TagStore`].
///
/// Every mutation is written through to the store. Store failures are logged
/// and never undo the in-memory change.
pub struct TagRegistry {
    tags: RwLock<Vec<String>>,
    store: Box<dyn TagStore>,
}

impl TagRegistry {
    pub fn load(store: Box<dyn TagStore>) -> Self {
        let stored = match store.load() {
            Ok(tags) if !tags.is_empty() => tags,
            Ok(_) => {
                info!("No stored tags, using defaults");
                default_tags()
            }
            Err(err) => {
                warn!("Failed to load tags, using defaults: {err:#}");
                default_tags()
            }
        };

        Self {
            tags: RwLock::new(normalize(stored)),
            store,
        }
    }

    pub fn list_tags(&self) -> Vec<String> {
        self.read().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|tag| tag == name)
    }

    pub fn add_tag(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let mut tags = self.write();
        if tags.iter().any(|tag| tag == name) {
            return false;
        }
        tags.push(name.to_string());
        self.persist(&tags);
        info!("Added tag '{name}'");
        true
    }

    pub fn remove_tag(&self, name: &str) -> bool {
        if name == SENTINEL_TAG {
            warn!("Refusing to remove built-in tag '{SENTINEL_TAG}'");
            return false;
        }

        let mut tags = self.write();
        let Some(index) = tags.iter().position(|tag| tag == name) else {
            return false;
        };
        tags.remove(index);
        self.persist(&tags);
        info!("Removed tag '{name}'");
        true
    }

    fn persist(&self, tags: &[String]) {
        if let Err(err) = self.store.save(tags) {
            warn!("Failed to save tags: {err:#}");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<String>> {
        match self.tags.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<String>> {
        match self.tags.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn default_tags() -> Vec<String> {
    DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect()
}

/// Drop blanks and repeats, keep first-seen order, guarantee the sentinel.
fn normalize(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len() + 1);
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|existing| existing == tag) {
            out.push(tag.to_string());
        }
    }
    if !out.iter().any(|tag| tag == SENTINEL_TAG) {
        out.push(SENTINEL_TAG.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::sync::{Arc, Mutex};

    /// In-memory store that records every save and can be told to fail.
    #[derive(Clone, Default)]
    struct FakeStore {
        stored: Arc<Mutex<Option<Vec<String>>>>,
        saves: Arc<Mutex<usize>>,
        fail_load: bool,
        fail_save: bool,
    }

    impl TagStore for FakeStore {
        fn load(&self) -> Result<Vec<String>> {
            if self.fail_load {
                return Err(anyhow!("disk on fire"));
            }
            Ok(self.stored.lock().unwrap().clone().unwrap_or_default())
        }

        fn save(&self, tags: &[String]) -> Result<()> {
            *self.saves.lock().unwrap() += 1;
            if self.fail_save {
                return Err(anyhow!("read-only"));
            }
            *self.stored.lock().unwrap() = Some(tags.to_vec());
            Ok(())
        }
    }

    fn with_tags(tags: &[&str]) -> FakeStore {
        let store = FakeStore::default();
        *store.stored.lock().unwrap() = Some(tags.iter().map(|t| t.to_string()).collect());
        store
    }

    #[test]
    fn empty_store_yields_defaults() {
        let registry = TagRegistry::load(Box::new(FakeStore::default()));
        assert_eq!(registry.list_tags(), default_tags());
    }

    #[test]
    fn load_failure_yields_defaults() {
        let store = FakeStore {
            fail_load: true,
            ..FakeStore::default()
        };
        let registry = TagRegistry::load(Box::new(store));
        assert!(registry.contains(SENTINEL_TAG));
        assert_eq!(registry.list_tags().len(), DEFAULT_TAGS.len());
    }

    #[test]
    fn sentinel_is_appended_when_missing() {
        let registry = TagRegistry::load(Box::new(with_tags(&["Work", "Study", "Work", " "])));
        assert_eq!(registry.list_tags(), vec!["Work", "Study", SENTINEL_TAG]);
    }

    #[test]
    fn add_rejects_blank_and_duplicate() {
        let store = with_tags(&["Work", SENTINEL_TAG]);
        let registry = TagRegistry::load(Box::new(store.clone()));

        assert!(!registry.add_tag("Work"));
        assert!(!registry.add_tag("   "));
        assert_eq!(registry.list_tags().len(), 2);
        assert_eq!(*store.saves.lock().unwrap(), 0);

        assert!(registry.add_tag("Reading"));
        assert_eq!(registry.list_tags(), vec!["Work", SENTINEL_TAG, "Reading"]);
        assert_eq!(
            store.stored.lock().unwrap().clone().unwrap(),
            registry.list_tags()
        );
    }

    #[test]
    fn sentinel_cannot_be_removed() {
        let registry = TagRegistry::load(Box::new(FakeStore::default()));
        assert!(!registry.remove_tag(SENTINEL_TAG));
        assert!(registry.contains(SENTINEL_TAG));
    }

    #[test]
    fn remove_absent_is_false() {
        let registry = TagRegistry::load(Box::new(FakeStore::default()));
        assert!(!registry.remove_tag("Nope"));
    }

    #[test]
    fn remove_persists() {
        let store = with_tags(&["Work", "Meeting", SENTINEL_TAG]);
        let registry = TagRegistry::load(Box::new(store.clone()));

        assert!(registry.remove_tag("Meeting"));
        assert_eq!(
            store.stored.lock().unwrap().clone().unwrap(),
            vec!["Work", SENTINEL_TAG]
        );
    }

    #[test]
    fn save_failure_keeps_mutation() {
        let store = FakeStore {
            fail_save: true,
            ..FakeStore::default()
        };
        let registry = TagRegistry::load(Box::new(store.clone()));

        assert!(registry.add_tag("Focus"));
        assert!(registry.contains("Focus"));
        assert_eq!(*store.saves.lock().unwrap(), 1);
    }

    #[test]
    fn round_trip_through_settings_file() {
        use crate::settings::SettingsStore;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        SettingsStore::new(path.clone())
            .save(&["Deep Work".to_string(), "Admin".to_string()])
            .unwrap();

        let registry = TagRegistry::load(Box::new(SettingsStore::new(path)));
        assert_eq!(registry.list_tags(), vec!["Deep Work", "Admin", SENTINEL_TAG]);
    }
}
