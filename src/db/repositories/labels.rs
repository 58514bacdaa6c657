use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::params;

use crate::db::{helpers::format_datetime, models::KnownLabel, Database};

impl Database {
    /// Labels already present in the registry, used to seed the sink's cache.
    pub fn load_known_labels(&self) -> Result<HashSet<String>> {
        self.execute_blocking(|conn| {
            let mut stmt = conn.prepare("SELECT label FROM known_labels")?;
            let labels = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<HashSet<_>, _>>()?;
            Ok(labels)
        })
    }

    /// Record a label the first time it is seen. Returns true if it was new.
    pub fn record_label(&self, label: &str) -> Result<bool> {
        let label = label.to_string();
        let first_seen = format_datetime(&Local::now());
        self.execute_blocking(move |conn| {
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO known_labels (label, first_seen) VALUES (?1, ?2)",
                    params![label, first_seen],
                )
                .context("failed to record known label")?;
            Ok(inserted > 0)
        })
    }

    /// Registry contents in first-seen order.
    pub async fn known_labels(&self) -> Result<Vec<KnownLabel>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT label, first_seen FROM known_labels ORDER BY first_seen ASC, rowid ASC",
            )?;
            let labels = stmt
                .query_map([], |row| {
                    Ok(KnownLabel {
                        label: row.get(0)?,
                        first_seen: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(labels)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn labels_are_recorded_once() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("log.sqlite3")).unwrap();

        assert!(db.record_label("Editor").unwrap());
        assert!(!db.record_label("Editor").unwrap());
        assert!(db.record_label("Browser").unwrap());

        let loaded = db.load_known_labels().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains("Editor"));

        let listed: Vec<String> = db
            .known_labels()
            .await
            .unwrap()
            .into_iter()
            .map(|known| known.label)
            .collect();
        assert_eq!(listed, vec!["Editor", "Browser"]);
    }
}
