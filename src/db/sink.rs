//! Receivers for finished window segments.
//!
//! The watcher hands every closed segment to a [`SegmentSink`] from the
//! blocking pool, so implementations may block until the write is durable.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use anyhow::Result;
use log::{debug, info};

use super::{
    models::{is_registrable, WindowSegment},
    Database,
};

pub trait SegmentSink: Send + Sync {
    /// Persist one finished segment. Must not return before the segment is
    /// durable.
    fn append(&self, segment: &WindowSegment) -> Result<()>;
}

/// The SQLite-backed window log plus its first-seen label registry.
pub struct SegmentLog {
    db: Database,
    known: Mutex<HashSet<String>>,
}

impl SegmentLog {
    pub fn new(db: Database) -> Result<Self> {
        let known = db.load_known_labels()?;
        info!("Loaded {} known window labels", known.len());
        Ok(Self {
            db,
            known: Mutex::new(known),
        })
    }

    fn known(&self) -> MutexGuard<'_, HashSet<String>> {
        match self.known.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SegmentSink for SegmentLog {
    fn append(&self, segment: &WindowSegment) -> Result<()> {
        self.db.insert_segment(segment)?;
        info!(
            "Logged {}s in '{}' (tag: {})",
            segment.duration_secs(),
            segment.label,
            segment.tag.as_deref().unwrap_or("-")
        );

        if !is_registrable(&segment.label) || self.known().contains(&segment.label) {
            return Ok(());
        }

        if self.db.record_label(&segment.label)? {
            debug!("First sighting of window '{}'", segment.label);
        }
        self.known().insert(segment.label.clone());
        Ok(())
    }
}

/// Keeps segments in memory. Useful for dry runs and tests.
#[derive(Default)]
pub struct MemorySink {
    segments: Mutex<Vec<WindowSegment>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> Vec<WindowSegment> {
        match self.segments.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SegmentSink for MemorySink {
    fn append(&self, segment: &WindowSegment) -> Result<()> {
        let mut guard = match self.segments.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(segment.clone());
        Ok(())
    }
}
