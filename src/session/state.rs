use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::db::WorkStatus;

use super::error::RejectionReason;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    #[default]
    Inactive,
    Tracking,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Inactive => "Inactive",
            SessionMode::Tracking => "Tracking",
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self, SessionMode::Tracking)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seconds spent per bucket for display.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionTimers {
    pub active_seconds: f64,
    /// The pacing bucket is gone; pacing is now a tag. Always zero.
    pub legacy_pacing_seconds: f64,
}

/// What the window watcher is allowed to see of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub mode: SessionMode,
    pub tag: Option<String>,
    pub note: String,
    /// Set just before tracking ends so the final segment carries it.
    pub work_status: Option<WorkStatus>,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub mode: SessionMode,
    pub tag: Option<String>,
    pub note: String,
    /// Wall-clock start of the current mode period.
    pub last_transition_at: DateTime<Local>,
    /// Monotonic twin of `last_transition_at`, used for elapsed time.
    period_anchor: Instant,
    /// Time spent tracking in earlier, closed periods.
    accumulated: Duration,
}

impl SessionState {
    pub fn new(now: DateTime<Local>, anchor: Instant) -> Self {
        Self {
            mode: SessionMode::Inactive,
            tag: None,
            note: String::new(),
            last_transition_at: now,
            period_anchor: anchor,
            accumulated: Duration::ZERO,
        }
    }

    pub fn tracking_ready(&self) -> Result<(), RejectionReason> {
        if self.tag.as_deref().map_or(true, str::is_empty) {
            return Err(RejectionReason::NoTagSelected);
        }
        if self.note.trim().is_empty() {
            return Err(RejectionReason::NoNoteEntered);
        }
        Ok(())
    }

    /// Close the current period and open a new one in `mode`. Returns the
    /// length of the period that just ended.
    pub fn transition(&mut self, mode: SessionMode, now: DateTime<Local>, at: Instant) -> Duration {
        let elapsed = at.saturating_duration_since(self.period_anchor);
        match self.mode {
            SessionMode::Tracking => self.accumulated += elapsed,
            SessionMode::Inactive => {}
        }
        self.mode = mode;
        self.last_transition_at = now;
        self.period_anchor = at;
        elapsed
    }

    pub fn active_at(&self, at: Instant) -> Duration {
        match self.mode {
            SessionMode::Tracking => self.accumulated + at.saturating_duration_since(self.period_anchor),
            SessionMode::Inactive => self.accumulated,
        }
    }

    pub fn timers_at(&self, at: Instant) -> SessionTimers {
        SessionTimers {
            active_seconds: self.active_at(at).as_secs_f64(),
            legacy_pacing_seconds: 0.0,
        }
    }

    pub fn view(&self, work_status: Option<WorkStatus>) -> SessionView {
        SessionView {
            mode: self.mode,
            tag: self.tag.clone(),
            note: self.note.clone(),
            work_status,
        }
    }
}
