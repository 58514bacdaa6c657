use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Why tracking ended, as chosen in the end-of-work prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum WorkStatus {
    Finished,
    Break { reason: String },
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Finished => "finished",
            WorkStatus::Break { .. } => "break",
        }
    }

    pub fn break_reason(&self) -> Option<&str> {
        match self {
            WorkStatus::Finished => None,
            WorkStatus::Break { reason } => Some(reason.as_str()),
        }
    }
}

/// A closed span of time attributed to one foreground window title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowSegment {
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub label: String,
    pub tag: Option<String>,
    pub note: String,
    pub work_status: Option<WorkStatus>,
}

impl WindowSegment {
    /// Whole seconds covered by the segment, floored at zero when the clock
    /// went backwards between start and end.
    pub fn duration_secs(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds().max(0)
    }

    pub fn break_reason(&self) -> Option<&str> {
        self.work_status.as_ref().and_then(WorkStatus::break_reason)
    }
}

/// A row read back from the window log, in log column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggedSegment {
    pub datetime_start: String,
    pub datetime_end: String,
    pub duration_seconds: i64,
    pub window_title: String,
    pub tag: String,
    pub note: String,
    pub work_status: Option<String>,
    pub break_reason: Option<String>,
}
