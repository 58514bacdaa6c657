use chrono::{DateTime, Local};

use super::source::WindowSample;

/// A trackable window span that has ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSpan {
    pub label: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl ClosedSpan {
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

#[derive(Debug, Clone)]
struct OpenSpan {
    label: String,
    since: DateTime<Local>,
}

/// Turns a stream of window samples into closed spans.
///
/// A span is only known to be over when a different sample arrives (or the
/// tracker is finished), so output always lags one sample behind the switch.
#[derive(Debug, Default)]
pub struct SegmentTracker {
    current: Option<WindowSample>,
    open: Option<OpenSpan>,
}

impl SegmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&WindowSample> {
        self.current.as_ref()
    }

    /// Feed one sample. Returns the span it closed, if any.
    pub fn observe(&mut self, sample: WindowSample, now: DateTime<Local>) -> Option<ClosedSpan> {
        if sample == WindowSample::OwnUi || self.current.as_ref() == Some(&sample) {
            return None;
        }

        let closed = self.open.take().map(|open| close(open, now));
        if let Some(label) = sample.label() {
            self.open = Some(OpenSpan {
                label: label.to_string(),
                since: now,
            });
        }
        self.current = Some(sample);
        closed
    }

    /// Close out whatever is in progress and reset.
    pub fn finish(&mut self, now: DateTime<Local>) -> Option<ClosedSpan> {
        self.current = None;
        self.open.take().map(|open| close(open, now))
    }
}

fn close(open: OpenSpan, now: DateTime<Local>) -> ClosedSpan {
    ClosedSpan {
        label: open.label,
        start: open.since,
        end: now.max(open.since),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn window(label: &str) -> WindowSample {
        WindowSample::Trackable(label.into())
    }

    #[test]
    fn first_sample_emits_nothing() {
        let mut tracker = SegmentTracker::new();
        assert_eq!(tracker.observe(window("Editor"), t(0)), None);
        assert_eq!(tracker.current(), Some(&window("Editor")));
    }

    #[test]
    fn title_change_closes_previous_span() {
        let mut tracker = SegmentTracker::new();
        tracker.observe(window("Editor"), t(0));
        assert_eq!(tracker.observe(window("Editor"), t(1)), None);

        let closed = tracker.observe(window("Browser"), t(5)).unwrap();
        assert_eq!(closed.label, "Editor");
        assert_eq!(closed.start, t(0));
        assert_eq!(closed.end, t(5));

        let last = tracker.finish(t(9)).unwrap();
        assert_eq!(last.label, "Browser");
        assert_eq!(last.duration(), Duration::seconds(4));
    }

    #[test]
    fn own_ui_is_transparent() {
        let mut tracker = SegmentTracker::new();
        tracker.observe(window("Editor"), t(0));

        assert_eq!(tracker.observe(WindowSample::OwnUi, t(2)), None);
        assert_eq!(tracker.observe(WindowSample::OwnUi, t(3)), None);
        // Returning to the same window does not split the span.
        assert_eq!(tracker.observe(window("Editor"), t(4)), None);

        let closed = tracker.finish(t(6)).unwrap();
        assert_eq!(closed.start, t(0));
        assert_eq!(closed.end, t(6));
    }

    #[test]
    fn own_ui_at_start_leaves_tracker_empty() {
        let mut tracker = SegmentTracker::new();
        tracker.observe(WindowSample::OwnUi, t(0));
        assert_eq!(tracker.current(), None);
        assert_eq!(tracker.finish(t(1)), None);
    }

    #[test]
    fn untrackable_samples_end_spans_without_emitting_themselves() {
        let mut tracker = SegmentTracker::new();
        tracker.observe(window("Editor"), t(0));

        let closed = tracker.observe(WindowSample::Unknown, t(3)).unwrap();
        assert_eq!(closed.label, "Editor");

        assert_eq!(tracker.observe(WindowSample::QueryError, t(4)), None);
        assert_eq!(tracker.observe(WindowSample::QueryError, t(5)), None);
        assert_eq!(tracker.observe(window("Terminal"), t(6)), None);

        let closed = tracker.observe(WindowSample::Unknown, t(8)).unwrap();
        assert_eq!(closed.label, "Terminal");
        assert_eq!(closed.start, t(6));
        assert_eq!(tracker.finish(t(9)), None);
    }

    #[test]
    fn finish_is_idempotent() {
        let mut tracker = SegmentTracker::new();
        tracker.observe(window("Editor"), t(0));
        assert!(tracker.finish(t(1)).is_some());
        assert!(tracker.finish(t(2)).is_none());
    }

    #[test]
    fn backwards_clock_never_inverts_a_span() {
        let mut tracker = SegmentTracker::new();
        tracker.observe(window("Editor"), t(10));
        let closed = tracker.finish(t(5)).unwrap();
        assert!(closed.end >= closed.start);
    }
}
