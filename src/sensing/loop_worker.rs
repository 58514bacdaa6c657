use std::sync::Arc;

use chrono::Local;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::db::{SegmentSink, WindowSegment};
use crate::session::SessionView;

use super::controller::WatcherConfig;
use super::source::{classify, QueryError, WindowSample, WindowSource};
use super::tracker::{ClosedSpan, SegmentTracker};

/// Poll the foreground window until cancelled, emitting a segment each time a
/// trackable window loses focus. On cancellation the in-progress span is
/// flushed once. If the session is seen to have left tracking without a
/// cancellation, the loop exits without emitting anything more.
pub async fn watch_loop(
    source: Arc<dyn WindowSource>,
    sink: Arc<dyn SegmentSink>,
    config: WatcherConfig,
    view: watch::Receiver<SessionView>,
    cancel_token: CancellationToken,
) {
    let mut tracker = SegmentTracker::new();

    let first = tokio::select! {
        biased;
        _ = cancel_token.cancelled() => return,
        sample = sample_window(&source, &config.own_window_title) => sample,
    };
    info!("Window watcher started on {:?}", first);
    tracker.observe(first, Local::now());

    let mut ticker = time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the initial sample already covered it.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if !view.borrow().mode.is_tracking() {
            warn!("Session is no longer tracking; window watcher exiting without flush");
            return;
        }

        let sample = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            sample = sample_window(&source, &config.own_window_title) => sample,
        };

        if let Some(span) = tracker.observe(sample, Local::now()) {
            emit(&sink, &view, span, false).await;
        }
    }

    match tracker.finish(Local::now()) {
        Some(span) if span.duration() < min_flush(&config) => {
            debug!("Dropping {:?}-long final span for '{}'", span.duration(), span.label);
            report_unlogged_status(&view);
        }
        Some(span) => emit(&sink, &view, span, true).await,
        None => report_unlogged_status(&view),
    }
    info!("Window watcher stopped");
}

/// The end-of-work answer rides on the final segment; say so when there is none.
fn report_unlogged_status(view: &watch::Receiver<SessionView>) {
    if let Some(status) = &view.borrow().work_status {
        match status.break_reason() {
            Some(reason) => info!("No open window segment to record break ({reason}) on"),
            None => info!("No open window segment to record '{}' on", status.as_str()),
        }
    }
}

fn min_flush(config: &WatcherConfig) -> chrono::Duration {
    chrono::Duration::from_std(config.min_flush_duration).unwrap_or(chrono::Duration::zero())
}

async fn sample_window(source: &Arc<dyn WindowSource>, own_title: &str) -> WindowSample {
    let source = Arc::clone(source);
    let result = tokio::task::spawn_blocking(move || source.foreground_title())
        .await
        .unwrap_or_else(|err| Err(QueryError::Worker(err.to_string())));

    if let Err(err) = &result {
        debug!("Foreground window query failed: {err}");
    }
    classify(result, own_title)
}

async fn emit(
    sink: &Arc<dyn SegmentSink>,
    view: &watch::Receiver<SessionView>,
    span: ClosedSpan,
    is_final: bool,
) {
    let segment = {
        let session = view.borrow();
        WindowSegment {
            start_time: span.start,
            end_time: span.end,
            label: span.label,
            tag: session.tag.clone(),
            note: session.note.clone(),
            work_status: if is_final {
                session.work_status.clone()
            } else {
                None
            },
        }
    };

    let sink = Arc::clone(sink);
    let label = segment.label.clone();
    match tokio::task::spawn_blocking(move || sink.append(&segment)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!("Failed to log segment for '{label}': {err:#}"),
        Err(err) => error!("Segment sink worker failed for '{label}': {err}"),
    }
}
