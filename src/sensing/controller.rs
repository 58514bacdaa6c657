use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::SegmentSink;
use crate::session::SessionView;

use super::loop_worker::watch_loop;
use super::source::WindowSource;

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub poll_interval: Duration,
    /// Upper bound on how long `stop` waits for the loop to exit.
    pub stop_timeout: Duration,
    /// Final spans shorter than this are dropped.
    pub min_flush_duration: Duration,
    /// Title of the tracker's own window, which is never logged.
    pub own_window_title: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            stop_timeout: Duration::from_secs(2),
            min_flush_duration: Duration::from_millis(100),
            own_window_title: "Window Monitor".into(),
        }
    }
}

/// Owns the single background polling task.
pub struct WindowWatcher {
    source: Arc<dyn WindowSource>,
    sink: Arc<dyn SegmentSink>,
    config: WatcherConfig,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl WindowWatcher {
    pub fn new(
        source: Arc<dyn WindowSource>,
        sink: Arc<dyn SegmentSink>,
        config: WatcherConfig,
    ) -> Self {
        Self {
            source,
            sink,
            config,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn the polling task. Does nothing if one is already running.
    ///
    /// A run whose stop timed out is still finishing its final flush; it is
    /// awaited first so only one loop is ever alive.
    pub async fn start(&mut self, view: watch::Receiver<SessionView>) {
        if self.cancel_token.is_some() && self.is_running() {
            info!("Window watcher already running");
            return;
        }

        if let Some(previous) = self.handle.take() {
            if !previous.is_finished() {
                info!("Waiting for the previous window watcher to finish its flush");
            }
            if let Err(err) = previous.await {
                warn!("Previous window watcher failed: {err}");
            }
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(watch_loop(
            Arc::clone(&self.source),
            Arc::clone(&self.sink),
            self.config.clone(),
            view,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    /// Cancel the polling task and wait for its final flush, at most
    /// `stop_timeout`. On timeout the handle is kept so the next `start`
    /// waits for it. Calling this with nothing running is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };

        match tokio::time::timeout(self.config.stop_timeout, &mut handle).await {
            Ok(joined) => joined.context("window watcher task failed to join"),
            Err(_) => {
                warn!(
                    "Window watcher did not stop within {:?}; it will finish in the background",
                    self.config.stop_timeout
                );
                self.handle = Some(handle);
                Ok(())
            }
        }
    }
}
