use std::{
    sync::{Arc, Mutex as StdMutex, MutexGuard},
    time::Instant,
};

use chrono::{DateTime, Local};
use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::{db::WorkStatus, labels::TagRegistry, sensing::WindowWatcher};

use super::{
    error::{InvalidTagError, RejectionReason},
    state::{SessionMode, SessionState, SessionTimers, SessionView},
};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: SessionMode,
    pub tag: Option<String>,
    pub note: String,
    pub since: DateTime<Local>,
    pub timers: SessionTimers,
}

/// Owns the tracking session: mode, tag, note and elapsed-time accounting.
///
/// All writes to session state go through here. The window watcher only sees
/// the [`SessionView`] snapshots published on a watch channel. Each tracking
/// run gets its own channel, which is frozen once the run ends.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    transitions: Arc<Mutex<()>>,
    run_view: Arc<StdMutex<Option<watch::Sender<SessionView>>>>,
    watcher: Arc<Mutex<WindowWatcher>>,
    tags: Arc<TagRegistry>,
}

impl SessionController {
    pub fn new(tags: TagRegistry, watcher: WindowWatcher) -> Self {
        let state = SessionState::new(Local::now(), Instant::now());

        Self {
            state: Arc::new(Mutex::new(state)),
            transitions: Arc::new(Mutex::new(())),
            run_view: Arc::new(StdMutex::new(None)),
            watcher: Arc::new(Mutex::new(watcher)),
            tags: Arc::new(tags),
        }
    }

    pub async fn current_state(&self) -> SessionMode {
        self.state.lock().await.mode
    }

    pub async fn current_tag(&self) -> Option<String> {
        self.state.lock().await.tag.clone()
    }

    pub async fn note(&self) -> String {
        self.state.lock().await.note.clone()
    }

    pub async fn session_timers(&self) -> SessionTimers {
        self.state.lock().await.timers_at(Instant::now())
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            mode: state.mode,
            tag: state.tag.clone(),
            note: state.note.clone(),
            since: state.last_transition_at,
            timers: state.timers_at(Instant::now()),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.list_tags()
    }

    pub async fn set_state(&self, mode: SessionMode) -> Result<(), RejectionReason> {
        self.transition(mode, None).await
    }

    /// Leave tracking with an end-of-work answer attached to the last segment.
    pub async fn end_tracking(&self, status: WorkStatus) -> Result<(), RejectionReason> {
        if status.break_reason().is_some_and(|reason| reason.trim().is_empty()) {
            if !self.current_state().await.is_tracking() {
                return Ok(());
            }
            return Err(RejectionReason::NoBreakReason);
        }
        self.transition(SessionMode::Inactive, Some(status)).await
    }

    async fn transition(
        &self,
        mode: SessionMode,
        work_status: Option<WorkStatus>,
    ) -> Result<(), RejectionReason> {
        let _serial = self.transitions.lock().await;

        let previous = {
            let state = self.state.lock().await;
            if state.mode == mode {
                return Ok(());
            }
            if mode.is_tracking() {
                if let Err(reason) = state.tracking_ready() {
                    warn!("Refusing to start tracking: {reason}");
                    return Err(reason);
                }
            }
            state.mode
        };

        let now = Local::now();
        let at = Instant::now();

        match previous {
            SessionMode::Tracking => {
                if let Some(status) = &work_status {
                    if let Some(run) = self.run_view().as_ref() {
                        run.send_modify(|view| view.work_status = Some(status.clone()));
                    }
                }
                // Flushes the in-progress window segment before the mode flips.
                if let Err(err) = self.watcher.lock().await.stop().await {
                    error!("Window watcher stop failed: {err:#}");
                }
                // A run that outlives its stop keeps reading this last view.
                self.run_view().take();
            }
            SessionMode::Inactive => {}
        }

        let view = {
            let mut state = self.state.lock().await;
            let elapsed = state.transition(mode, now, at);
            info!(
                "Session {} -> {} after {:.1}s",
                previous,
                mode,
                elapsed.as_secs_f64()
            );
            state.view(None)
        };

        if mode.is_tracking() {
            let (run_tx, run_rx) = watch::channel(view);
            *self.run_view() = Some(run_tx);
            self.watcher.lock().await.start(run_rx).await;
        }

        Ok(())
    }

    /// Select a tag, or clear the selection with `None` / an empty name.
    pub async fn set_tag(&self, tag: Option<&str>) -> Result<(), InvalidTagError> {
        let tag = tag.filter(|name| !name.is_empty());
        if let Some(name) = tag {
            if !self.tags.contains(name) {
                warn!("Ignoring unknown tag '{name}'");
                return Err(InvalidTagError(name.to_string()));
            }
        }

        let mut state = self.state.lock().await;
        state.tag = tag.map(str::to_string);
        self.publish(&state);
        Ok(())
    }

    /// Replace the note verbatim.
    pub async fn set_note(&self, text: &str) {
        let mut state = self.state.lock().await;
        state.note = text.to_string();
        self.publish(&state);
    }

    pub fn add_tag(&self, name: &str) -> bool {
        self.tags.add_tag(name)
    }

    /// Remove a tag from the registry, clearing the selection if it was the
    /// selected one.
    pub async fn remove_tag(&self, name: &str) -> bool {
        if !self.tags.remove_tag(name) {
            return false;
        }

        let mut state = self.state.lock().await;
        if state.tag.as_deref() == Some(name) {
            info!("Selected tag '{name}' was removed; clearing selection");
            state.tag = None;
            self.publish(&state);
        }
        true
    }

    /// Leave tracking before exit so the open segment gets flushed.
    pub async fn shutdown(&self) {
        if let Err(reason) = self.set_state(SessionMode::Inactive).await {
            warn!("Shutdown transition refused: {reason}");
        }
    }

    fn publish(&self, state: &SessionState) {
        if let Some(run) = self.run_view().as_ref() {
            run.send_modify(|view| {
                view.tag = state.tag.clone();
                view.note = state.note.clone();
            });
        }
    }

    fn run_view(&self) -> MutexGuard<'_, Option<watch::Sender<SessionView>>> {
        match self.run_view.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
