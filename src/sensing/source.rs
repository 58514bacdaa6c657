//! Foreground-window queries and sample classification.

use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("failed to run {command}: {message}")]
    Spawn { command: String, message: String },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("foreground window queries are not supported on this platform")]
    Unsupported,

    #[error("window query worker failed: {0}")]
    Worker(String),
}

/// Provider of the OS foreground window title.
pub trait WindowSource: Send + Sync + 'static {
    /// `Ok(None)` when no window has focus.
    fn foreground_title(&self) -> Result<Option<String>, QueryError>;
}

/// One classified poll of the foreground window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSample {
    /// The tracker's own window. Ignored entirely.
    OwnUi,
    Unknown,
    QueryError,
    Trackable(String),
}

impl WindowSample {
    pub fn label(&self) -> Option<&str> {
        match self {
            WindowSample::Trackable(label) => Some(label),
            _ => None,
        }
    }
}

pub fn classify(result: Result<Option<String>, QueryError>, own_title: &str) -> WindowSample {
    match result {
        Err(_) => WindowSample::QueryError,
        Ok(None) => WindowSample::Unknown,
        Ok(Some(title)) if title.is_empty() => WindowSample::Unknown,
        Ok(Some(title)) if title == own_title => WindowSample::OwnUi,
        Ok(Some(title)) => WindowSample::Trackable(title),
    }
}

/// Asks the desktop for the focused window through the platform's CLI tooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWindowSource;

impl WindowSource for SystemWindowSource {
    #[cfg(target_os = "linux")]
    fn foreground_title(&self) -> Result<Option<String>, QueryError> {
        run_title_command("xdotool", &["getactivewindow", "getwindowname"])
    }

    #[cfg(target_os = "macos")]
    fn foreground_title(&self) -> Result<Option<String>, QueryError> {
        const SCRIPT: &str = r#"tell application "System Events"
    set frontApp to first application process whose frontmost is true
    if (count of windows of frontApp) is 0 then return ""
    return name of front window of frontApp
end tell"#;
        run_title_command("/usr/bin/osascript", &["-e", SCRIPT])
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    fn foreground_title(&self) -> Result<Option<String>, QueryError> {
        Err(QueryError::Unsupported)
    }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn run_title_command(command: &str, args: &[&str]) -> Result<Option<String>, QueryError> {
    use std::process::{Command, Stdio};

    let output = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|err| QueryError::Spawn {
            command: command.to_string(),
            message: err.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        // xdotool exits non-zero with no output when nothing is focused.
        if stderr.is_empty() && output.stdout.is_empty() {
            return Ok(None);
        }
        return Err(QueryError::Failed {
            command: command.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    let title = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
    Ok(Some(title).filter(|title| !title.is_empty()))
}

/// A window source whose answer is set by hand. Clones share the same answer.
#[derive(Debug, Clone)]
pub struct ScriptedWindowSource {
    current: Arc<Mutex<Result<Option<String>, QueryError>>>,
}

impl ScriptedWindowSource {
    pub fn new(title: Option<&str>) -> Self {
        Self {
            current: Arc::new(Mutex::new(Ok(title.map(str::to_string)))),
        }
    }

    pub fn focus(&self, title: Option<&str>) {
        self.set(Ok(title.map(str::to_string)));
    }

    pub fn fail(&self, error: QueryError) {
        self.set(Err(error));
    }

    fn set(&self, value: Result<Option<String>, QueryError>) {
        let mut guard = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = value;
    }
}

impl WindowSource for ScriptedWindowSource {
    fn foreground_title(&self) -> Result<Option<String>, QueryError> {
        match self.current.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
