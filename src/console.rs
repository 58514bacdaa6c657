//! Line-oriented terminal front end.
//!
//! Reads one command per line from stdin and forwards it to the session
//! controller. With `live` on, a status line is printed once per second.

use std::future::Future;
use std::io::{self, Write};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use crossterm::{execute, terminal::SetTitle};
use log::{info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time::{self, MissedTickBehavior};

use crate::db::{Database, WorkStatus};
use crate::labels::SENTINEL_TAG;
use crate::session::{SessionController, SessionMode, SessionSnapshot};

const LOG_ROWS: usize = 10;

const HELP: &str = "\
commands:
  track                 start tracking (needs a tag and a note)
  stop                  stop tracking
  stop finished         stop tracking, work is finished
  stop break <reason>   stop tracking for a break
  tag <name>            select a tag; `tag -` clears it
  note [text]           set the note; no text clears it
  tags                  list tags
  add-tag <name>        add a tag
  rm-tag <name>         remove a tag
  status                show the session
  log                   show the latest logged segments
  labels                show every window title seen so far
  live                  toggle a status line every second
  help                  show this help
  quit                  stop tracking and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Track,
    Stop(Option<WorkStatus>),
    Tag(Option<String>),
    Note(String),
    Tags,
    AddTag(String),
    RemoveTag(String),
    Status,
    Log,
    Labels,
    Live,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try `help`)")]
    Unknown(String),

    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start_matches([' ', '\t']).trim_end_matches(['\r', '\n']);
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest),
            None => (line, ""),
        };
        let arg = rest.trim();

        match word {
            "" => Err(ParseCommandError::Empty),
            "track" | "start" => Ok(Command::Track),
            "stop" => parse_stop(arg),
            "tag" => match arg {
                "" => Err(ParseCommandError::MissingArgument("tag")),
                "-" => Ok(Command::Tag(None)),
                name => Ok(Command::Tag(Some(name.to_string()))),
            },
            // The note keeps its own spacing; only the separator is dropped.
            "note" => Ok(Command::Note(
                rest.strip_prefix([' ', '\t']).unwrap_or(rest).to_string(),
            )),
            "tags" => Ok(Command::Tags),
            "add-tag" => required(arg, "add-tag").map(Command::AddTag),
            "rm-tag" => required(arg, "rm-tag").map(Command::RemoveTag),
            "status" => Ok(Command::Status),
            "log" => Ok(Command::Log),
            "labels" => Ok(Command::Labels),
            "live" => Ok(Command::Live),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_stop(arg: &str) -> Result<Command, ParseCommandError> {
    let (kind, reason) = match arg.split_once(char::is_whitespace) {
        Some((kind, reason)) => (kind, reason.trim()),
        None => (arg, ""),
    };
    match kind {
        "" => Ok(Command::Stop(None)),
        "finished" => Ok(Command::Stop(Some(WorkStatus::Finished))),
        // A blank reason is passed through so the controller can refuse it.
        "break" => Ok(Command::Stop(Some(WorkStatus::Break {
            reason: reason.to_string(),
        }))),
        other => Err(ParseCommandError::Unknown(format!("stop {other}"))),
    }
}

fn required(arg: &str, command: &'static str) -> Result<String, ParseCommandError> {
    if arg.is_empty() {
        Err(ParseCommandError::MissingArgument(command))
    } else {
        Ok(arg.to_string())
    }
}

/// `HH:MM:SS`, hours unbounded.
pub fn format_elapsed(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let tag = snapshot.tag.as_deref().unwrap_or("-");
    let note = if snapshot.note.trim().is_empty() {
        "-".to_string()
    } else {
        snapshot.note.trim().replace('\n', " ")
    };
    format!(
        "[{}] {} | tag: {} | note: {} | since {}",
        snapshot.mode,
        format_elapsed(snapshot.timers.active_seconds),
        tag,
        note,
        snapshot.since.format("%H:%M:%S"),
    )
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    controller: SessionController,
    db: Database,
    window_title: String,
    live: bool,
}

impl Console {
    pub fn new(controller: SessionController, db: Database, window_title: String) -> Self {
        Self {
            controller,
            db,
            window_title,
            live: false,
        }
    }

    /// Run until `quit`, end of input or Ctrl-C. The session is always shut
    /// down before returning so an open segment gets written.
    pub async fn run(self) -> Result<()> {
        if let Err(err) = execute!(io::stdout(), SetTitle(&self.window_title)) {
            warn!("Could not set terminal title: {err}");
        }

        println!("Window Monitor. Type `help` for commands.");
        self.print_status().await;

        let interrupted = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Interrupted"),
                Err(err) => {
                    warn!("Could not listen for Ctrl-C: {err}");
                    std::future::pending::<()>().await;
                }
            }
        };

        self.serve(BufReader::new(tokio::io::stdin()).lines(), interrupted)
            .await
    }

    /// Command loop over `lines`. `shutdown` is polled across the whole loop,
    /// so a signal that lands while a command is running is not lost.
    pub async fn serve<R, S>(mut self, mut lines: Lines<R>, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break Ok(()),
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if self.handle(&line).await == Flow::Quit {
                            break Ok(());
                        }
                    }
                    Ok(None) => {
                        info!("End of input");
                        break Ok(());
                    }
                    Err(err) => {
                        break Err(anyhow::Error::new(err).context("failed to read from stdin"))
                    }
                },
                _ = ticker.tick() => {
                    if self.live {
                        self.print_status().await;
                    }
                }
            }
        };

        self.controller.shutdown().await;
        outcome
    }

    async fn handle(&mut self, line: &str) -> Flow {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(ParseCommandError::Empty) => return Flow::Continue,
            Err(err) => {
                println!("{err}");
                return Flow::Continue;
            }
        };

        match command {
            Command::Track => match self.controller.set_state(SessionMode::Tracking).await {
                Ok(()) => self.print_status().await,
                Err(reason) => println!("Cannot start tracking: {reason}"),
            },
            Command::Stop(None) => match self.controller.set_state(SessionMode::Inactive).await {
                Ok(()) => self.print_status().await,
                Err(reason) => println!("{reason}"),
            },
            Command::Stop(Some(status)) => match self.controller.end_tracking(status).await {
                Ok(()) => self.print_status().await,
                Err(reason) => println!("Cannot stop: {reason}"),
            },
            Command::Tag(name) => match self.controller.set_tag(name.as_deref()).await {
                Ok(()) => println!("Tag: {}", name.as_deref().unwrap_or("-")),
                Err(err) => println!("{err}; see `tags`"),
            },
            Command::Note(text) => {
                self.controller.set_note(&text).await;
                println!("Note updated");
            }
            Command::Tags => self.print_tags().await,
            Command::AddTag(name) => {
                if self.controller.add_tag(&name) {
                    println!("Added tag '{}'", name.trim());
                } else {
                    println!("Tag '{}' already exists", name.trim());
                }
            }
            Command::RemoveTag(name) => {
                if name == SENTINEL_TAG {
                    println!("'{SENTINEL_TAG}' cannot be removed");
                } else if self.controller.remove_tag(&name).await {
                    println!("Removed tag '{name}'");
                } else {
                    println!("No tag named '{name}'");
                }
            }
            Command::Status => self.print_status().await,
            Command::Log => self.print_log().await,
            Command::Labels => self.print_labels().await,
            Command::Live => {
                self.live = !self.live;
                println!("Live status {}", if self.live { "on" } else { "off" });
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }

        if let Err(err) = io::stdout().flush() {
            warn!("Failed to flush stdout: {err}");
        }
        Flow::Continue
    }

    async fn print_status(&self) {
        println!("{}", status_line(&self.controller.snapshot().await));
    }

    async fn print_tags(&self) {
        let selected = self.controller.current_tag().await;
        for tag in self.controller.tags() {
            let marker = if selected.as_deref() == Some(tag.as_str()) {
                '*'
            } else {
                ' '
            };
            println!(" {marker} {tag}");
        }
    }

    async fn print_log(&self) {
        match self.db.recent_segments(LOG_ROWS).await {
            Ok(rows) if rows.is_empty() => println!("Nothing logged yet"),
            Ok(rows) => {
                for row in rows.iter().rev() {
                    let status = match (&row.work_status, &row.break_reason) {
                        (Some(status), Some(reason)) => format!(" [{status}: {reason}]"),
                        (Some(status), None) => format!(" [{status}]"),
                        _ => String::new(),
                    };
                    println!(
                        "{}  {:>6}s  {:<12} {}{}",
                        row.datetime_start, row.duration_seconds, row.tag, row.window_title, status
                    );
                }
            }
            Err(err) => {
                warn!("Failed to read window log: {err:#}");
                println!("Could not read the window log");
            }
        }
    }

    async fn print_labels(&self) {
        match self.db.known_labels().await {
            Ok(labels) if labels.is_empty() => println!("No windows seen yet"),
            Ok(labels) => {
                for label in labels {
                    println!("{}  {}", label.first_seen, label.label);
                }
            }
            Err(err) => {
                warn!("Failed to read known labels: {err:#}");
                println!("Could not read known labels");
            }
        }
    }
}
