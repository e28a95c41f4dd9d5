//! Copy-to-clipboard action for code blocks.
//!
//! Each rendered code block owns one [`CopyAction`]:
//!
//! ```text
//! Idle --copy()--> Copied { since } --2s--> Idle
//! ```
//!
//! Copying again while already `Copied` restarts the 2 second window. The
//! revert timer is plain data ([`RevertTimer`]) tagged with a generation;
//! firing a timer from an older generation does nothing, which is how a
//! superseded timer is cancelled. Nothing here sleeps or spawns threads;
//! callers drive time through a [`Clock`] and [`CopyAction::poll`].

use std::cell::Cell;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::ast::CodeBlock;
use crate::config::ClipboardConfig;
use crate::render::{COPIED_LABEL, COPY_LABEL};

/// How long the copied state lasts.
pub const REVERT_AFTER: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to start clipboard program `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to clipboard program `{program}`: {source}")]
    Write {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard program `{program}` exited with {status}")]
    Status { program: String, status: String },

    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Destination for copied text.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Pipes text into an external program such as `wl-copy` or `pbcopy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandClipboard {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &ClipboardConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

impl Clipboard for CommandClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ClipboardError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stdin is dropped at the end of the match, so the program sees EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => {
                stdin
                    .write_all(text.as_bytes())
                    .map_err(|source| ClipboardError::Write {
                        program: self.program.clone(),
                        source,
                    })
            }
            None => Err(ClipboardError::Unavailable(format!(
                "`{}` has no stdin",
                self.program
            ))),
        };
        if let Err(err) = written {
            // a partial payload must not land on the clipboard; reap either way.
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }

        let status = child.wait().map_err(|source| ClipboardError::Write {
            program: self.program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(ClipboardError::Status {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        debug!(program = %self.program, bytes = text.len(), "wrote clipboard");
        Ok(())
    }
}

/// In-memory clipboard that records every write.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    pub writes: Vec<String>,
    fail: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that rejects every write.
    pub fn failing() -> Self {
        Self {
            writes: Vec::new(),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.writes.last().map(String::as_str)
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("permission denied".to_string()));
        }
        self.writes.push(text.to_string());
        Ok(())
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    Idle,
    Copied { since: Instant },
}

/// A scheduled return to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevertTimer {
    generation: u64,
    due: Instant,
}

impl RevertTimer {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn due(&self) -> Instant {
        self.due
    }
}

/// Copy affordance for one code block.
#[derive(Debug, Clone)]
pub struct CopyAction {
    payload: String,
    revert_after: Duration,
    state: CopyState,
    timer: Option<RevertTimer>,
    generation: u64,
}

impl CopyAction {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            revert_after: REVERT_AFTER,
            state: CopyState::Idle,
            timer: None,
            generation: 0,
        }
    }

    /// Action for a parsed block; copies the body minus one trailing newline.
    pub fn for_block(block: &CodeBlock) -> Self {
        Self::new(block.copy_payload())
    }

    pub fn with_revert_after(mut self, revert_after: Duration) -> Self {
        self.revert_after = revert_after;
        self
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn state(&self) -> CopyState {
        self.state
    }

    pub fn is_copied(&self) -> bool {
        matches!(self.state, CopyState::Copied { .. })
    }

    /// Button label for the current state.
    pub fn label(&self) -> &'static str {
        if self.is_copied() {
            COPIED_LABEL
        } else {
            COPY_LABEL
        }
    }

    /// Writes the payload to `clipboard` and schedules the revert.
    ///
    /// On failure the error is logged and the state is left unchanged; no
    /// timer is scheduled.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard, clock: &dyn Clock) -> Option<RevertTimer> {
        if let Err(err) = clipboard.write_text(&self.payload) {
            warn!(error = %err, "failed to copy code");
            return None;
        }

        let now = clock.now();
        self.generation += 1;
        let timer = RevertTimer {
            generation: self.generation,
            due: now + self.revert_after,
        };
        self.state = CopyState::Copied { since: now };
        self.timer = Some(timer);
        Some(timer)
    }

    /// Fires `timer`. Timers from before the latest copy are ignored.
    pub fn fire(&mut self, timer: RevertTimer) {
        if self.timer != Some(timer) {
            debug!(
                generation = timer.generation,
                current = self.generation,
                "ignoring stale revert timer"
            );
            return;
        }
        self.timer = None;
        self.state = CopyState::Idle;
    }

    /// Fires the pending timer if it is due, then returns the state.
    pub fn poll(&mut self, clock: &dyn Clock) -> CopyState {
        if let Some(timer) = self.timer
            && clock.now() >= timer.due
        {
            self.fire(timer);
        }
        self.state
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.due)
    }
}
