//! Scripted replay of user activity against a session.
//!
//! A script is JSON lines, one timestamped step per line:
//!
//! ```text
//! {"step": "input", "at": 0, "text": "Hello"}
//! {"step": "command", "at": 120, "name": "h2"}
//! {"step": "tick", "at": 2000}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Before every step
//! the session is polled at the step's time, so due flushes fire in order.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapter::{ComponentLoader, FormatCommand};
use crate::config::EditableRegion;
use crate::error::{ReplayError, SessionError};
use crate::session::{Session, SessionState};
use crate::sink::ChangeEvent;

/// One scripted step. `at` is milliseconds since the script started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Type text at the insertion point.
    Input { at: u64, text: String },
    /// Delete `count` characters before the insertion point.
    Backspace {
        at: u64,
        #[serde(default = "one")]
        count: usize,
    },
    /// Replace the whole content with markup.
    Replace { at: u64, content: String },
    /// Run a toolbar command by name (`bold`, `h2`, `bullet_list`, ...).
    Command { at: u64, name: String },
    /// The surface changed without going through the session.
    Edit { at: u64 },
    Blur { at: u64 },
    /// Let time pass.
    Tick { at: u64 },
    Detach { at: u64 },
}

const fn one() -> usize {
    1
}

impl Step {
    pub const fn at(&self) -> u64 {
        match self {
            Self::Input { at, .. }
            | Self::Backspace { at, .. }
            | Self::Replace { at, .. }
            | Self::Command { at, .. }
            | Self::Edit { at }
            | Self::Blur { at }
            | Self::Tick { at }
            | Self::Detach { at } => *at,
        }
    }
}

/// Parse a JSON-lines script.
///
/// # Errors
/// Returns [`ReplayError::Parse`] for a malformed line and
/// [`ReplayError::OutOfOrder`] when time goes backwards.
pub fn parse_script(input: &str) -> Result<Vec<Step>, ReplayError> {
    let mut steps: Vec<Step> = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: Step = serde_json::from_str(line).map_err(|source| ReplayError::Parse {
            line: idx + 1,
            source,
        })?;
        if let Some(prev) = steps.last()
            && step.at() < prev.at()
        {
            return Err(ReplayError::OutOfOrder {
                line: idx + 1,
                at: step.at(),
            });
        }
        steps.push(step);
    }
    Ok(steps)
}

/// Run `steps` against a fresh session for `region`.
///
/// After the last step the session is polled once more a full debounce
/// interval later and then detached. Returns every event delivered, in
/// order. Formatting commands on a plain text surface are skipped.
///
/// # Errors
/// Returns [`ReplayError::Session`] when a step is rejected.
pub async fn replay<L: ComponentLoader>(
    region: EditableRegion,
    loader: &L,
    steps: &[Step],
) -> Result<Vec<ChangeEvent>, ReplayError> {
    let debounce_ms = region.debounce_ms;
    let mut session = Session::new(region, Vec::new());
    let kind = session.attach(loader).await?;
    debug!(adapter = %kind, steps = steps.len(), "replay started");

    let mut last_at = 0;
    for (idx, step) in steps.iter().enumerate() {
        let now = step.at();
        last_at = now;
        session.poll(now)?;
        match step {
            Step::Input { text, .. } => session.insert_text(text, now)?,
            Step::Backspace { count, .. } => {
                for _ in 0..*count {
                    session.delete_back(now)?;
                }
            }
            Step::Replace { content, .. } => session.replace_content(content, now)?,
            Step::Command { name, .. } => {
                let command: FormatCommand = name.parse()?;
                match session.apply(command, now) {
                    Err(SessionError::CommandUnavailable) => {
                        warn!(command = %command, "no toolbar on plain text surface, skipped");
                    }
                    other => other?,
                }
            }
            Step::Edit { .. } => session.component_changed(now)?,
            Step::Blur { .. } => {
                session.blur(now)?;
            }
            Step::Tick { .. } => {}
            Step::Detach { .. } => {
                session.detach();
                let ignored = steps.len() - idx - 1;
                if ignored > 0 {
                    warn!(ignored, "steps after detach were not replayed");
                }
                break;
            }
        }
    }

    if session.state() == SessionState::Attached {
        session.poll(last_at.saturating_add(debounce_ms))?;
        session.detach();
    }
    Ok(session.into_sink())
}
