//! One editable region bound to one surface, one tracker and one sink.
//!
//! ```text
//! Uninitialized --attach--> Attached --detach--> Detached
//! ```
//!
//! There is no way back to `Attached`; re-attaching a region means
//! creating a new session.

use std::fmt;

use tracing::{debug, warn};

use crate::adapter::{
    AdapterKind, ComponentLoader, ComponentOptions, EditorSurface, FallbackAdapter,
    FormatCommand, RichAdapter,
};
use crate::config::EditableRegion;
use crate::error::SessionError;
use crate::sink::{ChangeEvent, ChangeSink};
use crate::tracker::{ChangeTracker, Flush};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Attached,
    Detached,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Attached => write!(f, "attached"),
            Self::Detached => write!(f, "detached"),
        }
    }
}

/// Synchronization session for one editable region.
///
/// Edits go through the session so every change reported by the surface
/// reaches the tracker. Time is passed in as monotonic milliseconds.
pub struct Session<S: ChangeSink> {
    region: EditableRegion,
    options: ComponentOptions,
    tracker: ChangeTracker,
    surface: Option<Box<dyn EditorSurface>>,
    /// Latest markup reported by the surface.
    current: String,
    sink: S,
    state: SessionState,
}

impl<S: ChangeSink> Session<S> {
    pub fn new(region: EditableRegion, sink: S) -> Self {
        let tracker = ChangeTracker::new(region.initial_content.clone(), region.debounce_ms);
        let current = region.initial_content.clone();
        Self {
            region,
            options: ComponentOptions::default(),
            tracker,
            surface: None,
            current,
            sink,
            state: SessionState::Uninitialized,
        }
    }

    /// Options passed to the component loader on attach.
    #[must_use]
    pub fn with_options(mut self, options: ComponentOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn region(&self) -> &EditableRegion {
        &self.region
    }

    pub const fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Which surface variant was chosen, once attached.
    pub fn adapter_kind(&self) -> Option<AdapterKind> {
        self.surface.as_ref().map(|s| s.kind())
    }

    /// Current surface content as markup, once attached.
    pub fn content(&self) -> Option<String> {
        self.surface.as_ref().map(|s| s.content())
    }

    pub fn is_focused(&self) -> bool {
        self.surface.as_ref().is_some_and(|s| s.is_focused())
    }

    /// When the session next needs a [`Session::poll`], if ever.
    pub fn next_deadline(&self) -> Option<u64> {
        self.tracker.next_deadline()
    }

    /// Try to load the rich component, set up the surface and focus it.
    ///
    /// A failed load is not an error: the session silently uses the plain
    /// text fallback.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] unless the session is
    /// uninitialized.
    pub async fn attach<L: ComponentLoader>(
        &mut self,
        loader: &L,
    ) -> Result<AdapterKind, SessionError> {
        self.expect_state(SessionState::Uninitialized)?;
        let mut surface: Box<dyn EditorSurface> = match loader.load(&self.options).await {
            Ok(component) => Box::new(RichAdapter::new(component, &self.region.initial_content)),
            Err(err) => {
                debug!(
                    region = %self.region.region_id,
                    error = %err,
                    "rich component unavailable, using plain text"
                );
                Box::new(FallbackAdapter::new(&self.region.initial_content))
            }
        };
        surface.focus();
        let kind = surface.kind();
        self.surface = Some(surface);
        self.state = SessionState::Attached;
        debug!(region = %self.region.region_id, adapter = %kind, "session attached");
        Ok(kind)
    }

    /// Type `text` into the surface.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] unless attached.
    pub fn insert_text(&mut self, text: &str, now_ms: u64) -> Result<(), SessionError> {
        self.surface_mut()?.insert_text(text);
        self.sync(now_ms);
        Ok(())
    }

    /// Delete one character before the insertion point.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] unless attached.
    pub fn delete_back(&mut self, now_ms: u64) -> Result<bool, SessionError> {
        let deleted = self.surface_mut()?.delete_back();
        self.sync(now_ms);
        Ok(deleted)
    }

    /// Replace the whole surface content with `markup`.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] unless attached.
    pub fn replace_content(&mut self, markup: &str, now_ms: u64) -> Result<(), SessionError> {
        self.surface_mut()?.replace_content(markup);
        self.sync(now_ms);
        Ok(())
    }

    /// Run a toolbar command.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] unless attached,
    /// [`SessionError::CommandUnavailable`] on the plain text surface, or
    /// the component's rejection.
    pub fn apply(&mut self, command: FormatCommand, now_ms: u64) -> Result<(), SessionError> {
        self.surface_mut()?.apply(command)?;
        self.sync(now_ms);
        Ok(())
    }

    /// The host saw the surface mutate on its own; pick up the change.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] unless attached.
    pub fn component_changed(&mut self, now_ms: u64) -> Result<(), SessionError> {
        self.expect_state(SessionState::Attached)?;
        self.sync(now_ms);
        Ok(())
    }

    /// Deliver the pending flush if its interval has elapsed.
    ///
    /// Returns whether a flush was delivered.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] unless attached.
    pub fn poll(&mut self, now_ms: u64) -> Result<bool, SessionError> {
        self.expect_state(SessionState::Attached)?;
        let Some(flush) = self.tracker.poll(now_ms) else {
            return Ok(false);
        };
        self.deliver(flush);
        Ok(true)
    }

    /// Focus left the surface: flush immediately when dirty.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] unless attached.
    pub fn blur(&mut self, now_ms: u64) -> Result<bool, SessionError> {
        self.surface_mut()?.blur();
        self.sync(now_ms);
        let Some(flush) = self.tracker.on_blur(&self.current) else {
            return Ok(false);
        };
        self.deliver(flush);
        Ok(true)
    }

    /// Tear down: cancel the pending flush, make one best-effort attempt to
    /// deliver unsynced content, and release the surface.
    ///
    /// Never fails. Detaching an already detached session does nothing.
    pub fn detach(&mut self) {
        if self.state == SessionState::Detached {
            return;
        }
        if let Some(mut surface) = self.surface.take() {
            if let Some(value) = surface.take_change() {
                self.current = value;
            }
            if let Some(flush) = self.tracker.on_detach(&self.current) {
                self.deliver(flush);
            }
            surface.release();
        }
        self.tracker.cancel();
        self.state = SessionState::Detached;
        debug!(region = %self.region.region_id, "session detached");
    }

    fn sync(&mut self, now_ms: u64) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Some(value) = surface.take_change() {
            self.current = value;
            self.tracker.on_input(self.current.clone(), now_ms);
        }
    }

    fn deliver(&mut self, flush: Flush) {
        debug!(
            region = %self.region.region_id,
            reason = ?flush.reason,
            bytes = flush.value.len(),
            "flushing"
        );
        let event = ChangeEvent::section(self.region.region_id.clone(), flush.value);
        if let Err(err) = self.sink.deliver(event) {
            warn!(
                region = %self.region.region_id,
                reason = ?flush.reason,
                error = %err,
                "change delivery failed"
            );
        }
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn surface_mut(&mut self) -> Result<&mut Box<dyn EditorSurface>, SessionError> {
        self.expect_state(SessionState::Attached)?;
        let actual = self.state;
        self.surface.as_mut().ok_or(SessionError::InvalidState {
            expected: SessionState::Attached,
            actual,
        })
    }
}
