//! Plain text field with debounced autosave.
//!
//! Same debounce rules as an editable region, but the field has no rich
//! mode and reports its whole value as `description_changed`. It also
//! listens for page unload, where it makes one fire-and-forget attempt
//! without treating the value as saved.

use tracing::{debug, warn};

use crate::config::parse_debounce;
use crate::editor::TextBuffer;
use crate::sink::{ChangeEvent, ChangeSink};
use crate::tracker::{ChangeTracker, Flush};

pub struct AutosaveField<S: ChangeSink> {
    buffer: TextBuffer,
    tracker: ChangeTracker,
    sink: S,
    unload_hooked: bool,
}

impl<S: ChangeSink> AutosaveField<S> {
    /// `debounce` is the raw attribute value; unusable values mean 800ms.
    pub fn new(initial: &str, debounce: Option<&str>, sink: S) -> Self {
        Self {
            buffer: TextBuffer::from_text(initial),
            tracker: ChangeTracker::new(initial, parse_debounce(debounce)),
            sink,
            unload_hooked: true,
        }
    }

    pub fn value(&self) -> String {
        self.buffer.text()
    }

    pub const fn is_dirty(&self) -> bool {
        self.tracker.is_dirty()
    }

    pub const fn debounce_ms(&self) -> u64 {
        self.tracker.debounce_ms()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.tracker.next_deadline()
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Type `text` at the end of the field.
    pub fn type_text(&mut self, text: &str, now_ms: u64) {
        self.buffer.move_to_end();
        self.buffer.insert_str(text);
        self.sync(now_ms);
    }

    /// The field's value was replaced wholesale (paste, programmatic set).
    pub fn set_value(&mut self, value: &str, now_ms: u64) {
        self.buffer.set_text(value);
        self.sync(now_ms);
    }

    /// Deliver the pending save once the field has been idle long enough.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.tracker.poll(now_ms) {
            Some(flush) => {
                self.save(flush);
                true
            }
            None => false,
        }
    }

    /// Save immediately if the value is unsaved.
    pub fn blur(&mut self) -> bool {
        match self.tracker.on_blur(&self.buffer.text()) {
            Some(flush) => {
                self.save(flush);
                true
            }
            None => false,
        }
    }

    /// The page is going away: notify once when dirty.
    ///
    /// The value is not marked saved, since delivery cannot be confirmed.
    pub fn unload(&mut self) -> bool {
        if !self.unload_hooked || !self.tracker.is_dirty() {
            return false;
        }
        if let Err(err) = self.sink.deliver(ChangeEvent::value(self.buffer.text())) {
            debug!(error = %err, "unload notification not delivered");
        }
        true
    }

    /// Cancel the pending save and stop listening for unload. Nothing is
    /// flushed.
    pub fn destroy(&mut self) {
        self.tracker.cancel();
        self.unload_hooked = false;
    }

    fn sync(&mut self, now_ms: u64) {
        if let Some(value) = self.buffer.take_change() {
            self.tracker.on_input(value, now_ms);
        }
    }

    fn save(&mut self, flush: Flush) {
        debug!(reason = ?flush.reason, "autosave");
        if let Err(err) = self.sink.deliver(ChangeEvent::value(flush.value)) {
            warn!(error = %err, "autosave delivery failed");
        }
    }
}
