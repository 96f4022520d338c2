//! Outbound change notifications.
//!
//! A flush hands exactly one [`ChangeEvent`] to a [`ChangeSink`]. The sink
//! stands in for whatever owns the network transport; delivery is a
//! handoff and is never awaited.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

/// Event name emitted for editable regions (rich or fallback surface).
pub const CONTENT_CHANGED: &str = "content_changed";

/// Event name emitted by the plain autosave field.
pub const DESCRIPTION_CHANGED: &str = "description_changed";

/// Event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Content of a named region.
    Section { section: String, content: String },
    /// Bare value of a single field.
    Value { value: String },
}

impl Payload {
    /// The markup carried by this payload.
    pub fn content(&self) -> &str {
        match self {
            Self::Section { content, .. } => content,
            Self::Value { value } => value,
        }
    }
}

/// A named "content changed" notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event: String,
    pub payload: Payload,
}

impl ChangeEvent {
    /// `content_changed` for a region.
    pub fn section(section: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            event: CONTENT_CHANGED.to_string(),
            payload: Payload::Section {
                section: section.into(),
                content: content.into(),
            },
        }
    }

    /// `description_changed` for a single field.
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            event: DESCRIPTION_CHANGED.to_string(),
            payload: Payload::Value {
                value: value.into(),
            },
        }
    }
}

/// Receives change notifications.
pub trait ChangeSink {
    /// Hand one event to the collaborator.
    ///
    /// # Errors
    /// Returns an error if the event could not be handed off. Callers treat
    /// this as an uncertain delivery, never as a reason to retry.
    fn deliver(&mut self, event: ChangeEvent) -> Result<(), DeliveryError>;
}

impl ChangeSink for Vec<ChangeEvent> {
    fn deliver(&mut self, event: ChangeEvent) -> Result<(), DeliveryError> {
        self.push(event);
        Ok(())
    }
}

impl ChangeSink for Sender<ChangeEvent> {
    fn deliver(&mut self, event: ChangeEvent) -> Result<(), DeliveryError> {
        self.send(event).map_err(|_| DeliveryError::Disconnected)
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> ChangeSink for FnSink<F>
where
    F: FnMut(ChangeEvent) -> Result<(), DeliveryError>,
{
    fn deliver(&mut self, event: ChangeEvent) -> Result<(), DeliveryError> {
        (self.0)(event)
    }
}
