//! Error types.
//!
//! None of these are fatal. A failed component load is recovered inside
//! the session, a failed delivery is logged, and conversion never fails.
//! Replay errors are the exception: a bad script stops the replay.

use thiserror::Error;

use crate::session::SessionState;

/// The rich editing component could not be provided.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No component is installed for this surface.
    #[error("rich editing component is not installed")]
    Missing,

    /// The component exists but failed to initialize.
    #[error("rich editing component failed to load: {0}")]
    Failed(String),
}

/// A change notification could not be handed to the collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The receiving end has gone away.
    #[error("change receiver disconnected")]
    Disconnected,

    /// The collaborator refused the event.
    #[error("change rejected: {0}")]
    Rejected(String),
}

/// Misuse of a session or adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The operation is not valid in the session's current state.
    #[error("session is {actual}, expected {expected}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    /// The surface has no formatting commands (plain text fallback).
    #[error("formatting commands are unavailable on a plain text surface")]
    CommandUnavailable,

    /// Toolbar name that maps to no formatting command.
    #[error("unknown formatting command: {0}")]
    UnknownCommand(String),

    /// Heading level outside the configured set.
    #[error("heading level {0} is not supported")]
    UnsupportedHeading(u8),
}

/// A replay script could not be read or run.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: step at {at}ms is earlier than the previous step")]
    OutOfOrder { line: usize, at: u64 },

    #[error(transparent)]
    Session(#[from] SessionError),
}
