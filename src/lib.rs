// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. session::SessionState)
    clippy::module_name_repetitions
)]

//! # Draftsync
//!
//! Client-side edit synchronization for editable text regions.
//!
//! Draftsync keeps an editing surface in step with a remote document
//! store while sending as little as possible:
//! - Rapid edits are coalesced into one change event after an idle period
//! - Focus loss flushes immediately, teardown makes a last attempt
//! - A structured rich-text surface is bridged to portable markup
//! - Without a rich component, a plain text surface takes over
//!
//! ## Architecture
//!
//! Each editable region gets a [`session::Session`]:
//! - **Surface**: rich or plain editor behind [`adapter::EditorSurface`]
//! - **Tracker**: dirty state and the single pending flush
//! - **Sink**: where change events are handed off
//!
//! Time is supplied by the host as monotonic milliseconds; nothing here
//! spawns threads or timers.
//!
//! ## Modules
//!
//! - [`tracker`]: Debounced change tracking
//! - [`convert`]: Structured text and markup conversion
//! - [`editor`]: Text surfaces
//! - [`adapter`]: Rich and fallback adapters, component loading
//! - [`session`]: Region lifecycle
//! - [`autosave`]: Plain autosave field
//! - [`sink`]: Change events and sinks
//! - [`config`]: Region data and saved defaults
//! - [`replay`]: Scripted replay

pub mod adapter;
pub mod autosave;
pub mod config;
pub mod convert;
pub mod editor;
pub mod error;
pub mod replay;
pub mod session;
pub mod sink;
pub mod tracker;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::adapter::{BuiltinLoader, FormatCommand, UnavailableLoader};
    pub use crate::config::EditableRegion;
    pub use crate::session::{Session, SessionState};
    pub use crate::sink::{ChangeEvent, ChangeSink};
}
