//! Editing surfaces.
//!
//! [`TextBuffer`] is the plain rope-backed surface used when no rich
//! component is available. [`BlockEditor`] is the built-in structured
//! component: a flat list of block fragments with whole-block formatting.

mod blocks;
mod buffer;

pub use blocks::BlockEditor;
pub use buffer::{Cursor, TextBuffer};
