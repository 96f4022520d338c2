//! Editing surfaces as seen by a session.
//!
//! A session only talks to an [`EditorSurface`]: present content, accept
//! content, report changes, and (maybe) run formatting commands. Two
//! implementations exist:
//!
//! - [`RichAdapter`] wraps a [`RichComponent`] that edits structured text
//!   and converts to portable markup at the boundary.
//! - [`FallbackAdapter`] edits portable markup verbatim in a plain buffer.
//!
//! Which one a session gets is decided by an async [`ComponentLoader`]
//! check at attach time.

mod fallback;
mod rich;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

pub use fallback::FallbackAdapter;
pub use rich::RichAdapter;

use crate::convert::HEADING_LEVELS;
use crate::editor::BlockEditor;
use crate::error::{LoadError, SessionError};

/// Which adapter variant backs a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Rich,
    Fallback,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rich => write!(f, "rich"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A toolbar formatting command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Heading(u8),
    BulletList,
    OrderedList,
}

impl FromStr for FormatCommand {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bold" => Ok(Self::Bold),
            "italic" => Ok(Self::Italic),
            "bullet_list" | "bullet" => Ok(Self::BulletList),
            "ordered_list" | "ordered" => Ok(Self::OrderedList),
            other => other
                .strip_prefix('h')
                .and_then(|level| level.parse::<u8>().ok())
                .map(Self::Heading)
                .ok_or_else(|| SessionError::UnknownCommand(s.to_string())),
        }
    }
}

impl fmt::Display for FormatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bold => write!(f, "bold"),
            Self::Italic => write!(f, "italic"),
            Self::Heading(level) => write!(f, "h{level}"),
            Self::BulletList => write!(f, "bullet_list"),
            Self::OrderedList => write!(f, "ordered_list"),
        }
    }
}

/// Capability set of an editing surface.
///
/// Content going in and out is always portable markup; any structured
/// representation stays behind the adapter.
pub trait EditorSurface {
    fn kind(&self) -> AdapterKind;

    /// Current content as portable markup.
    fn content(&self) -> String;

    /// Type text at the insertion point.
    fn insert_text(&mut self, text: &str);

    /// Delete one character before the insertion point.
    fn delete_back(&mut self) -> bool;

    /// Replace the whole content with `markup`.
    fn replace_content(&mut self, markup: &str);

    /// The content as markup if the surface changed since the last call.
    fn take_change(&mut self) -> Option<String>;

    /// Run a formatting command.
    ///
    /// # Errors
    /// Returns [`SessionError::CommandUnavailable`] on surfaces without
    /// formatting, or the component's own error for a rejected command.
    fn apply(&mut self, command: FormatCommand) -> Result<(), SessionError>;

    fn supports_formatting(&self) -> bool;

    fn focus(&mut self);

    fn blur(&mut self);

    fn is_focused(&self) -> bool;

    /// Free the underlying component. The surface is unusable afterwards.
    fn release(&mut self);
}

/// A structured rich-text component, driven through html-like text.
pub trait RichComponent {
    fn html(&self) -> String;

    /// Load content. Loading is not an update.
    fn set_html(&mut self, html: &str);

    fn insert_text(&mut self, text: &str);

    fn delete_back(&mut self) -> bool;

    /// Run a formatting command on the current block.
    ///
    /// # Errors
    /// Returns an error when the component rejects the command.
    fn run(&mut self, command: FormatCommand) -> Result<(), SessionError>;

    fn focus(&mut self);

    fn blur(&mut self);

    fn is_focused(&self) -> bool;

    /// Whether the document changed since the last call.
    fn take_updated(&mut self) -> bool;

    fn destroy(&mut self);
}

/// Construction options handed to a component loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentOptions {
    /// Shown by the component while the document is empty.
    pub placeholder: String,
    pub heading_levels: Vec<u8>,
}

impl Default for ComponentOptions {
    fn default() -> Self {
        Self {
            placeholder: "Start typing...".to_string(),
            heading_levels: HEADING_LEVELS.to_vec(),
        }
    }
}

/// Async capability check for the rich component.
pub trait ComponentLoader {
    /// Try to construct a rich component.
    ///
    /// # Errors
    /// Returns a [`LoadError`] when no component can be provided. Callers
    /// recover by falling back to plain text.
    fn load(
        &self,
        options: &ComponentOptions,
    ) -> impl Future<Output = Result<Box<dyn RichComponent>, LoadError>>;
}

/// Provides the built-in [`BlockEditor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLoader;

impl ComponentLoader for BuiltinLoader {
    async fn load(
        &self,
        options: &ComponentOptions,
    ) -> Result<Box<dyn RichComponent>, LoadError> {
        if options.heading_levels.is_empty() {
            return Err(LoadError::Failed("no heading levels configured".to_string()));
        }
        Ok(Box::new(BlockEditor::new(&options.heading_levels)))
    }
}

/// Never provides a component; sessions attached with it use plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLoader;

impl ComponentLoader for UnavailableLoader {
    async fn load(
        &self,
        _options: &ComponentOptions,
    ) -> Result<Box<dyn RichComponent>, LoadError> {
        Err(LoadError::Missing)
    }
}
