//! Conversion between structured text and portable markup.
//!
//! Both directions are lossy on purpose and are not exact inverses. They
//! never fail: markup they don't recognize passes through as text, and
//! structured content they don't recognize is stripped.
//!
//! - [`to_portable_markup`]: html-like structured text to markup
//! - [`to_structured_text`]: markup to html-like structured text
//! - [`fragment`]: the structured node tree used by rich components

pub mod fragment;
pub mod passes;

pub use fragment::{Fragment, HEADING_LEVELS, parse_structured, render_structured};
pub use passes::{MARKUP_PASSES, RewritePass, STRUCTURED_PASSES};

/// Convert html-like structured text to portable markup.
pub fn to_portable_markup(structured: &str) -> String {
    passes::run(MARKUP_PASSES, structured)
}

/// Convert portable markup to html-like structured text.
pub fn to_structured_text(markup: &str) -> String {
    passes::run(STRUCTURED_PASSES, markup)
}

/// Markup for a fragment tree.
pub fn fragments_to_markup(fragments: &[Fragment]) -> String {
    to_portable_markup(&render_structured(fragments))
}

/// Fragment tree for a markup string.
pub fn markup_to_fragments(markup: &str) -> Vec<Fragment> {
    parse_structured(&to_structured_text(markup))
}
