use super::{AdapterKind, EditorSurface, FormatCommand};
use crate::editor::TextBuffer;
use crate::error::SessionError;

/// Plain text surface holding portable markup verbatim.
///
/// Used when the rich component cannot be loaded. There is no toolbar.
#[derive(Debug)]
pub struct FallbackAdapter {
    buffer: TextBuffer,
    focused: bool,
}

impl FallbackAdapter {
    pub fn new(initial_markup: &str) -> Self {
        Self {
            buffer: TextBuffer::from_text(initial_markup),
            focused: false,
        }
    }

    pub const fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }
}

impl EditorSurface for FallbackAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Fallback
    }

    fn content(&self) -> String {
        self.buffer.text()
    }

    fn insert_text(&mut self, text: &str) {
        self.buffer.insert_str(text);
    }

    fn delete_back(&mut self) -> bool {
        self.buffer.delete_back()
    }

    fn replace_content(&mut self, markup: &str) {
        self.buffer.set_text(markup);
    }

    fn take_change(&mut self) -> Option<String> {
        self.buffer.take_change()
    }

    fn apply(&mut self, _command: FormatCommand) -> Result<(), SessionError> {
        Err(SessionError::CommandUnavailable)
    }

    fn supports_formatting(&self) -> bool {
        false
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn release(&mut self) {
        self.focused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_markup_verbatim() {
        let adapter = FallbackAdapter::new("## Title\n\n- a");
        assert_eq!(adapter.content(), "## Title\n\n- a");
        assert!(!adapter.supports_formatting());
    }

    #[test]
    fn test_typing_appends_and_reports_raw_text() {
        let mut adapter = FallbackAdapter::new("**x**");
        adapter.insert_text(" y");
        assert_eq!(adapter.take_change(), Some("**x** y".to_string()));
        assert_eq!(adapter.take_change(), None);
    }

    #[test]
    fn test_commands_are_unavailable() {
        let mut adapter = FallbackAdapter::new("");
        assert_eq!(
            adapter.apply(FormatCommand::Bold),
            Err(SessionError::CommandUnavailable)
        );
    }

    #[test]
    fn test_backspace_over_unicode_line_break() {
        let mut adapter = FallbackAdapter::new("- a");
        adapter.insert_text("\u{2028}b");
        assert!(adapter.delete_back());
        assert!(adapter.delete_back());
        assert!(adapter.delete_back());
        assert_eq!(adapter.take_change(), Some("- ".to_string()));
    }

    #[test]
    fn test_focus_and_release() {
        let mut adapter = FallbackAdapter::new("");
        adapter.focus();
        assert!(adapter.is_focused());
        adapter.release();
        assert!(!adapter.is_focused());
    }
}
