use super::{AdapterKind, EditorSurface, FormatCommand, RichComponent};
use crate::convert::{to_portable_markup, to_structured_text};
use crate::editor::BlockEditor;
use crate::error::SessionError;

/// Surface backed by a structured rich component.
///
/// Markup is converted to structured text when loaded and the component's
/// document is converted back to markup whenever it is read.
pub struct RichAdapter {
    component: Box<dyn RichComponent>,
    replaced: bool,
}

impl RichAdapter {
    /// Load `initial_markup` into `component`. Loading is not a change.
    pub fn new(mut component: Box<dyn RichComponent>, initial_markup: &str) -> Self {
        component.set_html(&to_structured_text(initial_markup));
        Self {
            component,
            replaced: false,
        }
    }

    /// The component's document as structured text.
    pub fn html(&self) -> String {
        self.component.html()
    }
}

impl EditorSurface for RichAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Rich
    }

    fn content(&self) -> String {
        to_portable_markup(&self.component.html())
    }

    fn insert_text(&mut self, text: &str) {
        self.component.insert_text(text);
    }

    fn delete_back(&mut self) -> bool {
        self.component.delete_back()
    }

    fn replace_content(&mut self, markup: &str) {
        self.component.set_html(&to_structured_text(markup));
        self.replaced = true;
    }

    fn take_change(&mut self) -> Option<String> {
        let updated = self.component.take_updated();
        let replaced = std::mem::take(&mut self.replaced);
        (updated || replaced).then(|| self.content())
    }

    fn apply(&mut self, command: FormatCommand) -> Result<(), SessionError> {
        self.component.run(command)
    }

    fn supports_formatting(&self) -> bool {
        true
    }

    fn focus(&mut self) {
        self.component.focus();
    }

    fn blur(&mut self) {
        self.component.blur();
    }

    fn is_focused(&self) -> bool {
        self.component.is_focused()
    }

    fn release(&mut self) {
        self.component.destroy();
    }
}

impl RichComponent for BlockEditor {
    fn html(&self) -> String {
        Self::html(self)
    }

    fn set_html(&mut self, html: &str) {
        Self::set_html(self, html);
    }

    fn insert_text(&mut self, text: &str) {
        Self::insert_text(self, text);
    }

    fn delete_back(&mut self) -> bool {
        Self::delete_back(self)
    }

    fn run(&mut self, command: FormatCommand) -> Result<(), SessionError> {
        match command {
            FormatCommand::Bold => self.toggle_bold(),
            FormatCommand::Italic => self.toggle_italic(),
            FormatCommand::Heading(level) => self.toggle_heading(level)?,
            FormatCommand::BulletList => self.toggle_list(false),
            FormatCommand::OrderedList => self.toggle_list(true),
        }
        Ok(())
    }

    fn focus(&mut self) {
        Self::focus(self);
    }

    fn blur(&mut self) {
        Self::blur(self);
    }

    fn is_focused(&self) -> bool {
        Self::is_focused(self)
    }

    fn take_updated(&mut self) -> bool {
        Self::take_updated(self)
    }

    fn destroy(&mut self) {
        self.clear();
    }
}
