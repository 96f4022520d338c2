use crate::convert::{Fragment, HEADING_LEVELS, parse_structured, render_structured};
use crate::error::SessionError;

/// A minimal structured editor over top-level block fragments.
///
/// Edits and formatting commands apply to the active block, which follows
/// the typing position. Formatting wraps or unwraps the whole block
/// content; there is no sub-block selection.
#[derive(Debug, Clone)]
pub struct BlockEditor {
    blocks: Vec<Fragment>,
    active: usize,
    heading_levels: Vec<u8>,
    focused: bool,
    updated: bool,
}

impl Default for BlockEditor {
    fn default() -> Self {
        Self::new(&HEADING_LEVELS)
    }
}

impl BlockEditor {
    pub fn new(heading_levels: &[u8]) -> Self {
        Self {
            blocks: Vec::new(),
            active: 0,
            heading_levels: heading_levels.to_vec(),
            focused: false,
            updated: false,
        }
    }

    pub fn blocks(&self) -> &[Fragment] {
        &self.blocks
    }

    pub const fn active(&self) -> usize {
        self.active
    }

    /// Current document as structured text. An empty document is one
    /// empty paragraph.
    pub fn html(&self) -> String {
        if self.blocks.is_empty() {
            return "<p></p>".to_string();
        }
        render_structured(&self.blocks)
    }

    /// Load a document. Loading is not an edit and raises no update.
    pub fn set_html(&mut self, html: &str) {
        self.blocks = parse_structured(html);
        self.active = self.blocks.len().saturating_sub(1);
    }

    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    pub const fn focus(&mut self) {
        self.focused = true;
    }

    pub const fn blur(&mut self) {
        self.focused = false;
    }

    /// Whether the document changed since the last call.
    pub const fn take_updated(&mut self) -> bool {
        let updated = self.updated;
        self.updated = false;
        updated
    }

    /// Drop the document.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.active = 0;
        self.focused = false;
        self.updated = false;
    }

    /// Type text into the active block.
    ///
    /// A blank line (`\n\n`) starts a new block: a new item inside a list,
    /// a new paragraph elsewhere. A single `\n` is a line break.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        for (i, segment) in text.split("\n\n").enumerate() {
            if i > 0 {
                self.split_block();
            }
            for (j, line) in segment.split('\n').enumerate() {
                if j > 0 {
                    self.active_inline().push(Fragment::LineBreak);
                }
                if !line.is_empty() {
                    append_text(self.active_inline(), line);
                }
            }
        }
        self.updated = true;
    }

    /// Delete the last character of the active block. An empty block is
    /// removed and the previous one becomes active.
    pub fn delete_back(&mut self) -> bool {
        if self.blocks.is_empty() {
            return false;
        }
        if pop_last_char(self.active_inline()) || self.drop_empty_list_item() {
            self.updated = true;
            return true;
        }
        if self.active == 0 {
            return false;
        }
        self.remove_active_if_empty();
        self.updated = true;
        true
    }

    /// Wrap the active block's content in bold, or unwrap it.
    pub fn toggle_bold(&mut self) {
        toggle_mark(self.active_inline(), Fragment::Bold, |f| match f {
            Fragment::Bold(children) => Ok(children),
            other => Err(other),
        });
        self.updated = true;
    }

    /// Wrap the active block's content in italic, or unwrap it.
    pub fn toggle_italic(&mut self) {
        toggle_mark(self.active_inline(), Fragment::Italic, |f| match f {
            Fragment::Italic(children) => Ok(children),
            other => Err(other),
        });
        self.updated = true;
    }

    /// Turn the active block into a heading, or back into a paragraph when
    /// it already is a heading of `level`.
    ///
    /// # Errors
    /// Returns [`SessionError::UnsupportedHeading`] for levels outside the
    /// configured set.
    pub fn toggle_heading(&mut self, level: u8) -> Result<(), SessionError> {
        if !self.heading_levels.contains(&level) {
            return Err(SessionError::UnsupportedHeading(level));
        }
        self.ensure_block();
        let index = self.detach_last_list_item();
        let block = std::mem::replace(&mut self.blocks[index], Fragment::LineBreak);
        self.blocks[index] = match block {
            Fragment::Heading { level: current, children } if current == level => {
                Fragment::Paragraph(children)
            }
            other => Fragment::Heading {
                level,
                children: other.into_inline(),
            },
        };
        self.updated = true;
        Ok(())
    }

    /// Turn the active block into a one-item list, unwrap a list of the
    /// same kind into paragraphs, or switch a list to the other kind.
    pub fn toggle_list(&mut self, ordered: bool) {
        self.ensure_block();
        let index = self.active;
        let block = std::mem::replace(&mut self.blocks[index], Fragment::LineBreak);
        match block {
            Fragment::List { ordered: current, items } if current == ordered => {
                let paragraphs: Vec<_> = items
                    .into_iter()
                    .map(|item| Fragment::Paragraph(item.into_inline()))
                    .collect();
                let count = paragraphs.len();
                self.blocks.splice(index..=index, paragraphs);
                self.active = index + count.saturating_sub(1);
                if count == 0 {
                    self.active = index.saturating_sub(1).min(self.blocks.len().saturating_sub(1));
                }
            }
            Fragment::List { items, .. } => {
                self.blocks[index] = Fragment::List { ordered, items };
            }
            other => {
                self.blocks[index] = Fragment::List {
                    ordered,
                    items: vec![Fragment::ListItem(other.into_inline())],
                };
            }
        }
        self.updated = true;
    }

    fn ensure_block(&mut self) {
        if self.blocks.is_empty() {
            self.blocks.push(Fragment::Paragraph(Vec::new()));
            self.active = 0;
        }
    }

    /// Inline content edits land in: the active block, or the last item
    /// of an active list.
    fn active_inline(&mut self) -> &mut Vec<Fragment> {
        self.ensure_block();
        let index = self.active;
        if let Fragment::List { items, .. } = &mut self.blocks[index] {
            if !matches!(items.last(), Some(Fragment::ListItem(_))) {
                items.push(Fragment::ListItem(Vec::new()));
            }
        } else if self.blocks[index].inline_children_mut().is_none() {
            let block = std::mem::replace(&mut self.blocks[index], Fragment::LineBreak);
            self.blocks[index] = Fragment::Paragraph(block.into_inline());
        }
        match &mut self.blocks[index] {
            Fragment::List { items, .. } => match items.last_mut() {
                Some(Fragment::ListItem(children)) => children,
                _ => unreachable!("list ends with an item"),
            },
            Fragment::Heading { children, .. }
            | Fragment::Paragraph(children)
            | Fragment::ListItem(children) => children,
            _ => unreachable!("active block holds inline content"),
        }
    }

    fn split_block(&mut self) {
        self.ensure_block();
        if let Fragment::List { items, .. } = &mut self.blocks[self.active] {
            items.push(Fragment::ListItem(Vec::new()));
            return;
        }
        self.active += 1;
        self.blocks
            .insert(self.active, Fragment::Paragraph(Vec::new()));
    }

    /// For an active list, move its last item out into its own paragraph
    /// right after the list and make that active. Returns the active index.
    fn detach_last_list_item(&mut self) -> usize {
        let index = self.active;
        let Fragment::List { items, .. } = &mut self.blocks[index] else {
            return index;
        };
        let item = items.pop().map_or_else(Vec::new, Fragment::into_inline);
        if items.is_empty() {
            self.blocks[index] = Fragment::Paragraph(item);
            return index;
        }
        self.blocks.insert(index + 1, Fragment::Paragraph(item));
        self.active = index + 1;
        self.active
    }

    /// Remove an empty last item from the active list. A list left with a
    /// single empty item turns into an empty paragraph.
    fn drop_empty_list_item(&mut self) -> bool {
        let index = self.active;
        let Fragment::List { items, .. } = &mut self.blocks[index] else {
            return false;
        };
        if !items.last().is_some_and(|item| item.plain_text().is_empty()) {
            return false;
        }
        if items.len() > 1 {
            items.pop();
        } else {
            self.blocks[index] = Fragment::Paragraph(Vec::new());
        }
        true
    }

    fn remove_active_if_empty(&mut self) {
        let block = &self.blocks[self.active];
        let empty = match block {
            Fragment::List { items, .. } => items.iter().all(|i| i.plain_text().is_empty()),
            other => other.plain_text().is_empty(),
        };
        if let Fragment::List { items, .. } = &mut self.blocks[self.active]
            && items.len() > 1
        {
            items.pop();
            return;
        }
        if empty {
            self.blocks.remove(self.active);
            self.active = self.active.saturating_sub(1);
        }
    }
}

fn append_text(children: &mut Vec<Fragment>, text: &str) {
    match children.last_mut() {
        Some(Fragment::Text(last)) => last.push_str(text),
        Some(Fragment::Bold(inner) | Fragment::Italic(inner)) => append_text(inner, text),
        _ => children.push(Fragment::text(text)),
    }
}

fn pop_last_char(children: &mut Vec<Fragment>) -> bool {
    let Some(last) = children.last_mut() else {
        return false;
    };
    let removed = match last {
        Fragment::Text(s) => s.pop().is_some(),
        Fragment::Bold(inner) | Fragment::Italic(inner) => pop_last_char(inner),
        Fragment::LineBreak => {
            children.pop();
            return true;
        }
        _ => false,
    };
    let now_empty = match children.last() {
        Some(Fragment::Text(s)) => s.is_empty(),
        Some(Fragment::Bold(inner) | Fragment::Italic(inner)) => inner.is_empty(),
        _ => false,
    };
    if now_empty {
        children.pop();
    }
    removed || (now_empty && pop_last_char(children))
}

fn toggle_mark(
    children: &mut Vec<Fragment>,
    wrap: fn(Vec<Fragment>) -> Fragment,
    unwrap: fn(Fragment) -> Result<Vec<Fragment>, Fragment>,
) {
    let mut content = std::mem::take(children);
    if content.len() == 1 {
        match unwrap(content.remove(0)) {
            Ok(inner) => {
                *children = inner;
                return;
            }
            Err(only) => content.push(only),
        }
    }
    *children = vec![wrap(content)];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::to_portable_markup;

    fn markup(editor: &BlockEditor) -> String {
        to_portable_markup(&editor.html())
    }

    #[test]
    fn test_empty_editor_is_one_empty_paragraph() {
        let editor = BlockEditor::default();
        assert_eq!(editor.html(), "<p></p>");
        assert_eq!(markup(&editor), "");
    }

    #[test]
    fn test_set_html_is_not_an_update() {
        let mut editor = BlockEditor::default();
        editor.set_html("<h2>Title</h2>");
        assert!(!editor.take_updated());
        assert_eq!(editor.html(), "<h2>Title</h2>");
    }

    #[test]
    fn test_insert_text_appends_to_active_block() {
        let mut editor = BlockEditor::default();
        editor.set_html("<h2>Tit</h2>");
        editor.insert_text("le");
        assert!(editor.take_updated());
        assert!(!editor.take_updated());
        assert_eq!(markup(&editor), "## Title");
    }

    #[test]
    fn test_blank_line_starts_new_paragraph() {
        let mut editor = BlockEditor::default();
        editor.insert_text("one\n\ntwo\nthree");
        assert_eq!(editor.html(), "<p>one</p><p>two<br>three</p>");
        assert_eq!(editor.active(), 1);
    }

    #[test]
    fn test_blank_line_in_list_adds_item() {
        let mut editor = BlockEditor::default();
        editor.set_html("<ul><li>a</li></ul>");
        editor.insert_text("\n\nb");
        assert_eq!(markup(&editor), "- a\n- b");
    }

    #[test]
    fn test_delete_back_drops_empty_list_item_in_first_block() {
        let mut editor = BlockEditor::default();
        editor.set_html("<ul><li>a</li></ul>");
        editor.insert_text("\n\n");
        assert_eq!(editor.html(), "<ul><li>a</li><li></li></ul>");
        assert!(editor.delete_back());
        assert_eq!(markup(&editor), "- a");
        assert!(editor.delete_back());
        assert_eq!(editor.html(), "<ul><li></li></ul>");
    }

    #[test]
    fn test_delete_back_on_lone_empty_item_leaves_paragraph() {
        let mut editor = BlockEditor::default();
        editor.set_html("<ul><li></li></ul>");
        assert!(editor.delete_back());
        assert_eq!(editor.html(), "<p></p>");
        assert!(!editor.delete_back());
    }

    #[test]
    fn test_toggle_bold_wraps_and_unwraps() {
        let mut editor = BlockEditor::default();
        editor.insert_text("loud");
        editor.toggle_bold();
        assert_eq!(markup(&editor), "**loud**");
        editor.insert_text("er");
        assert_eq!(markup(&editor), "**louder**");
        editor.toggle_bold();
        assert_eq!(markup(&editor), "louder");
    }

    #[test]
    fn test_bold_on_empty_block_marks_following_text() {
        let mut editor = BlockEditor::default();
        editor.toggle_bold();
        assert_eq!(markup(&editor), "");
        editor.insert_text("new");
        assert_eq!(markup(&editor), "**new**");
    }

    #[test]
    fn test_toggle_italic() {
        let mut editor = BlockEditor::default();
        editor.insert_text("soft");
        editor.toggle_italic();
        assert_eq!(markup(&editor), "*soft*");
    }

    #[test]
    fn test_toggle_heading_levels() {
        let mut editor = BlockEditor::default();
        editor.insert_text("Title");
        editor.toggle_heading(3).unwrap();
        assert_eq!(markup(&editor), "### Title");
        editor.toggle_heading(2).unwrap();
        assert_eq!(markup(&editor), "## Title");
        editor.toggle_heading(2).unwrap();
        assert_eq!(markup(&editor), "Title");
    }

    #[test]
    fn test_toggle_heading_rejects_unconfigured_level() {
        let mut editor = BlockEditor::new(&[2, 3]);
        editor.insert_text("x");
        assert_eq!(
            editor.toggle_heading(4),
            Err(SessionError::UnsupportedHeading(4))
        );
        assert_eq!(markup(&editor), "x");
    }

    #[test]
    fn test_toggle_bullet_list_round_trip() {
        let mut editor = BlockEditor::default();
        editor.insert_text("item");
        editor.toggle_list(false);
        assert_eq!(editor.html(), "<ul><li>item</li></ul>");
        editor.toggle_list(true);
        assert_eq!(editor.html(), "<ol><li>item</li></ol>");
        assert_eq!(markup(&editor), "- item");
        editor.toggle_list(true);
        assert_eq!(editor.html(), "<p>item</p>");
    }

    #[test]
    fn test_heading_on_list_moves_last_item_out() {
        let mut editor = BlockEditor::default();
        editor.set_html("<ul><li>a</li><li>b</li></ul>");
        editor.toggle_heading(2).unwrap();
        assert_eq!(editor.html(), "<ul><li>a</li></ul><h2>b</h2>");
        assert_eq!(editor.active(), 1);
    }

    #[test]
    fn test_delete_back_removes_chars_then_empty_block() {
        let mut editor = BlockEditor::default();
        editor.insert_text("a\n\nb");
        assert!(editor.delete_back());
        assert_eq!(editor.html(), "<p>a</p><p></p>");
        assert!(editor.delete_back());
        assert_eq!(editor.html(), "<p>a</p>");
        assert!(editor.delete_back());
        assert_eq!(editor.html(), "<p></p>");
        assert!(!editor.delete_back());
    }

    #[test]
    fn test_delete_back_inside_bold() {
        let mut editor = BlockEditor::default();
        editor.insert_text("ab");
        editor.toggle_bold();
        assert!(editor.delete_back());
        assert_eq!(editor.html(), "<p><strong>a</strong></p>");
        assert!(editor.delete_back());
        assert_eq!(editor.html(), "<p></p>");
    }

    #[test]
    fn test_clear_drops_document() {
        let mut editor = BlockEditor::default();
        editor.insert_text("x");
        editor.focus();
        editor.clear();
        assert!(editor.blocks().is_empty());
        assert!(!editor.is_focused());
        assert!(!editor.take_updated());
    }
}
