use ropey::Rope;

/// Every line break the rope recognizes.
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}',
];

/// Cursor position in a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
}

impl Cursor {
    /// Create a cursor at a specific position.
    pub const fn at(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Plain multi-line text surface backed by a rope.
///
/// This is the degraded editing surface: it holds portable markup
/// verbatim. `changed` is raised by every mutation and lowered by
/// [`TextBuffer::take_change`], which is how the surface reports edits.
pub struct TextBuffer {
    rope: Rope,
    cursor: Cursor,
    changed: bool,
}

impl TextBuffer {
    /// Create a buffer holding `text` with the cursor at the end.
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self {
            rope: Rope::from_str(text),
            cursor: Cursor::default(),
            changed: false,
        };
        buf.move_to_end();
        buf
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without its line break).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches(LINE_BREAKS).to_string())
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole content; the cursor moves to the end.
    ///
    /// Returns `true` if the text actually changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.rope == text {
            return false;
        }
        self.rope = Rope::from_str(text);
        self.move_to_end();
        self.changed = true;
        true
    }

    /// Insert a string at the cursor position; the cursor ends up after it.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let char_idx = self.cursor_char_idx();
        self.rope.insert(char_idx, s);
        self.place_cursor(char_idx + s.chars().count());
        self.changed = true;
    }

    /// Delete the character before the cursor (Backspace).
    ///
    /// Returns `true` if a character was deleted.
    pub fn delete_back(&mut self) -> bool {
        let char_idx = self.cursor_char_idx();
        if char_idx == 0 {
            return false;
        }
        self.rope.remove(char_idx - 1..char_idx);
        self.place_cursor(char_idx - 1);
        self.changed = true;
        true
    }

    /// Move cursor to a specific line and column, clamped to the text.
    pub fn move_to(&mut self, line: usize, col: usize) {
        let max_line = self.line_count().saturating_sub(1);
        self.cursor.line = line.min(max_line);
        let line_text = self.line_at(self.cursor.line).unwrap_or_default();
        let mut col = col.min(line_text.len());
        while !line_text.is_char_boundary(col) {
            col -= 1;
        }
        self.cursor.col = col;
    }

    /// Move cursor to the end of the buffer.
    pub fn move_to_end(&mut self) {
        self.place_cursor(self.rope.len_chars());
    }

    /// The current text if it changed since the last call.
    pub fn take_change(&mut self) -> Option<String> {
        if !self.changed {
            return None;
        }
        self.changed = false;
        Some(self.text())
    }

    /// Put the cursor at a rope char index. Lines are counted the way the
    /// rope counts them, so `\r`, U+0085 and U+2028 break lines too.
    fn place_cursor(&mut self, char_idx: usize) {
        let char_idx = char_idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_idx);
        let line_start = self.rope.line_to_char(line);
        self.cursor.line = line;
        self.cursor.col = self.rope.slice(line_start..char_idx).len_bytes();
    }

    /// Convert cursor position to a ropey char index.
    fn cursor_char_idx(&self) -> usize {
        let line_idx = self.cursor.line.min(self.rope.len_lines().saturating_sub(1));
        let line = self.rope.line(line_idx);
        let byte_col = self.cursor.col.min(line.len_bytes());
        self.rope.line_to_char(line_idx) + line.byte_to_char(byte_col)
    }
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("cursor", &self.cursor)
            .field("changed", &self.changed)
            .finish()
    }
}
