//! Structured document fragments.
//!
//! The closed node set a rich component works with, plus a tolerant parser
//! from html-like structured text and a compact renderer back to it.
//! Unknown tags are dropped and their text is kept.

use once_cell::sync::Lazy;
use regex::Regex;

/// Heading levels the structured model supports.
pub const HEADING_LEVELS: [u8; 3] = [2, 3, 4];

/// One node of a structured document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Heading { level: u8, children: Vec<Fragment> },
    Paragraph(Vec<Fragment>),
    List { ordered: bool, items: Vec<Fragment> },
    ListItem(Vec<Fragment>),
    Bold(Vec<Fragment>),
    Italic(Vec<Fragment>),
    LineBreak,
    Text(String),
}

impl Fragment {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn paragraph(s: impl Into<String>) -> Self {
        Self::Paragraph(vec![Self::text(s)])
    }

    /// True for nodes that occupy their own block.
    pub const fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Heading { .. } | Self::Paragraph(_) | Self::List { .. } | Self::ListItem(_)
        )
    }

    /// Concatenated text, line breaks as `\n`.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(s) => out.push_str(s),
            Self::LineBreak => out.push('\n'),
            Self::Heading { children, .. }
            | Self::Paragraph(children)
            | Self::ListItem(children)
            | Self::Bold(children)
            | Self::Italic(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Self::List { items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    item.collect_text(out);
                }
            }
        }
    }

    /// Inline children of a leaf block, or `None` for containers and inlines.
    pub fn inline_children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match self {
            Self::Heading { children, .. } | Self::Paragraph(children) | Self::ListItem(children) => {
                Some(children)
            }
            _ => None,
        }
    }

    /// Take ownership of the inline content of a leaf block.
    pub fn into_inline(self) -> Vec<Self> {
        match self {
            Self::Heading { children, .. }
            | Self::Paragraph(children)
            | Self::ListItem(children) => children,
            Self::List { items, .. } => join_with_breaks(items.into_iter().map(Self::into_inline)),
            inline => vec![inline],
        }
    }
}

/// Render fragments as compact structured text (no whitespace between blocks).
pub fn render_structured(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        render_into(fragment, &mut out);
    }
    out
}

fn render_into(fragment: &Fragment, out: &mut String) {
    let wrap = |out: &mut String, tag: &str, children: &[Fragment]| {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        for child in children {
            render_into(child, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    };
    match fragment {
        Fragment::Heading { level, children } => wrap(out, &format!("h{level}"), children),
        Fragment::Paragraph(children) => wrap(out, "p", children),
        Fragment::List { ordered, items } => wrap(out, if *ordered { "ol" } else { "ul" }, items),
        Fragment::ListItem(children) => wrap(out, "li", children),
        // An empty mark renders nothing rather than an empty `****` pair.
        Fragment::Bold(children) | Fragment::Italic(children) if children.is_empty() => {}
        Fragment::Bold(children) => wrap(out, "strong", children),
        Fragment::Italic(children) => wrap(out, "em", children),
        Fragment::LineBreak => out.push_str("<br>"),
        Fragment::Text(s) => escape_into(s, out),
    }
}

fn escape_into(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)[^>]*>|[^<]+|<").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Heading(u8),
    Paragraph,
    List(bool),
    Item,
    Bold,
    Italic,
}

impl FrameKind {
    fn for_tag(tag: &str) -> Option<Self> {
        match tag {
            "h2" => Some(Self::Heading(2)),
            "h3" => Some(Self::Heading(3)),
            "h4" => Some(Self::Heading(4)),
            // Unsupported heading levels degrade to paragraphs.
            "h1" | "h5" | "h6" | "p" => Some(Self::Paragraph),
            "ul" => Some(Self::List(false)),
            "ol" => Some(Self::List(true)),
            "li" => Some(Self::Item),
            "strong" | "b" => Some(Self::Bold),
            "em" | "i" => Some(Self::Italic),
            _ => None,
        }
    }

    const fn closes_on_block(self) -> bool {
        matches!(self, Self::Heading(_) | Self::Paragraph | Self::Bold | Self::Italic)
    }
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    tag: String,
    children: Vec<Fragment>,
    /// Loose inline content at the root, gathered into a paragraph.
    loose: Vec<Fragment>,
}

impl Frame {
    fn new(kind: FrameKind, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_string(),
            children: Vec::new(),
            loose: Vec::new(),
        }
    }

    fn push(&mut self, child: Fragment) {
        match self.kind {
            FrameKind::Root => self.push_root(child),
            FrameKind::List(_) => self.push_list(child),
            FrameKind::Item => match child {
                Fragment::Paragraph(_) | Fragment::Heading { .. } => {
                    if !self.children.is_empty() {
                        self.children.push(Fragment::LineBreak);
                    }
                    for inline in child.into_inline() {
                        push_inline(&mut self.children, inline);
                    }
                }
                Fragment::List { .. } => self.children.push(child),
                other => push_inline(&mut self.children, other),
            },
            FrameKind::Heading(_) | FrameKind::Paragraph | FrameKind::Bold | FrameKind::Italic => {
                if child.is_block() && !self.children.is_empty() {
                    self.children.push(Fragment::LineBreak);
                }
                for inline in child.into_inline() {
                    push_inline(&mut self.children, inline);
                }
            }
        }
    }

    fn push_root(&mut self, child: Fragment) {
        match child {
            Fragment::ListItem(_) => {
                self.flush_loose();
                if let Some(Fragment::List { items, .. }) = self.children.last_mut() {
                    items.push(child);
                } else {
                    self.children.push(Fragment::List {
                        ordered: false,
                        items: vec![child],
                    });
                }
            }
            block if block.is_block() => {
                self.flush_loose();
                self.children.push(block);
            }
            Fragment::Text(s) if self.loose.is_empty() && s.trim().is_empty() => {}
            inline => push_inline(&mut self.loose, inline),
        }
    }

    fn push_list(&mut self, child: Fragment) {
        match child {
            Fragment::ListItem(_) => self.children.push(child),
            Fragment::Text(s) if s.trim().is_empty() => {}
            Fragment::List { .. } => match self.children.last_mut() {
                Some(Fragment::ListItem(children)) => children.push(child),
                _ => self.children.push(Fragment::ListItem(vec![child])),
            },
            other => self.children.push(Fragment::ListItem(other.into_inline())),
        }
    }

    fn flush_loose(&mut self) {
        if self.loose.is_empty() {
            return;
        }
        let loose = std::mem::take(&mut self.loose);
        let blank = loose
            .iter()
            .all(|f| matches!(f, Fragment::Text(s) if s.trim().is_empty()));
        if !blank {
            self.children.push(Fragment::Paragraph(loose));
        }
    }

    fn finish(self) -> Fragment {
        match self.kind {
            // The root is drained by `parse_structured`, never finished.
            FrameKind::Root | FrameKind::Paragraph => Fragment::Paragraph(self.children),
            FrameKind::Heading(level) => Fragment::Heading {
                level,
                children: self.children,
            },
            FrameKind::List(ordered) => Fragment::List {
                ordered,
                items: self.children,
            },
            FrameKind::Item => Fragment::ListItem(self.children),
            FrameKind::Bold => Fragment::Bold(self.children),
            FrameKind::Italic => Fragment::Italic(self.children),
        }
    }
}

fn push_inline(children: &mut Vec<Fragment>, child: Fragment) {
    if let Fragment::Text(s) = &child
        && let Some(Fragment::Text(last)) = children.last_mut()
    {
        last.push_str(s);
        return;
    }
    children.push(child);
}

fn join_with_breaks(groups: impl Iterator<Item = Vec<Fragment>>) -> Vec<Fragment> {
    let mut out = Vec::new();
    for (i, group) in groups.enumerate() {
        if i > 0 {
            out.push(Fragment::LineBreak);
        }
        out.extend(group);
    }
    out
}

/// Parse html-like structured text into top-level block fragments.
///
/// Never fails: unknown tags are skipped, stray closing tags ignored,
/// unclosed tags closed at the end, and loose inline content at the top
/// level becomes a paragraph.
pub fn parse_structured(input: &str) -> Vec<Fragment> {
    let mut stack = vec![Frame::new(FrameKind::Root, "")];

    for token in TOKEN.captures_iter(input) {
        let Some(name) = token.get(2) else {
            let raw = &token[0];
            if let Some(top) = stack.last_mut() {
                top.push(Fragment::Text(decode_text(raw)));
            }
            continue;
        };
        let tag = name.as_str().to_ascii_lowercase();
        let closing = !token[1].is_empty();

        if tag == "br" {
            if let Some(top) = stack.last_mut() {
                top.push(Fragment::LineBreak);
            }
            continue;
        }
        let Some(kind) = FrameKind::for_tag(&tag) else {
            continue;
        };

        if closing {
            if let Some(pos) = stack.iter().rposition(|f| f.tag == tag) {
                while stack.len() > pos {
                    pop_into_parent(&mut stack);
                }
            }
            continue;
        }

        match kind {
            FrameKind::Heading(_) | FrameKind::Paragraph | FrameKind::List(_) => {
                while stack.last().is_some_and(|f| f.kind.closes_on_block()) {
                    pop_into_parent(&mut stack);
                }
            }
            FrameKind::Item => {
                while stack
                    .last()
                    .is_some_and(|f| !matches!(f.kind, FrameKind::Root | FrameKind::List(_)))
                {
                    pop_into_parent(&mut stack);
                }
            }
            _ => {}
        }
        stack.push(Frame::new(kind, &tag));
    }

    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }
    let Some(mut root) = stack.pop() else {
        return Vec::new();
    };
    root.flush_loose();
    root.children
}

fn pop_into_parent(stack: &mut Vec<Frame>) {
    if stack.len() <= 1 {
        return;
    }
    if let Some(frame) = stack.pop() {
        let fragment = frame.finish();
        if let Some(parent) = stack.last_mut() {
            parent.push(fragment);
        }
    }
}

fn decode_text(raw: &str) -> String {
    super::passes::decode_entities(raw)
}
