//! Ordered rewrite passes between structured text and portable markup.
//!
//! Each pass is a small independent rewrite. The pipelines are plain
//! slices so the order is visible in one place and every pass can be
//! exercised on its own. Order matters: `####` must be rewritten before
//! `###` and `##`, and `**` before `*`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A named, independent text rewrite.
#[derive(Debug, Clone, Copy)]
pub struct RewritePass {
    pub name: &'static str,
    rewrite: fn(&str) -> String,
}

impl RewritePass {
    const fn new(name: &'static str, rewrite: fn(&str) -> String) -> Self {
        Self { name, rewrite }
    }

    /// Run this pass alone.
    pub fn apply(&self, input: &str) -> String {
        (self.rewrite)(input)
    }
}

/// Structured (html-like) text to portable markup, in application order.
pub const MARKUP_PASSES: &[RewritePass] = &[
    RewritePass::new("list-item-paragraph", unwrap_list_item_paragraphs),
    RewritePass::new("heading-2", |s| rewrite(&H2_TAG, s, "## ${1}\n\n")),
    RewritePass::new("heading-3", |s| rewrite(&H3_TAG, s, "### ${1}\n\n")),
    RewritePass::new("heading-4", |s| rewrite(&H4_TAG, s, "#### ${1}\n\n")),
    RewritePass::new("strong", |s| rewrite(&STRONG_TAG, s, "**${1}**")),
    RewritePass::new("b", |s| rewrite(&B_TAG, s, "**${1}**")),
    RewritePass::new("em", |s| rewrite(&EM_TAG, s, "*${1}*")),
    RewritePass::new("i", |s| rewrite(&I_TAG, s, "*${1}*")),
    RewritePass::new("list-item", |s| rewrite(&LI_TAG, s, "- ${1}\n")),
    RewritePass::new("list-container", strip_list_containers),
    RewritePass::new("paragraph", |s| rewrite(&P_TAG, s, "${1}\n\n")),
    RewritePass::new("line-break", |s| rewrite(&BR_TAG, s, "\n")),
    RewritePass::new("strip-tags", |s| rewrite(&ANY_TAG, s, "")),
    RewritePass::new("entities", decode_entities),
    RewritePass::new("collapse-newlines", |s| rewrite(&NEWLINE_RUN, s, "\n\n")),
    RewritePass::new("trim", |s| s.trim().to_string()),
];

/// Portable markup to structured (html-like) text, in application order.
pub const STRUCTURED_PASSES: &[RewritePass] = &[
    RewritePass::new("line-endings", |s| rewrite(&CARRIAGE_RETURN, s, "\n")),
    RewritePass::new("heading-4", |s| rewrite(&H4_LINE, s, "<h4>${1}</h4>")),
    RewritePass::new("heading-3", |s| rewrite(&H3_LINE, s, "<h3>${1}</h3>")),
    RewritePass::new("heading-2", |s| rewrite(&H2_LINE, s, "<h2>${1}</h2>")),
    RewritePass::new("bold", |s| rewrite(&BOLD_SPAN, s, "<strong>${1}</strong>")),
    RewritePass::new("italic", |s| rewrite(&ITALIC_SPAN, s, "<em>${1}</em>")),
    RewritePass::new("list-item", |s| rewrite(&LIST_LINE, s, "<li>${1}</li>")),
    RewritePass::new("list-container", wrap_list_runs),
    RewritePass::new("paragraphs", wrap_paragraphs),
];

/// Run `passes` in order over `input`.
pub fn run(passes: &[RewritePass], input: &str) -> String {
    passes
        .iter()
        .fold(input.to_string(), |acc, pass| pass.apply(&acc))
}

/// Look up a pass by name.
pub fn find<'a>(passes: &'a [RewritePass], name: &str) -> Option<&'a RewritePass> {
    passes.iter().find(|pass| pass.name == name)
}

fn rewrite(re: &Regex, input: &str, replacement: &str) -> String {
    re.replace_all(input, replacement).into_owned()
}

// Tag patterns only match the exact tag name, so `<b` never eats `<br>`.
static H2_TAG: Lazy<Regex> = Lazy::new(|| tag_pair("h2"));
static H3_TAG: Lazy<Regex> = Lazy::new(|| tag_pair("h3"));
static H4_TAG: Lazy<Regex> = Lazy::new(|| tag_pair("h4"));
static STRONG_TAG: Lazy<Regex> = Lazy::new(|| tag_pair("strong"));
static B_TAG: Lazy<Regex> = Lazy::new(|| tag_pair("b"));
static EM_TAG: Lazy<Regex> = Lazy::new(|| tag_pair("em"));
static I_TAG: Lazy<Regex> = Lazy::new(|| tag_pair("i"));
static P_TAG: Lazy<Regex> = Lazy::new(|| tag_pair("p"));
static LI_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<li(?:\s[^>]*)?>(.*?)</li>\n?").unwrap());
static LI_PARAGRAPH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<li((?:\s[^>]*)?)>\s*<p(?:\s[^>]*)?>(.*?)</p>\s*</li>").unwrap()
});
static LIST_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(?:ul|ol)(?:\s[^>]*)?>").unwrap());
static LIST_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</(?:ul|ol)>").unwrap());
static BR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static NEWLINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static CARRIAGE_RETURN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n?").unwrap());
static H4_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#### (.+)$").unwrap());
static H3_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.+)$").unwrap());
static H2_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.+)$").unwrap());
static BOLD_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static LIST_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^- (.+)$").unwrap());
static LIST_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:<li>.*</li>\n?)+").unwrap());
static STRUCTURAL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^</?(?:h[2-4]|p|ul|ol|li)[\s>/]").unwrap());

fn tag_pair(tag: &str) -> Regex {
    Regex::new(&format!(r"(?i)<{tag}(?:\s[^>]*)?>(.*?)</{tag}>")).unwrap()
}

fn unwrap_list_item_paragraphs(input: &str) -> String {
    rewrite(&LI_PARAGRAPH, input, "<li${1}>${2}</li>")
}

/// Drop list containers; a closing tag still ends the block.
fn strip_list_containers(input: &str) -> String {
    rewrite(&LIST_CLOSE, &rewrite(&LIST_OPEN, input, ""), "\n")
}

pub(super) fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Wrap each run of consecutive `<li>` lines in a single `<ul>`.
fn wrap_list_runs(input: &str) -> String {
    LIST_RUN
        .replace_all(input, |caps: &Captures| {
            let run = &caps[0];
            match run.strip_suffix('\n') {
                Some(body) => format!("<ul>{body}</ul>\n"),
                None => format!("<ul>{run}</ul>"),
            }
        })
        .into_owned()
}

/// Wrap every non-empty, non-structural line in `<p>`; blank lines only
/// separate blocks and are dropped.
fn wrap_paragraphs(input: &str) -> String {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            if STRUCTURAL_LINE.is_match(line) {
                line.to_string()
            } else {
                format!("<p>{line}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(passes: &'static [RewritePass], name: &str) -> &'static RewritePass {
        find(passes, name).unwrap_or_else(|| panic!("missing pass {name}"))
    }

    #[test]
    fn test_heading_passes_run_longest_prefix_first() {
        let names: Vec<_> = STRUCTURED_PASSES.iter().map(|p| p.name).collect();
        let h4 = names.iter().position(|n| *n == "heading-4").unwrap();
        let h3 = names.iter().position(|n| *n == "heading-3").unwrap();
        let h2 = names.iter().position(|n| *n == "heading-2").unwrap();
        assert!(h4 < h3 && h3 < h2);
    }

    #[test]
    fn test_bold_runs_before_italic() {
        let names: Vec<_> = STRUCTURED_PASSES.iter().map(|p| p.name).collect();
        let bold = names.iter().position(|n| *n == "bold").unwrap();
        let italic = names.iter().position(|n| *n == "italic").unwrap();
        assert!(bold < italic);
    }

    #[test]
    fn test_heading_2_pass_leaves_deeper_heading_alone() {
        let out = pass(STRUCTURED_PASSES, "heading-2").apply("#### Deep");
        assert_eq!(out, "#### Deep");
        let out = pass(STRUCTURED_PASSES, "heading-4").apply("#### Deep\n## Top");
        assert_eq!(out, "<h4>Deep</h4>\n## Top");
    }

    #[test]
    fn test_italic_pass_alone_mangles_bold() {
        let out = pass(STRUCTURED_PASSES, "italic").apply("**x**");
        assert_ne!(out, "<strong>x</strong>");
        let ordered = pass(STRUCTURED_PASSES, "italic")
            .apply(&pass(STRUCTURED_PASSES, "bold").apply("**x** and *y*"));
        assert_eq!(ordered, "<strong>x</strong> and <em>y</em>");
    }

    #[test]
    fn test_heading_markup_pass_emits_blank_line() {
        let out = pass(MARKUP_PASSES, "heading-2").apply("<h2>Title</h2>");
        assert_eq!(out, "## Title\n\n");
    }

    #[test]
    fn test_b_pass_does_not_match_br() {
        let out = pass(MARKUP_PASSES, "b").apply("a<br>b<b>c</b>");
        assert_eq!(out, "a<br>b**c**");
    }

    #[test]
    fn test_tag_passes_are_case_insensitive_and_allow_attributes() {
        let out = pass(MARKUP_PASSES, "heading-3").apply(r#"<H3 class="x">Up</H3>"#);
        assert_eq!(out, "### Up\n\n");
    }

    #[test]
    fn test_list_item_paragraph_is_unwrapped() {
        let out = pass(MARKUP_PASSES, "list-item-paragraph").apply("<li><p>a</p></li>");
        assert_eq!(out, "<li>a</li>");
    }

    #[test]
    fn test_list_item_pass_consumes_one_newline() {
        let out = pass(MARKUP_PASSES, "list-item").apply("<li>a</li>\n<li>b</li>\n");
        assert_eq!(out, "- a\n- b\n");
    }

    #[test]
    fn test_list_run_wraps_consecutive_items_once() {
        let out = wrap_list_runs("<li>a</li>\n<li>b</li>\ntext");
        assert_eq!(out, "<ul><li>a</li>\n<li>b</li></ul>\ntext");
    }

    #[test]
    fn test_list_runs_separated_by_blank_line_stay_separate() {
        let out = wrap_list_runs("<li>a</li>\n\n<li>b</li>");
        assert_eq!(out, "<ul><li>a</li></ul>\n\n<ul><li>b</li></ul>");
    }

    #[test]
    fn test_paragraphs_pass_keeps_structural_lines() {
        let out = wrap_paragraphs("<h2>T</h2>\n\nplain\n<strong>b</strong> text\n</ul>");
        assert_eq!(
            out,
            "<h2>T</h2>\n<p>plain</p>\n<p><strong>b</strong> text</p>\n</ul>"
        );
    }

    #[test]
    fn test_paragraphs_pass_wraps_lookalike_tags() {
        assert_eq!(wrap_paragraphs("<pre>x</pre>"), "<p><pre>x</pre></p>");
    }

    #[test]
    fn test_list_container_close_ends_block() {
        let out = pass(MARKUP_PASSES, "list-container").apply("<ul>- a\n</ul><OL>- b\n</ol>");
        assert_eq!(out, "- a\n\n- b\n\n");
    }

    #[test]
    fn test_collapse_newlines_leaves_pairs() {
        let out = pass(MARKUP_PASSES, "collapse-newlines").apply("a\n\n\n\nb\n\nc");
        assert_eq!(out, "a\n\nb\n\nc");
    }

    #[test]
    fn test_entities_decode_ampersand_last() {
        assert_eq!(decode_entities("&amp;lt; &lt;b&gt;"), "&lt; <b>");
    }

    #[test]
    fn test_line_endings_are_normalized() {
        let out = pass(STRUCTURED_PASSES, "line-endings").apply("a\r\nb\rc");
        assert_eq!(out, "a\nb\nc");
    }
}
