//! HTML to Markdown conversion.
//!
//! Walks a `dom_query` subtree and writes Markdown with headings, nested
//! lists, blockquotes, fenced code, GFM pipe tables, links and images.
//! Every image written is also recorded in an [`ImageAccumulator`] so callers
//! get a typed image list alongside the text.

use url::Url;

use crate::dom::{self, NodeRef};
use crate::result::ImageInfo;
use crate::url_utils;

/// Characters that have special meaning in Markdown and need escaping.
const MARKDOWN_SPECIAL_CHARS: &[char] = &['\\', '*', '_', '`', '[', ']', '<', '>'];

/// Subtrees that never contribute text.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "title", "meta", "link", "svg",
    "iframe", "object", "embed", "canvas", "input", "select", "textarea", "option",
];

/// Elements rendered as their own paragraph-level block.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "body", "center", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "header", "hgroup", "html",
    "main", "nav", "p", "section", "summary",
];

/// Escape Markdown special characters in text content.
///
/// # Examples
///
/// ```
/// use markscrape::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("*not italic*", false), r"\*not italic\*");
/// assert_eq!(escape_markdown("my_variable_name", false), r"my\_variable\_name");
/// assert_eq!(escape_markdown("*text*", true), "*text*");
/// ```
#[must_use]
pub fn escape_markdown(text: &str, in_code_block: bool) -> String {
    if in_code_block || text.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if MARKDOWN_SPECIAL_CHARS.contains(&ch) {
            result.push('\\');
        }
        result.push(ch);
    }
    result
}

/// Collects images in the order they are written, across any number of
/// conversions. Indices keep increasing for the lifetime of the accumulator.
#[derive(Debug, Clone, Default)]
pub struct ImageAccumulator {
    images: Vec<ImageInfo>,
}

impl ImageAccumulator {
    /// Empty accumulator; the first image gets index 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one image and return its index.
    pub fn push(&mut self, src: &str, alt: &str, title: &str) -> usize {
        let index = self.images.len();
        self.images.push(ImageInfo {
            src: src.to_string(),
            alt: alt.to_string(),
            title: title.to_string(),
            index,
        });
        index
    }

    /// Append images from another source, renumbering them after the
    /// images already held.
    pub fn merge(&mut self, images: impl IntoIterator<Item = ImageInfo>) {
        for image in images {
            self.push(&image.src, &image.alt, &image.title);
        }
    }

    /// Images recorded so far.
    #[must_use]
    pub fn images(&self) -> &[ImageInfo] {
        &self.images
    }

    /// Number of images recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether no image was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Take the recorded images.
    #[must_use]
    pub fn into_images(self) -> Vec<ImageInfo> {
        self.images
    }
}

/// Convert one element (including itself) to Markdown.
///
/// Relative link and image URLs are resolved against `base` when given.
#[must_use]
pub fn node_to_markdown(node: &NodeRef, base: Option<&Url>, images: &mut ImageAccumulator) -> String {
    let mut writer = Writer::new(base, images);
    writer.node(node);
    finish(&writer.out)
}

/// Convert several elements, separated by blank lines.
#[must_use]
pub fn nodes_to_markdown(nodes: &[NodeRef], base: Option<&Url>, images: &mut ImageAccumulator) -> String {
    let mut writer = Writer::new(base, images);
    for node in nodes {
        writer.blank_line();
        writer.node(node);
    }
    finish(&writer.out)
}

/// Parse an HTML fragment or document and convert its body.
#[must_use]
pub fn html_to_markdown(html: &str, base: Option<&Url>, images: &mut ImageAccumulator) -> String {
    let doc = dom::parse(html);
    let body = doc.select("body");
    match dom::first_node(&body) {
        Some(node) => node_to_markdown(&node, base, images),
        None => String::new(),
    }
}

struct Writer<'w> {
    out: String,
    base: Option<&'w Url>,
    images: &'w mut ImageAccumulator,
}

impl<'w> Writer<'w> {
    fn new(base: Option<&'w Url>, images: &'w mut ImageAccumulator) -> Self {
        Self {
            out: String::new(),
            base,
            images,
        }
    }

    /// Render children into a separate buffer sharing the image list.
    fn nested(&mut self, node: &NodeRef) -> String {
        let mut nested = Writer {
            out: String::new(),
            base: self.base,
            images: &mut *self.images,
        };
        nested.children(node);
        nested.out
    }

    fn children(&mut self, node: &NodeRef) {
        for child in node.children() {
            self.node(&child);
        }
    }

    fn node(&mut self, node: &NodeRef) {
        if node.is_text() {
            self.text(&node.text());
            return;
        }
        if !node.is_element() {
            return;
        }

        let tag = dom::node_tag(node);
        match tag.as_str() {
            t if SKIPPED_TAGS.contains(&t) => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.heading(node, &tag),
            "br" => {
                self.trim_trailing_spaces();
                self.out.push('\n');
            }
            "hr" => self.block("---"),
            "ul" | "ol" => self.list(node, tag == "ol"),
            "blockquote" => self.blockquote(node),
            "pre" => self.code_block(node),
            "code" | "kbd" | "samp" => self.inline_code(node),
            "strong" | "b" => self.wrap_inline(node, "**"),
            "em" | "i" => self.wrap_inline(node, "*"),
            "del" | "s" | "strike" => self.wrap_inline(node, "~~"),
            "a" => self.link(node),
            "img" => self.image(node),
            "table" => {
                let table = table_to_markdown(node);
                if !table.is_empty() {
                    self.block(table.trim_end());
                }
            }
            t if BLOCK_TAGS.contains(&t) => {
                self.blank_line();
                self.children(node);
                self.blank_line();
            }
            _ => self.children(node),
        }
    }

    fn text(&mut self, raw: &str) {
        let collapsed = collapse_whitespace(raw);
        if collapsed.is_empty() {
            return;
        }
        let at_line_start = self.out.is_empty() || self.out.ends_with(['\n', ' ']);
        let text = if at_line_start {
            collapsed.trim_start()
        } else {
            collapsed.as_str()
        };
        self.out.push_str(&escape_markdown(text, false));
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
    }

    fn blank_line(&mut self) {
        self.trim_trailing_spaces();
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    fn block(&mut self, content: &str) {
        self.blank_line();
        self.out.push_str(content);
        self.blank_line();
    }

    fn heading(&mut self, node: &NodeRef, tag: &str) {
        let level = tag[1..].parse::<usize>().unwrap_or(1);
        let inner = single_line(&self.nested(node));
        if inner.is_empty() {
            return;
        }
        self.block(&format!("{} {inner}", "#".repeat(level)));
    }

    fn list(&mut self, node: &NodeRef, ordered: bool) {
        let mut number = dom::node_attr(node, "start")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1);
        let mut items = Vec::new();

        for child in dom::element_children(node) {
            if dom::node_tag(&child) != "li" {
                continue;
            }
            let marker = if ordered {
                format!("{number}. ")
            } else {
                "- ".to_string()
            };
            number += 1;

            let body = tighten(&finish(&self.nested(&child)));
            let indent = " ".repeat(marker.len());
            let mut item = marker;
            for (i, line) in body.lines().enumerate() {
                if i > 0 {
                    item.push('\n');
                    if !line.is_empty() {
                        item.push_str(&indent);
                    }
                }
                item.push_str(line);
            }
            items.push(item);
        }

        if !items.is_empty() {
            self.block(&items.join("\n"));
        }
    }

    fn blockquote(&mut self, node: &NodeRef) {
        let body = finish(&self.nested(node));
        if body.is_empty() {
            return;
        }
        let quoted: Vec<String> = body
            .lines()
            .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {line}") })
            .collect();
        self.block(&quoted.join("\n"));
    }

    fn code_block(&mut self, node: &NodeRef) {
        let text = node.text().to_string();
        let code = text.trim_matches('\n').trim_end();
        if code.trim().is_empty() {
            return;
        }
        let language = code_language(node).unwrap_or_default();
        let mut fence = "```".to_string();
        while code.contains(fence.as_str()) {
            fence.push('`');
        }
        self.block(&format!("{fence}{language}\n{code}\n{fence}"));
    }

    fn inline_code(&mut self, node: &NodeRef) {
        let code = collapse_whitespace(&node.text());
        let code = code.trim();
        if code.is_empty() {
            return;
        }
        if code.contains('`') {
            self.out.push_str(&format!("`` {code} ``"));
        } else {
            self.out.push_str(&format!("`{code}`"));
        }
    }

    fn wrap_inline(&mut self, node: &NodeRef, marker: &str) {
        let raw = node.text();
        let trimmed = single_line(&self.nested(node));
        if trimmed.is_empty() {
            return;
        }
        if raw.starts_with(char::is_whitespace) && !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
            self.out.push(' ');
        }
        self.out.push_str(&format!("{marker}{trimmed}{marker}"));
        if raw.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    fn link(&mut self, node: &NodeRef) {
        let inner = single_line(&self.nested(node));
        let href = dom::node_attr(node, "href").unwrap_or_default();

        if href.is_empty() || (url_utils::is_non_page_scheme(&href) && !href.starts_with("mailto:")) {
            self.out.push_str(&inner);
            return;
        }
        if inner.is_empty() {
            return;
        }

        let target = url_utils::markdown_destination(&url_utils::resolve(&href, self.base));
        match dom::node_attr(node, "title") {
            Some(title) => self.out.push_str(&format!("[{inner}]({target} \"{}\")", escape_title(&title))),
            None => self.out.push_str(&format!("[{inner}]({target})")),
        }
    }

    fn image(&mut self, node: &NodeRef) {
        let Some(src) = dom::node_attr(node, "src").or_else(|| dom::node_attr(node, "data-src")) else {
            return;
        };
        if src.starts_with("data:") {
            return;
        }
        let target = url_utils::markdown_destination(&url_utils::resolve(&src, self.base));
        let alt = collapse_whitespace(&dom::node_attr(node, "alt").unwrap_or_default());
        let alt = alt.trim();
        let title = dom::node_attr(node, "title").unwrap_or_default();

        self.images.push(&target, alt, &title);

        let alt = escape_markdown(alt, false);
        if title.is_empty() {
            self.out.push_str(&format!("![{alt}]({target})"));
        } else {
            self.out.push_str(&format!("![{alt}]({target} \"{}\")", escape_title(&title)));
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_title(title: &str) -> String {
    title.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `language-rust` / `lang-rust` on the `pre` or its `code` child.
fn code_language(pre: &NodeRef) -> Option<String> {
    let mut candidates = vec![*pre];
    candidates.extend(dom::element_children(pre).into_iter().filter(|c| dom::node_tag(c) == "code"));
    candidates.iter().flat_map(dom::classes).find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
            .filter(|l| !l.is_empty())
            .map(str::to_string)
    })
}

/// Drop blank lines outside fenced code so list items stay tight.
fn tighten(markdown: &str) -> String {
    let mut in_fence = false;
    let mut out = Vec::new();
    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if line.trim().is_empty() && !in_fence {
            continue;
        }
        out.push(line);
    }
    out.join("\n")
}

/// Collapse runs of blank lines and strip trailing spaces outside fences.
fn finish(markdown: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut blank_run = 0;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            blank_run = 0;
            out.push(line.trim_end());
            continue;
        }
        if in_fence {
            out.push(line);
            continue;
        }
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }

    out.join("\n").trim_matches('\n').to_string()
}

// === Tables ===

/// Convert a `<table>` element to a GitHub Flavored Markdown table.
///
/// The first row becomes the header row.
///
/// ```text
/// | Header A | Header B |
/// | -------- | -------- |
/// | Cell 1   | Cell 2   |
/// ```
#[must_use]
pub fn table_to_markdown(table: &NodeRef) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut alignments: Vec<Alignment> = Vec::new();

    for tr in table.descendants() {
        if dom::node_tag(&tr) != "tr" {
            continue;
        }
        let mut row = Vec::new();
        for (i, cell) in dom::element_children(&tr).iter().enumerate() {
            let tag = dom::node_tag(cell);
            if tag != "td" && tag != "th" {
                continue;
            }
            let align = cell_alignment(cell);
            if i >= alignments.len() {
                alignments.push(align);
            } else if alignments[i] == Alignment::None {
                alignments[i] = align;
            }
            row.push(escape_cell(&dom::normalized_text(cell)));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return String::new();
    }

    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut col_widths: Vec<usize> = vec![3; col_count];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            col_widths[i] = col_widths[i].max(cell.chars().count());
        }
    }
    alignments.resize(col_count, Alignment::None);

    let mut output = String::new();
    for (row_idx, row) in rows.iter().enumerate() {
        output.push('|');
        for col_idx in 0..col_count {
            let cell = row.get(col_idx).map_or("", String::as_str);
            output.push(' ');
            output.push_str(&pad_cell(cell, col_widths[col_idx], alignments[col_idx]));
            output.push_str(" |");
        }
        output.push('\n');

        if row_idx == 0 {
            output.push('|');
            for col_idx in 0..col_count {
                output.push_str(&format_separator(col_widths[col_idx], alignments[col_idx]));
                output.push('|');
            }
            output.push('\n');
        }
    }

    output
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    None,
    Left,
    Center,
    Right,
}

impl Alignment {
    fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            _ => Self::None,
        }
    }
}

fn cell_alignment(cell: &NodeRef) -> Alignment {
    if let Some(align) = dom::node_attr(cell, "align") {
        return Alignment::from_str(&align);
    }
    dom::node_attr(cell, "style")
        .and_then(|style| {
            style.split(';').find_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                (prop.trim().eq_ignore_ascii_case("text-align")).then(|| Alignment::from_str(value))
            })
        })
        .unwrap_or(Alignment::None)
}

fn escape_cell(text: &str) -> String {
    escape_markdown(text, false).replace('|', "\\|")
}

fn format_separator(width: usize, align: Alignment) -> String {
    let dashes = width.max(3);
    match align {
        Alignment::Left => format!(" :{} ", "-".repeat(dashes - 1)),
        Alignment::Center => format!(" :{}: ", "-".repeat(dashes - 2)),
        Alignment::Right => format!(" {}: ", "-".repeat(dashes - 1)),
        Alignment::None => format!(" {} ", "-".repeat(dashes)),
    }
}

fn pad_cell(text: &str, width: usize, align: Alignment) -> String {
    let text_len = text.chars().count();
    if text_len >= width {
        return text.to_string();
    }

    let padding = width - text_len;
    match align {
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left = padding / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(padding - left))
        }
        _ => format!("{}{}", text, " ".repeat(padding)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        html_to_markdown(html, None, &mut ImageAccumulator::new())
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("[link]", false), r"\[link\]");
        assert_eq!(escape_markdown(r"C:\path", false), r"C:\\path");
        assert_eq!(escape_markdown("", false), "");
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let md = convert("<h1>Title</h1><p>First   paragraph\n text.</p><h3>Sub</h3><p>Second.</p>");
        assert_eq!(md, "# Title\n\nFirst paragraph text.\n\n### Sub\n\nSecond.");
    }

    #[test]
    fn test_inline_formatting() {
        let md = convert("<p>Some <strong>bold</strong> and <em>italic</em> and <code>x_y</code>.</p>");
        assert_eq!(md, "Some **bold** and *italic* and `x_y`.");
    }

    #[test]
    fn test_whitespace_inside_emphasis_moves_outside() {
        let md = convert("<p>word<b> bold </b>tail</p>");
        assert_eq!(md, "word **bold** tail");
    }

    #[test]
    fn test_nested_lists() {
        let md = convert("<ul><li>One</li><li>Two<ul><li>Inner</li></ul></li></ul><ol start=\"3\"><li>c</li><li>d</li></ol>");
        assert_eq!(md, "- One\n- Two\n  - Inner\n\n3. c\n4. d");
    }

    #[test]
    fn test_blockquote() {
        let md = convert("<blockquote><p>Quoted</p><p>Again</p></blockquote>");
        assert_eq!(md, "> Quoted\n>\n> Again");
    }

    #[test]
    fn test_fenced_code_keeps_whitespace() {
        let md = convert("<pre><code class=\"language-rust\">fn main() {\n    let x = 1;\n}</code></pre>");
        assert_eq!(md, "```rust\nfn main() {\n    let x = 1;\n}\n```");
    }

    #[test]
    fn test_links_resolve_against_base() {
        let base = Url::parse("https://example.com/blog/").unwrap();
        let mut images = ImageAccumulator::new();
        let md = html_to_markdown(r#"<p><a href="post">Read</a> <a href="javascript:void(0)">JS</a></p>"#, Some(&base), &mut images);
        assert_eq!(md, "[Read](https://example.com/blog/post) JS");
    }

    #[test]
    fn test_images_are_accumulated_with_increasing_index() {
        let mut images = ImageAccumulator::new();
        let first = html_to_markdown(r#"<img src="/a.png" alt="A"><img src="/b.png" title="Bee">"#, None, &mut images);
        let second = html_to_markdown(r#"<p><img src="/c.png"></p>"#, None, &mut images);

        assert_eq!(first, "![A](/a.png)![](/b.png \"Bee\")");
        assert_eq!(second, "![](/c.png)");
        let indices: Vec<usize> = images.images().iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(images.images()[1].title, "Bee");
    }

    #[test]
    fn test_skipped_elements() {
        let md = convert("<p>Keep</p><script>var x = 1;</script><style>p{}</style>");
        assert_eq!(md, "Keep");
    }

    #[test]
    fn test_simple_table() {
        let md = convert("<table><tr><th>Name</th><th>Age</th></tr><tr><td>Ann</td><td>30</td></tr></table>");
        assert_eq!(md, "| Name | Age |\n| ---- | --- |\n| Ann  | 30  |");
    }

    #[test]
    fn test_table_alignment_and_pipes() {
        let md = convert(r#"<table><thead><tr><th align="right">N</th><th style="text-align: center">a|b</th></tr></thead><tbody><tr><td>1</td><td>x</td></tr></tbody></table>"#);
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "|   N | a\\|b |");
        assert_eq!(lines[1], "| --: | :--: |");
    }

    #[test]
    fn test_table_uneven_rows() {
        let md = convert("<table><tr><td>a</td><td>b</td><td>c</td></tr><tr><td>d</td></tr></table>");
        assert!(md.ends_with("| d   |     |     |"));
    }

    #[test]
    fn test_merge_renumbers() {
        let mut acc = ImageAccumulator::new();
        acc.push("/x.png", "", "");
        acc.merge(vec![ImageInfo {
            src: "/y.png".into(),
            alt: "y".into(),
            title: String::new(),
            index: 7,
        }]);
        assert_eq!(acc.images()[1].index, 1);
        assert_eq!(acc.len(), 2);
    }
}
