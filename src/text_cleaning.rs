//! Markdown clean-up and image recovery.
//!
//! `clean_content` normalizes whitespace and punctuation in Markdown while
//! leaving fenced code, inline code and heading markers alone. Running it
//! twice gives the same result as running it once.

use std::sync::LazyLock;

use regex::Regex;

use crate::result::ImageInfo;

/// `![alt](src "title")`, with backslash escapes allowed in alt and title.
#[allow(clippy::expect_used)]
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[((?:\\.|[^\]\\])*)\]\(\s*([^\s)]+)(?:\s+"((?:\\.|[^"\\])*)")?\s*\)"#)
        .expect("valid regex")
});

/// Punctuation that should hug the preceding word.
const TRAILING_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?'];

/// Punctuation whose repeats collapse to one.
const COLLAPSIBLE_PUNCTUATION: &[char] = &['!', '?'];

/// Normalize Markdown text.
///
/// Outside code:
/// - zero-width characters are removed, non-breaking spaces become spaces
/// - curly quotes become straight quotes
/// - runs of spaces collapse to one (leading indentation is kept)
/// - spaces before `, . ; : ! ?` are removed when the mark ends a word
///   (`Wait ...` keeps its space)
/// - repeated `!` and `?` collapse to one
/// - trailing whitespace is trimmed and blank-line runs collapse to one
#[must_use]
pub fn clean_content(markdown: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;
    let mut blank_run = 0;

    for raw in markdown.replace("\r\n", "\n").split('\n') {
        if raw.trim_start().starts_with("```") {
            in_fence = !in_fence;
            blank_run = 0;
            lines.push(raw.trim_end().to_string());
            continue;
        }
        if in_fence {
            lines.push(raw.to_string());
            continue;
        }

        let line = clean_line(raw);
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }

    lines.join("\n").trim_matches('\n').to_string()
}

fn clean_line(raw: &str) -> String {
    let normalized: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}'))
        .map(|c| match c {
            '\u{a0}' | '\t' => ' ',
            '\u{201c}' | '\u{201d}' | '\u{201e}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();

    let body = normalized.trim_start_matches(' ');
    let indent = &normalized[..normalized.len() - body.len()];

    let cleaned: String = code_spans(body)
        .into_iter()
        .map(|(code, seg)| if code { seg.to_string() } else { clean_prose(seg) })
        .collect();

    let cleaned = cleaned.trim_end();
    if cleaned.is_empty() {
        String::new()
    } else {
        format!("{indent}{cleaned}")
    }
}

fn clean_prose(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut spaced = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ' ' {
            let start = i;
            while i < chars.len() && chars[i] == ' ' {
                i += 1;
            }
            let hugs_punctuation = start > 0
                && i < chars.len()
                && TRAILING_PUNCTUATION.contains(&chars[i])
                && chars.get(i + 1).is_none_or(|c| {
                    c.is_whitespace()
                        || (COLLAPSIBLE_PUNCTUATION.contains(&chars[i]) && COLLAPSIBLE_PUNCTUATION.contains(c))
                });
            if !hugs_punctuation {
                spaced.push(' ');
            }
            continue;
        }
        spaced.push(chars[i]);
        i += 1;
    }

    let mut out = String::with_capacity(spaced.len());
    for c in spaced.chars() {
        if COLLAPSIBLE_PUNCTUATION.contains(&c) && out.ends_with(c) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Recover images from Markdown image syntax, skipping code.
///
/// Indices are sequential from 0 in document order.
#[must_use]
pub fn extract_images_from_markdown(markdown: &str) -> Vec<ImageInfo> {
    let mut images = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for (code, segment) in code_spans(line) {
            if code {
                continue;
            }
            for caps in IMAGE_RE.captures_iter(segment) {
                images.push(ImageInfo {
                    src: caps.get(2).map_or_else(String::new, |m| m.as_str().to_string()),
                    alt: unescape(caps.get(1).map_or("", |m| m.as_str())),
                    title: unescape(caps.get(3).map_or("", |m| m.as_str())),
                    index: images.len(),
                });
            }
        }
    }

    images
}

/// Split a line into `(is_code, text)` pieces.
///
/// A code span opens on an unescaped backtick run and closes on the next run
/// of the same length; code pieces keep their delimiters. A run with no
/// matching close is literal text.
fn code_spans(line: &str) -> Vec<(bool, &str)> {
    let bytes = line.as_bytes();
    let mut pieces = Vec::new();
    let mut prose_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let open = i;
                let len = backtick_run(bytes, open);
                let mut j = open + len;
                let mut close = None;
                while j < bytes.len() {
                    if bytes[j] == b'`' {
                        let run = backtick_run(bytes, j);
                        if run == len {
                            close = Some(j + run);
                            break;
                        }
                        j += run;
                    } else {
                        j += 1;
                    }
                }
                match close {
                    Some(end) => {
                        if prose_start < open {
                            pieces.push((false, &line[prose_start..open]));
                        }
                        pieces.push((true, &line[open..end]));
                        prose_start = end;
                        i = end;
                    }
                    None => i = open + len,
                }
            }
            _ => i += 1,
        }
    }
    if prose_start < line.len() {
        pieces.push((false, &line[prose_start..]));
    }
    pieces
}

fn backtick_run(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|&&b| b == b'`').count()
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_spaces_and_blank_lines() {
        let input = "# Title  \n\n\n\nSome    text  here.\n\n\nMore";
        assert_eq!(clean_content(input), "# Title\n\nSome text here.\n\nMore");
    }

    #[test]
    fn test_punctuation_spacing() {
        assert_eq!(clean_content("Hello , world !!! Really ??"), "Hello, world! Really?");
        assert_eq!(clean_content("Wait ... what"), "Wait ... what");
    }

    #[test]
    fn test_keeps_list_indentation() {
        let input = "- one\n  - two\n    - three";
        assert_eq!(clean_content(input), input);
    }

    #[test]
    fn test_fenced_code_is_untouched() {
        let input = "Intro\n\n```\nlet  x = 1 ;\n\n\n\nfoo !!\n```\n\nOutro";
        assert_eq!(clean_content(input), input);
    }

    #[test]
    fn test_inline_code_is_untouched() {
        assert_eq!(clean_content("Use `a  ,  b` now"), "Use `a  ,  b` now");
    }

    #[test]
    fn test_typographic_normalization() {
        assert_eq!(clean_content("\u{201c}Quote\u{201d}\u{a0}it\u{2019}s\u{200b}"), "\"Quote\" it's");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "a , , b",
            "x ! ! y",
            "# Head\n\n\n\n> quote  ,  here\n\n| a   | b |",
            "  leading ; spaces  ",
        ];
        for sample in samples {
            let once = clean_content(sample);
            assert_eq!(clean_content(&once), once, "{sample:?}");
        }
    }

    #[test]
    fn test_extract_images() {
        let md = "Text ![Alt \\] x](https://x.com/a.png \"The \\\"title\\\"\") and ![](b.jpg)\n\n```\n![code](c.png)\n```\n`![inline](d.png)`";
        let images = extract_images_from_markdown(md);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].alt, "Alt ] x");
        assert_eq!(images[0].title, "The \"title\"");
        assert_eq!(images[1].src, "b.jpg");
        assert_eq!(images[1].index, 1);
    }

    #[test]
    fn test_escaped_backticks_are_not_code() {
        let md = "Press the \\` key then see ![A](a.png)\n\n![x\\`y](b.png)";
        let images = extract_images_from_markdown(md);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].src, "a.png");
        assert_eq!(images[1].alt, "x`y");

        assert_eq!(clean_content("Press the \\` key  ,  then"), "Press the \\` key, then");
    }

    #[test]
    fn test_code_spans_match_run_length() {
        let md = "``a ` ![in](code.png)`` ![out](x.png) ` ![lone](y.png)";
        let srcs: Vec<String> = extract_images_from_markdown(md).into_iter().map(|i| i.src).collect();
        assert_eq!(srcs, vec!["x.png", "y.png"]);
        assert_eq!(clean_content("``a  ,  b`` c  ,  d"), "``a  ,  b`` c, d");
    }
}
