use std::ops::Range;

/// One `<p …>…</p>` block located in chapter markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSpan {
    /// Byte range of the whole block, opening tag through closing tag.
    pub outer: Range<usize>,
    /// Byte range between the opening and closing tags.
    pub inner: Range<usize>,
}

/// Finds paragraph blocks in document order.
///
/// Tag names are matched ASCII case-insensitively and must be exactly `p`
/// (`<pre>` and `<param>` are not paragraphs). Paragraphs do not nest: a block
/// ends at the first `</p>` after its opening tag. An opening tag with no
/// closing tag ends the scan.
pub fn paragraph_spans(markup: &str) -> Vec<ParagraphSpan> {
    let bytes = markup.as_bytes();
    let mut spans = Vec::new();
    let mut pos = 0;

    while let Some(open) = find_paragraph_open(bytes, pos) {
        let Some(open_end) = find_byte(bytes, open + 2, b'>') else {
            break;
        };
        let inner_start = open_end + 1;
        let Some(close) = find_ignore_case(bytes, inner_start, b"</p>") else {
            break;
        };
        let outer_end = close + 4;

        spans.push(ParagraphSpan {
            outer: open..outer_end,
            inner: inner_start..close,
        });
        pos = outer_end;
    }

    spans
}

/// Removes every `<…>` tag, keeping the text between tags untouched.
///
/// A `<` with no later `>` is kept as text, as is the empty `<>`.
pub fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(0) => {
                out.push('<');
                rest = after;
            }
            Some(close) => rest = &after[close + 1..],
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Tag-stripped text with typographic quotes folded and whitespace collapsed.
pub fn clean_text(markup: &str) -> String {
    normalize_text(&strip_tags(markup))
}

/// [`clean_text`], or an empty string when fewer than `min_chars` characters
/// remain. Title pages and other near-empty chapters come out empty, which
/// the artifact getters treat as "nothing to generate from".
pub fn extract_text_content(markup: &str, min_chars: usize) -> String {
    let text = clean_text(markup);
    if text.chars().count() < min_chars {
        return String::new();
    }
    text
}

/// Folds typographic quotes and non-breaking spaces, then collapses whitespace.
pub fn normalize_text(input: &str) -> String {
    input
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{00A0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_paragraph_open(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(lt) = find_byte(bytes, pos, b'<') {
        let is_p = bytes
            .get(lt + 1)
            .is_some_and(|b| b.eq_ignore_ascii_case(&b'p'));
        let boundary = bytes
            .get(lt + 2)
            .is_some_and(|b| *b == b'>' || *b == b'/' || b.is_ascii_whitespace());
        if is_p && boundary {
            return Some(lt);
        }
        pos = lt + 1;
    }
    None
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|b| *b == needle)
        .map(|offset| from + offset)
}

fn find_ignore_case(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|offset| from + offset)
}
