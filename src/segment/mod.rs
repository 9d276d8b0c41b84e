pub mod markup;

use crate::models::Group;

use self::markup::{paragraph_spans, strip_tags};

struct Paragraph {
    start: usize,
    clean: String,
    clean_len: usize,
}

#[derive(Default)]
struct Bucket {
    start: usize,
    texts: Vec<String>,
    clean_len: usize,
}

/// Splits chapter markup into at most `max_groups` contiguous groups.
///
/// Groups partition the input: their `raw` slices, concatenated in index
/// order, reproduce `markup` byte for byte. Boundaries only fall on the
/// opening tag of a counted paragraph, so headings, images and blank
/// paragraphs travel with the text around them.
///
/// Each group aims for `max(min_group_chars, total / max_groups)` clean
/// characters. A group closes once it reaches that target while fewer than
/// `max_groups - 1` groups are closed, or unconditionally at 1.5× the target.
pub fn split(markup: &str, min_group_chars: usize, max_groups: usize) -> Vec<Group> {
    let max_groups = max_groups.max(1);
    let spans = paragraph_spans(markup);

    if spans.is_empty() {
        return whole_input_group(markup);
    }

    let paragraphs: Vec<Paragraph> = spans
        .into_iter()
        .filter_map(|span| {
            let clean = strip_tags(&markup[span.inner.clone()]);
            if clean.trim().is_empty() {
                return None;
            }
            Some(Paragraph {
                start: span.outer.start,
                clean_len: clean.chars().count(),
                clean,
            })
        })
        .collect();

    if paragraphs.is_empty() {
        return vec![];
    }

    let total: usize = paragraphs.iter().map(|p| p.clean_len).sum();
    let target = min_group_chars.max(total / max_groups);

    let mut buckets: Vec<Bucket> = Vec::new();
    let mut current: Option<Bucket> = None;

    for paragraph in paragraphs {
        let bucket = current.get_or_insert_with(|| Bucket {
            start: paragraph.start,
            ..Bucket::default()
        });
        bucket.texts.push(paragraph.clean);
        bucket.clean_len += paragraph.clean_len;

        let reached_target = bucket.clean_len >= target && buckets.len() + 1 < max_groups;
        let oversized = bucket.clean_len * 2 >= target * 3;
        if reached_target || oversized {
            buckets.extend(current.take());
        }
    }
    buckets.extend(current);

    while buckets.len() > max_groups {
        if let Some(overflow) = buckets.pop() {
            if let Some(last) = buckets.last_mut() {
                last.texts.extend(overflow.texts);
                last.clean_len += overflow.clean_len;
            }
        }
    }

    let mut groups = Vec::with_capacity(buckets.len());
    for (index, bucket) in buckets.iter().enumerate() {
        let start = if index == 0 { 0 } else { bucket.start };
        let end = buckets
            .get(index + 1)
            .map(|next| next.start)
            .unwrap_or(markup.len());

        groups.push(Group {
            index,
            raw: markup[start..end].to_string(),
            clean_text: bucket.texts.join("\n").trim().to_string(),
            clean_len: bucket.clean_len,
            paragraph_count: bucket.texts.len(),
        });
    }

    groups
}

fn whole_input_group(markup: &str) -> Vec<Group> {
    let clean = strip_tags(markup);
    let trimmed = clean.trim();
    if trimmed.is_empty() {
        return vec![];
    }

    vec![Group {
        index: 0,
        raw: markup.to_string(),
        clean_text: trimmed.to_string(),
        clean_len: clean.chars().count(),
        paragraph_count: 0,
    }]
}
