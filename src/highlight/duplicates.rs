//! Duplicate tag detection
//!
//!     Runs last, over already colored pieces. The plain text is split on commas and each
//!     segment is reduced to the tag it names:
//!
//!         - surrounding whitespace and every `<` / `>` are dropped
//!         - one leading `(` and one trailing `)` are dropped
//!         - `lora:name:weight` keeps `lora:name`; any other segment is cut at its first colon,
//!           which drops weights like `:1.2`
//!
//!     A tag that occurs in more than one segment is a duplicate, and every occurrence is
//!     wrapped in an error colored span. Wrapping happens inside text pieces only, so a
//!     duplicate never straddles an existing span boundary and the output stays well nested.

use crate::highlight::markup::{Piece, SpanKind};
use std::collections::HashMap;
use std::ops::Range;

/// Wrap every duplicated tag in `pieces` with an `error_color` span.
pub fn mark_duplicates(pieces: Vec<Piece>, error_color: &str) -> Vec<Piece> {
    let pieces = merge_text(pieces);
    let plain: String = pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();

    let duplicates = duplicate_ranges(&plain);
    if duplicates.is_empty() {
        return pieces;
    }
    tracing::debug!(count = duplicates.len(), "duplicate tags");

    let mut marked = Vec::with_capacity(pieces.len() + duplicates.len() * 3);
    let mut offset = 0;
    let mut next = 0;
    for piece in pieces {
        match piece {
            Piece::Text(text) => {
                let span = offset..offset + text.len();
                offset = span.end;
                wrap_text(&mut marked, &text, span, &duplicates, &mut next, error_color);
            }
            other => marked.push(other),
        }
    }
    marked
}

/// Join consecutive text pieces so a tag is wrapped once, not per token.
fn merge_text(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut merged: Vec<Piece> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if let Piece::Text(text) = &piece {
            if text.is_empty() {
                continue;
            }
            if let Some(Piece::Text(last)) = merged.last_mut() {
                last.push_str(text);
                continue;
            }
        }
        merged.push(piece);
    }
    merged
}

/// Byte ranges of `plain` holding a tag that occurs more than once.
pub fn duplicate_ranges(plain: &str) -> Vec<Range<usize>> {
    let mut tags = Vec::new();
    let mut offset = 0;
    for segment in plain.split(',') {
        let start = offset;
        offset += segment.len() + 1;
        if segment.is_empty() {
            continue;
        }
        let tag = normalize_tag(segment);
        if tag.is_empty() {
            continue;
        }
        let local = locate(segment, &tag);
        tags.push((tag, start + local.start..start + local.end));
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (tag, _) in &tags {
        *counts.entry(tag.as_str()).or_default() += 1;
    }

    tags.iter()
        .filter(|(tag, _)| counts.get(tag.as_str()).copied().unwrap_or(0) > 1)
        .map(|(_, range)| range.clone())
        .collect()
}

/// Reduce a comma-separated segment to the tag it names.
pub fn normalize_tag(segment: &str) -> String {
    let mut tag = segment.trim().replace(['<', '>'], "");

    if let Some(rest) = tag.strip_prefix('(') {
        tag = rest.trim().to_string();
    }
    if let Some(rest) = tag.strip_suffix(')') {
        tag = rest.trim().to_string();
    }

    let is_lora = tag.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("lora:"));
    let cut = if is_lora {
        tag.match_indices(':').nth(1).map(|(i, _)| i)
    } else {
        tag.find(':')
    };
    if let Some(cut) = cut {
        tag.truncate(cut);
        tag = tag.trim().to_string();
    }

    tag
}

/// Where `tag` sits inside `segment`; the trimmed segment when brackets were removed from
/// its middle.
fn locate(segment: &str, tag: &str) -> Range<usize> {
    if let Some(start) = segment.find(tag) {
        return start..start + tag.len();
    }
    let start = segment.len() - segment.trim_start().len();
    start..segment.trim_end().len()
}

/// Push `text` (covering `span` of the plain text), wrapping the parts inside `duplicates`.
///
/// `duplicates` is sorted and `next` is the first range that may still reach `span`, shared
/// across calls so the whole pass stays linear.
fn wrap_text(
    out: &mut Vec<Piece>,
    text: &str,
    span: Range<usize>,
    duplicates: &[Range<usize>],
    next: &mut usize,
    error_color: &str,
) {
    while duplicates.get(*next).is_some_and(|range| range.end <= span.start) {
        *next += 1;
    }

    let mut cursor = span.start;
    while let Some(range) = duplicates.get(*next) {
        if range.start >= span.end {
            break;
        }
        let start = range.start.max(span.start);
        let end = range.end.min(span.end);
        if start > cursor {
            out.push(Piece::Text(text[cursor - span.start..start - span.start].to_string()));
        }
        out.push(Piece::Open {
            id: None,
            kind: SpanKind::Duplicate,
            color: error_color.to_string(),
        });
        out.push(Piece::Text(text[start - span.start..end - span.start].to_string()));
        out.push(Piece::Close);
        cursor = end;
        if range.end > span.end {
            // continues in the next text piece
            break;
        }
        *next += 1;
    }
    if cursor < span.end {
        out.push(Piece::Text(text[cursor - span.start..].to_string()));
    }
}
