//! Highlighted output as a list of pieces
//!
//!     The highlighter does not build a markup string directly. It produces a flat list of
//!     [Piece]s: literal text, span openings carrying their resolved color, and span closings.
//!     Openings and closings are always balanced and properly nested.
//!
//!     Renderings:
//!         - [Highlighted::to_markup]: inline-styled `<span>` markup, the format the prompt
//!           overlay consumes. Only `<` and `>` in literal text are escaped.
//!         - [Highlighted::plain_text]: the literal text alone, identical to the source prompt.
//!         - [Highlighted::styled_spans]: every span as a colored byte range of the plain text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// What a span marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    /// A parenthesized weight group
    Group,
    /// A `<lora:...>` tag
    Lora,
    /// An `embedding:name` reference
    Embedding,
    /// The slash of a `/(` or `/)` typo
    InvalidEscape,
    /// A tag that occurs more than once
    Duplicate,
}

/// Identifier of a colored span, unique within one highlighting call.
///
/// Renders as `span-<n>` with a `-lora` or `-embedding` suffix for those kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId {
    pub index: usize,
    pub kind: SpanKind,
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.kind {
            SpanKind::Lora => "-lora",
            SpanKind::Embedding => "-embedding",
            _ => "",
        };
        write!(f, "span-{}{}", self.index, suffix)
    }
}

/// One element of highlighted output
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    /// Literal source text, not escaped
    Text(String),
    Open {
        id: Option<SpanId>,
        kind: SpanKind,
        color: String,
    },
    Close,
}

/// A span as a colored range of the plain text
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StyledSpan {
    pub id: Option<String>,
    pub kind: SpanKind,
    pub color: String,
    pub start: usize,
    pub end: usize,
    pub depth: usize,
}

/// The result of highlighting a token stream
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Highlighted {
    pieces: Vec<Piece>,
}

impl Highlighted {
    pub fn new(pieces: Vec<Piece>) -> Self {
        Highlighted { pieces }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Render inline-styled span markup.
    pub fn to_markup(&self) -> String {
        let mut markup = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => markup.push_str(&escape_html(text)),
                Piece::Open { id: Some(id), color, .. } => {
                    markup.push_str(&format!(
                        "<span id=\"{}\" style=\"background-color: {};\">",
                        id, color
                    ));
                }
                Piece::Open { id: None, color, .. } => {
                    markup.push_str(&format!("<span style=\"background-color: {};\">", color));
                }
                Piece::Close => markup.push_str("</span>"),
            }
        }
        markup
    }

    /// The literal text with all styling removed.
    pub fn plain_text(&self) -> String {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every span as a range over [Highlighted::plain_text], ordered by start then depth.
    pub fn styled_spans(&self) -> Vec<StyledSpan> {
        let mut open: Vec<(Option<SpanId>, SpanKind, &str, usize)> = Vec::new();
        let mut spans = Vec::new();
        let mut offset = 0;

        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => offset += text.len(),
                Piece::Open { id, kind, color } => open.push((*id, *kind, color.as_str(), offset)),
                Piece::Close => {
                    if let Some((id, kind, color, start)) = open.pop() {
                        spans.push(StyledSpan {
                            id: id.map(|id| id.to_string()),
                            kind,
                            color: color.to_string(),
                            start,
                            end: offset,
                            depth: open.len(),
                        });
                    }
                }
            }
        }

        spans.sort_by_key(|span| (span.start, span.depth));
        spans
    }
}

impl fmt::Display for Highlighted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_markup())
    }
}

/// Escape the two characters that would otherwise open or close markup.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('<', "&lt;").replace('>', "&gt;"))
}

/// Reverse of [escape_html].
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<").replace("&gt;", ">")
}

/// Remove every `<...>` tag from markup.
pub fn strip_tags(markup: &str) -> String {
    TAG_REGEX.replace_all(markup, "").into_owned()
}
