//! Token types for prompt text
//!
//!     The tokenizer produces a flat sequence of tokens that fully partitions the source text:
//!     every byte belongs to exactly one token, and tokens are ordered by their start offset.
//!     Only the markers that matter for highlighting get their own kinds, everything else is
//!     text.
//!
//! Token Kinds
//!
//!         - Text: any run of source not claimed by a marker
//!         - Escape: `\(` or `\)`, a literal parenthesis
//!         - InvalidEscape: `/(` or `/)`, an escape typed with the wrong slash
//!         - Embedding: `embedding:name` (case-insensitive, name runs to a comma or whitespace)
//!         - LoraOpen: a `<` immediately followed by `lora:` (only the bracket is the token)
//!         - LoraClose: any `>`
//!         - ParenOpen, ParenClose: `(` and `)`
//!
//!     The tokenizer does not track nesting. A `>` without a preceding LoRA opener is still a
//!     LoraClose token; the highlighter decides whether it closes anything.

use std::fmt;
use std::ops::Range;

/// The kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Text,
    Escape,
    InvalidEscape,
    Embedding,
    LoraOpen,
    LoraClose,
    ParenOpen,
    ParenClose,
}

impl TokenKind {
    /// Tie-break order for candidates starting at the same offset (lower wins).
    pub fn priority(self) -> u8 {
        match self {
            TokenKind::Escape => 0,
            TokenKind::InvalidEscape => 1,
            TokenKind::ParenOpen | TokenKind::ParenClose => 2,
            _ => 3,
        }
    }

    /// Whether `self` (an opener) is closed by `closer`.
    ///
    /// Parentheses only close parentheses and `>` only closes LoRA tags.
    pub fn is_closed_by(self, closer: TokenKind) -> bool {
        matches!(
            (self, closer),
            (TokenKind::ParenOpen, TokenKind::ParenClose)
                | (TokenKind::LoraOpen, TokenKind::LoraClose)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Text => "TEXT",
            TokenKind::Escape => "ESCAPE",
            TokenKind::InvalidEscape => "INVALID_ESCAPE",
            TokenKind::Embedding => "EMBEDDING",
            TokenKind::LoraOpen => "LORA_OPEN",
            TokenKind::LoraClose => "LORA_CLOSE",
            TokenKind::ParenOpen => "PAREN_OPEN",
            TokenKind::ParenClose => "PAREN_CLOSE",
        };
        write!(f, "{}", name)
    }
}

/// A token with the exact source slice it covers.
///
/// `start` and `end` are byte offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, start: usize) -> Self {
        let value = value.into();
        let end = start + value.len();
        Token {
            kind,
            value,
            start,
            end,
        }
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether two tokens share at least one byte of source.
    pub fn overlaps(&self, other: &Token) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})@{}..{}", self.kind, self.value, self.start, self.end)
    }
}
