//! Per-token lookbehind facts
//!
//! Closing a group needs two values found by looking backwards from the closer: the nearest
//! trailing weight number and the nearest `lora:<name>`. Both come from the closest earlier
//! text token that has one. They are computed once per token stream so each close is O(1).

use crate::highlight::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

static STRENGTH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*$").expect("valid strength pattern"));

static LORA_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)lora:([^,\s:]+)").expect("valid lora name pattern"));

/// Weight used when no number precedes a closer.
pub const DEFAULT_STRENGTH: f64 = 1.0;

/// For every token index, what the nearest earlier text tokens say.
#[derive(Debug, Default)]
pub struct TokenFacts<'t> {
    strengths: Vec<Option<f64>>,
    lora_names: Vec<Option<&'t str>>,
}

impl<'t> TokenFacts<'t> {
    pub fn collect(tokens: &'t [Token]) -> Self {
        let mut strengths = Vec::with_capacity(tokens.len());
        let mut lora_names = Vec::with_capacity(tokens.len());
        let mut strength = None;
        let mut lora_name = None;

        for token in tokens {
            strengths.push(strength);
            lora_names.push(lora_name);

            if token.kind == TokenKind::Text {
                if let Some(value) = trailing_strength(&token.value) {
                    strength = Some(value);
                }
                if let Some(name) = lora_name_in(&token.value) {
                    lora_name = Some(name);
                }
            }
        }

        TokenFacts {
            strengths,
            lora_names,
        }
    }

    /// Weight from the closest text token before `index`, or [DEFAULT_STRENGTH].
    pub fn strength_before(&self, index: usize) -> f64 {
        self.strengths
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(DEFAULT_STRENGTH)
    }

    /// LoRA name from the closest text token before `index`, or `""`.
    pub fn lora_name_before(&self, index: usize) -> &'t str {
        self.lora_names.get(index).copied().flatten().unwrap_or("")
    }
}

/// A number at the very end of `text`, ignoring trailing whitespace.
pub fn trailing_strength(text: &str) -> Option<f64> {
    STRENGTH_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// The name in the first `lora:<name>` of `text`.
pub fn lora_name_in(text: &str) -> Option<&str> {
    LORA_NAME_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
