//! Tokenizer for prompt text
//!
//!     Tokenization does not scan character by character. Each lexical pattern is matched
//!     independently over the whole input and every match becomes a candidate. Candidates are
//!     then ordered by start offset (ties broken by [TokenKind::priority]) and accepted
//!     greedily, dropping any candidate that overlaps one already accepted. Whatever is left
//!     uncovered becomes text.
//!
//!     This keeps escapes authoritative: in `\(` both the escape and the parenthesis match,
//!     the escape starts first and wins, and the parenthesis is discarded.
//!
//!     Tokenizing never fails. Offsets are byte offsets into the input.

use crate::highlight::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Lexical patterns in declaration order.
///
/// When a pattern has a capture group, only the group becomes the token. This stands in for
/// a lookahead: a LoRA opener is the `<` of `<lora:`, not the whole prefix.
const TOKEN_PATTERNS: &[(TokenKind, &str)] = &[
    (TokenKind::Escape, r"\\[()]"),
    (TokenKind::InvalidEscape, r"/[()]"),
    (TokenKind::Embedding, r"(?i)embedding:[^,\s]+"),
    (TokenKind::LoraOpen, r"(?i)(<)lora:"),
    (TokenKind::LoraClose, r">"),
    (TokenKind::ParenOpen, r"\("),
    (TokenKind::ParenClose, r"\)"),
];

static COMPILED_PATTERNS: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    TOKEN_PATTERNS
        .iter()
        .map(|(kind, pattern)| (*kind, Regex::new(pattern).expect("valid token pattern")))
        .collect()
});

/// Tokenize prompt text into an ordered, gap-free token sequence.
///
/// Empty input yields no tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    let accepted = accept_non_overlapping(collect_candidates(text));

    let mut tokens = Vec::with_capacity(accepted.len() * 2 + 1);
    let mut last_index = 0;
    for token in accepted {
        if token.start > last_index {
            tokens.push(Token::new(
                TokenKind::Text,
                &text[last_index..token.start],
                last_index,
            ));
        }
        last_index = token.end;
        tokens.push(token);
    }

    if last_index < text.len() {
        tokens.push(Token::new(TokenKind::Text, &text[last_index..], last_index));
    }

    tracing::trace!(len = text.len(), tokens = tokens.len(), "tokenized prompt");
    tokens
}

/// Every match of every pattern, in pattern order.
fn collect_candidates(text: &str) -> Vec<Token> {
    let mut candidates = Vec::new();
    for (kind, regex) in COMPILED_PATTERNS.iter() {
        for caps in regex.captures_iter(text) {
            if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                candidates.push(Token::new(*kind, m.as_str(), m.start()));
            }
        }
    }
    candidates
}

/// Sort candidates and keep the ones that don't overlap an earlier pick.
///
/// Accepted tokens never overlap and are sorted by start, so their ends are increasing too:
/// a candidate overlaps some accepted token exactly when it overlaps the last one.
fn accept_non_overlapping(mut candidates: Vec<Token>) -> Vec<Token> {
    candidates.sort_by_key(|token| (token.start, token.kind.priority()));

    let mut accepted: Vec<Token> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let overlaps = accepted
            .last()
            .is_some_and(|last| candidate.overlaps(last));
        if !overlaps {
            accepted.push(candidate);
        }
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).into_iter().map(|t| t.kind).collect()
    }

    fn values(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|t| t.value).collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize(""), vec![]);
    }

    #[test]
    fn test_plain_text_is_one_token() {
        let tokens = tokenize("masterpiece, best quality");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].span(), 0..25);
    }

    #[test]
    fn test_parenthesized_group() {
        assert_eq!(
            kinds("(a, b)"),
            vec![TokenKind::ParenOpen, TokenKind::Text, TokenKind::ParenClose]
        );
        assert_eq!(values("(a, b)"), vec!["(", "a, b", ")"]);
    }

    #[test]
    fn test_escape_wins_over_parenthesis() {
        let tokens = tokenize(r"\(a\)");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Escape, TokenKind::Text, TokenKind::Escape]
        );
        assert_eq!(tokens[0].value, r"\(");
        assert_eq!(tokens[2].span(), 3..5);
    }

    #[test]
    fn test_invalid_escape() {
        assert_eq!(
            kinds("/(a)"),
            vec![
                TokenKind::InvalidEscape,
                TokenKind::Text,
                TokenKind::ParenClose
            ]
        );
        assert_eq!(values("/(a)")[0], "/(");
    }

    #[test]
    fn test_lora_opener_is_only_the_bracket() {
        let tokens = tokenize("<lora:foo:0.5>");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::LoraOpen, TokenKind::Text, TokenKind::LoraClose]
        );
        assert_eq!(tokens[0].value, "<");
        assert_eq!(tokens[1].value, "lora:foo:0.5");
        assert_eq!(tokens[2].span(), 13..14);
    }

    #[test]
    fn test_lora_opener_is_case_insensitive() {
        assert_eq!(kinds("<LoRA:x>")[0], TokenKind::LoraOpen);
    }

    #[test]
    fn test_angle_bracket_without_lora_is_text() {
        assert_eq!(kinds("a < b"), vec![TokenKind::Text]);
        // A stray `>` is still a closer at this level
        assert_eq!(
            kinds("a > b"),
            vec![TokenKind::Text, TokenKind::LoraClose, TokenKind::Text]
        );
    }

    #[test]
    fn test_embedding() {
        let tokens = tokenize("a, Embedding:easyneg, b");
        assert_eq!(tokens[1].kind, TokenKind::Embedding);
        assert_eq!(tokens[1].value, "Embedding:easyneg");
        assert_eq!(tokens[2].value, ", b");
    }

    #[test]
    fn test_embedding_swallows_following_closer() {
        // The name runs up to a comma or whitespace, so the parenthesis is part of it
        let tokens = tokenize("(embedding:foo)");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::ParenOpen, TokenKind::Embedding]
        );
        assert_eq!(tokens[1].value, "embedding:foo)");
    }

    #[test]
    fn test_multibyte_text_offsets() {
        let tokens = tokenize("(猫:1.2)");
        assert_eq!(tokens[1].value, "猫:1.2");
        assert_eq!(tokens[1].span(), 1..8);
        assert_eq!(tokens[2].span(), 8..9);
    }

    #[test]
    fn test_tokens_partition_source() {
        let text = r"((a:1.2), <lora:x:0.8>, \(b\), /(c/), embedding:e) >";
        let tokens = tokenize(text);
        let mut expected_start = 0;
        for token in &tokens {
            assert_eq!(token.start, expected_start);
            assert_eq!(&text[token.span()], token.value);
            expected_start = token.end;
        }
        assert_eq!(expected_start, text.len());
    }
}
