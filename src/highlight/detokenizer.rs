//! Detokenizer for prompt tokens
//!
//! Converts a token stream back into source text. Tokens keep their exact source slice, so
//! this is a plain concatenation; it exists to state the round-trip invariant in one place.

use crate::highlight::token::Token;

/// Detokenize a stream of tokens into a string
pub fn detokenize(tokens: &[Token]) -> String {
    tokens.iter().map(|token| token.value.as_str()).collect()
}
