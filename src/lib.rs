//! # prompt-highlight
//!
//! Tokenizer and highlighter for prompt text: nested weight groups, `<lora:name:weight>`
//! tags, `embedding:name` references and comma-separated tags.
//!
//! The pipeline is `tokenize` -> `Highlighter::process_tokens` -> render. See the
//! [highlight](mod@highlight) module for the stages and their invariants.

pub mod highlight;

pub use highlight::error::HighlightError;
pub use highlight::highlighting::Highlighter;
pub use highlight::markup::Highlighted;
pub use highlight::resources::{HighlightType, NameList, NameValidator, ResourceBundle};
pub use highlight::token::{Token, TokenKind};
pub use highlight::tokenizing::tokenize;

/// Tokenize and highlight `text`, returning the rendered markup.
pub fn highlight(text: &str, resources: &ResourceBundle) -> String {
    let tokens = tokenize(text);
    Highlighter::new(resources)
        .process_tokens(&tokens)
        .to_markup()
}
