//! Prompt highlighting pipeline
//!
//!     Source text goes through two stages:
//!
//!     1. Tokenizing ([tokenizing]): a fixed set of lexical patterns is matched over the whole
//!        input, overlapping candidates are resolved by position and priority, and the gaps are
//!        filled with text tokens. Tokens partition the source: concatenating their values gives
//!        back the input ([detokenizer]).
//!     2. Highlighting ([highlighting]): tokens are walked with a stack of open groups. Group
//!        colors depend on nesting depth or on a trailing strength number, LoRA and embedding
//!        names are checked against the resource name lists, and unclosed groups are forced to
//!        the error color. The result is a list of [markup] pieces which is then scanned for
//!        duplicate comma-separated tags ([duplicates]).
//!
//!     Everything after that is rendering: markup, plain text, terminal colors or JSON
//!     ([formats]). Resources come from the caller, usually via [config] and [catalog].

pub mod catalog;
pub mod color;
pub mod config;
pub mod detokenizer;
pub mod duplicates;
pub mod error;
pub mod formats;
pub mod highlighting;
pub mod markup;
pub mod resources;
pub mod token;
pub mod tokenizing;
