//! Highlighter
//!
//!     Walks a token stream once, keeping a stack of open groups, and produces [Highlighted]
//!     pieces. All state lives in a [Context] created per call, so a highlighter can be shared
//!     and reused freely.
//!
//! Group Colors
//!
//!     A group's color may depend on tokens that come after its opening (the weight before the
//!     closer, whether the LoRA name is known, whether it closes at all). Openings are therefore
//!     recorded with a pending color bound to the span id and resolved in one pass after the
//!     whole stream has been seen. Each id gets exactly one color:
//!
//!         - parenthesis closed: strength color in strength mode, depth color in nesting mode
//!         - LoRA closed, name known: same as a parenthesis
//!         - LoRA closed, name unknown: error color
//!         - still open at end of input: error color, and a closing is appended
//!
//!     Closers that don't match the innermost open group (a `)` for a LoRA tag, a `>` for a
//!     parenthesis, or any closer with nothing open) are literal text and leave the stack
//!     alone.
//!
//!     After colors are resolved, [duplicates](crate::highlight::duplicates) marks repeated
//!     tags.

pub mod facts;

use crate::highlight::color::{strength_color, Rgb};
use crate::highlight::duplicates::mark_duplicates;
use crate::highlight::markup::{Highlighted, Piece, SpanId, SpanKind};
use crate::highlight::resources::{HighlightType, NameValidator, ResourceBundle};
use crate::highlight::token::{Token, TokenKind};
use facts::TokenFacts;
use std::collections::HashMap;

/// Color of an opening before resolution
#[derive(Debug, Clone, PartialEq)]
enum ColorSlot {
    Resolved(String),
    Pending(SpanId),
}

#[derive(Debug, Clone, PartialEq)]
enum Draft {
    Text(String),
    Open {
        id: Option<SpanId>,
        kind: SpanKind,
        color: ColorSlot,
    },
    Close,
}

/// A group waiting for its closer
#[derive(Debug, Clone, Copy)]
struct OpenSpan {
    id: SpanId,
    depth_color: Rgb,
    opener: TokenKind,
}

/// State of one highlighting call
struct Context<'t> {
    drafts: Vec<Draft>,
    stack: Vec<OpenSpan>,
    next_id: usize,
    resolved: HashMap<SpanId, String>,
    facts: TokenFacts<'t>,
}

impl<'t> Context<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Context {
            drafts: Vec::with_capacity(tokens.len() + 1),
            stack: Vec::new(),
            next_id: 0,
            resolved: HashMap::new(),
            facts: TokenFacts::collect(tokens),
        }
    }

    fn fresh_id(&mut self, kind: SpanKind) -> SpanId {
        let id = SpanId {
            index: self.next_id,
            kind,
        };
        self.next_id += 1;
        id
    }

    fn text(&mut self, value: &str) {
        self.drafts.push(Draft::Text(value.to_string()));
    }

    /// The current nesting level.
    fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Turns tokens into highlighted pieces using a resource snapshot.
pub struct Highlighter<'r> {
    resources: &'r ResourceBundle,
    loras: &'r dyn NameValidator,
    embeddings: &'r dyn NameValidator,
}

impl<'r> Highlighter<'r> {
    /// A highlighter validating names against the bundle's own lists.
    pub fn new(resources: &'r ResourceBundle) -> Self {
        Highlighter {
            resources,
            loras: &resources.valid_loras,
            embeddings: &resources.valid_embeddings,
        }
    }

    /// A highlighter with caller-supplied name validation.
    pub fn with_validators(
        resources: &'r ResourceBundle,
        loras: &'r dyn NameValidator,
        embeddings: &'r dyn NameValidator,
    ) -> Self {
        Highlighter {
            resources,
            loras,
            embeddings,
        }
    }

    /// Highlight a token stream produced by [tokenize](crate::highlight::tokenizing::tokenize).
    pub fn process_tokens(&self, tokens: &[Token]) -> Highlighted {
        let mut ctx = Context::new(tokens);

        for (index, token) in tokens.iter().enumerate() {
            self.process_token(&mut ctx, token, index);
        }
        self.close_unclosed(&mut ctx);

        let pieces = self.resolve_colors(ctx);
        Highlighted::new(mark_duplicates(pieces, self.resources.error_color()))
    }

    fn process_token(&self, ctx: &mut Context<'_>, token: &Token, index: usize) {
        match token.kind {
            TokenKind::Text | TokenKind::Escape => ctx.text(&token.value),
            TokenKind::InvalidEscape => self.process_invalid_escape(ctx, token),
            TokenKind::Embedding => self.process_embedding(ctx, token),
            TokenKind::LoraOpen | TokenKind::ParenOpen => self.process_open(ctx, token),
            TokenKind::LoraClose | TokenKind::ParenClose => self.process_close(ctx, token, index),
        }
    }

    /// `/(` renders the slash as an error and the parenthesis as text.
    fn process_invalid_escape(&self, ctx: &mut Context<'_>, token: &Token) {
        tracing::warn!(
            value = %token.value,
            position = token.start,
            "Replace \"{}\" at position {} with \"\\\"",
            token.value,
            token.start
        );

        let split = token
            .value
            .char_indices()
            .nth(1)
            .map_or(token.value.len(), |(i, _)| i);
        let (slash, rest) = token.value.split_at(split);

        ctx.drafts.push(Draft::Open {
            id: None,
            kind: SpanKind::InvalidEscape,
            color: ColorSlot::Resolved(self.resources.error_color().to_string()),
        });
        ctx.text(slash);
        ctx.drafts.push(Draft::Close);
        if !rest.is_empty() {
            ctx.text(rest);
        }
    }

    fn process_embedding(&self, ctx: &mut Context<'_>, token: &Token) {
        let name = token.value.split(':').nth(1).unwrap_or("");
        let color = if self.embeddings.is_valid(name) {
            self.resources.first_color().to_string()
        } else {
            tracing::debug!(name, "unknown embedding");
            self.resources.error_color().to_string()
        };

        let id = ctx.fresh_id(SpanKind::Embedding);
        ctx.drafts.push(Draft::Open {
            id: Some(id),
            kind: SpanKind::Embedding,
            color: ColorSlot::Resolved(color),
        });
        ctx.text(&token.value);
        ctx.drafts.push(Draft::Close);
    }

    fn process_open(&self, ctx: &mut Context<'_>, token: &Token) {
        let kind = match token.kind {
            TokenKind::LoraOpen => SpanKind::Lora,
            _ => SpanKind::Group,
        };
        let depth_color = self.resources.color_for_depth(ctx.depth());
        let id = ctx.fresh_id(kind);

        ctx.stack.push(OpenSpan {
            id,
            depth_color,
            opener: token.kind,
        });
        ctx.drafts.push(Draft::Open {
            id: Some(id),
            kind,
            color: ColorSlot::Pending(id),
        });
        ctx.text(&token.value);
    }

    fn process_close(&self, ctx: &mut Context<'_>, token: &Token, index: usize) {
        let open = match ctx.stack.last() {
            Some(open) if open.opener.is_closed_by(token.kind) => *open,
            _ => {
                ctx.text(&token.value);
                return;
            }
        };
        ctx.stack.pop();

        let color = if open.opener == TokenKind::LoraOpen {
            self.lora_color(ctx, &open, index)
        } else {
            self.group_color(ctx, &open, index)
        };
        ctx.resolved.insert(open.id, color);

        ctx.text(&token.value);
        ctx.drafts.push(Draft::Close);
    }

    fn group_color(&self, ctx: &Context<'_>, open: &OpenSpan, index: usize) -> String {
        match self.resources.highlight_type() {
            HighlightType::Strength => strength_color(
                ctx.facts.strength_before(index),
                self.resources.first_color(),
                self.resources.last_color(),
            )
            .to_string(),
            HighlightType::Nesting => open.depth_color.to_string(),
        }
    }

    fn lora_color(&self, ctx: &Context<'_>, open: &OpenSpan, index: usize) -> String {
        let name = ctx.facts.lora_name_before(index);
        if !self.loras.is_valid(name) {
            tracing::debug!(name, "unknown lora");
            return self.resources.error_color().to_string();
        }
        self.group_color(ctx, open, index)
    }

    fn close_unclosed(&self, ctx: &mut Context<'_>) {
        while let Some(open) = ctx.stack.pop() {
            tracing::debug!(id = %open.id, "unclosed group");
            ctx.resolved
                .insert(open.id, self.resources.error_color().to_string());
            ctx.drafts.push(Draft::Close);
        }
    }

    fn resolve_colors(&self, ctx: Context<'_>) -> Vec<Piece> {
        let Context {
            drafts, resolved, ..
        } = ctx;

        drafts
            .into_iter()
            .map(|draft| match draft {
                Draft::Text(text) => Piece::Text(text),
                Draft::Close => Piece::Close,
                Draft::Open { id, kind, color } => {
                    let color = match color {
                        ColorSlot::Resolved(color) => color,
                        ColorSlot::Pending(pending) => resolved
                            .get(&pending)
                            .cloned()
                            .unwrap_or_else(|| self.resources.error_color().to_string()),
                    };
                    Piece::Open { id, kind, color }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::markup::strip_tags;
    use crate::highlight::resources::NameList;
    use crate::highlight::tokenizing::tokenize;
    use std::sync::{Arc, Mutex};

    const ERR: &str = "var(--error-text)";

    fn resources(mode: HighlightType) -> ResourceBundle {
        ResourceBundle::new(["#000000", "#646464", "#c8c8c8"], ERR, mode).unwrap()
    }

    fn markup(text: &str, resources: &ResourceBundle) -> String {
        Highlighter::new(resources)
            .process_tokens(&tokenize(text))
            .to_markup()
    }

    #[test]
    fn test_plain_text_passes_through() {
        let res = resources(HighlightType::Strength);
        assert_eq!(markup("a, b", &res), "a, b");
        assert_eq!(markup("", &res), "");
    }

    #[test]
    fn test_nesting_colors_by_depth() {
        let res = resources(HighlightType::Nesting);
        assert_eq!(
            markup("((x))", &res),
            "<span id=\"span-0\" style=\"background-color: rgb(0, 0, 0);\">(\
             <span id=\"span-1\" style=\"background-color: rgb(100, 100, 100);\">(x)</span>\
             )</span>"
        );
    }

    #[test]
    fn test_strength_uses_weight_before_closer() {
        let res = resources(HighlightType::Strength);
        // weight 2 is the top of the gradient, the default 1 is the eased midpoint
        assert!(markup("(x:2)", &res).contains("background-color: rgb(200, 200, 200);"));
        assert!(markup("(x)", &res).contains("background-color: rgb(100, 100, 100);"));
    }

    #[test]
    fn test_stray_and_mismatched_closers_are_text() {
        let res = resources(HighlightType::Nesting);
        assert_eq!(markup(") >", &res), ") &gt;");
        let out = markup("(a>b)", &res);
        assert_eq!(
            out,
            "<span id=\"span-0\" style=\"background-color: rgb(0, 0, 0);\">(a&gt;b)</span>"
        );
    }

    #[test]
    fn test_unclosed_group_gets_error_color() {
        let res = resources(HighlightType::Nesting);
        assert_eq!(
            markup("(a", &res),
            format!("<span id=\"span-0\" style=\"background-color: {ERR};\">(a</span>")
        );
    }

    #[test]
    fn test_inner_group_closes_outer_stays_open() {
        let res = resources(HighlightType::Nesting);
        let out = markup("((a)", &res);
        assert!(out.starts_with(&format!(
            "<span id=\"span-0\" style=\"background-color: {ERR};\">"
        )));
        assert!(out.contains("<span id=\"span-1\" style=\"background-color: rgb(100, 100, 100);\">(a)</span>"));
        assert!(out.ends_with("</span></span>"));
    }

    #[test]
    fn test_invalid_escape() {
        let res = resources(HighlightType::Strength);
        assert_eq!(
            markup("/(a", &res),
            format!("<span style=\"background-color: {ERR};\">/</span>(a")
        );
    }

    #[test]
    fn test_escape_is_literal() {
        let res = resources(HighlightType::Strength);
        assert_eq!(markup(r"\(a\)", &res), r"\(a\)");
    }

    #[test]
    fn test_embedding_validation() {
        let res = resources(HighlightType::Strength)
            .with_embeddings(NameList::known(["EasyNegative"]));
        assert_eq!(
            markup("embedding:easynegative:1.1", &res),
            "<span id=\"span-0-embedding\" style=\"background-color: rgb(0, 0, 0);\">\
             embedding:easynegative:1.1</span>"
        );
        assert_eq!(
            markup("embedding:other", &res),
            format!("<span id=\"span-0-embedding\" style=\"background-color: {ERR};\">embedding:other</span>")
        );
    }

    #[test]
    fn test_lora_nesting_mode_keeps_depth_color() {
        let res = resources(HighlightType::Nesting).with_loras(NameList::known(["foo"]));
        assert_eq!(
            markup("(<lora:foo:2>)", &res),
            "<span id=\"span-0\" style=\"background-color: rgb(0, 0, 0);\">(\
             <span id=\"span-1-lora\" style=\"background-color: rgb(100, 100, 100);\">\
             &lt;lora:foo:2&gt;</span>)</span>"
        );
    }

    #[test]
    fn test_unknown_lora_is_error_in_any_mode() {
        for mode in [HighlightType::Strength, HighlightType::Nesting] {
            let res = resources(mode).with_loras(NameList::known(["foo"]));
            assert_eq!(
                markup("<lora:bar:1>", &res),
                format!("<span id=\"span-0-lora\" style=\"background-color: {ERR};\">&lt;lora:bar:1&gt;</span>")
            );
        }
    }

    #[test]
    fn test_custom_validator() {
        let res = resources(HighlightType::Nesting);
        let exact = |name: &str| name == "foo";
        let highlighter = Highlighter::with_validators(&res, &exact, &exact);
        let out = highlighter
            .process_tokens(&tokenize("<lora:foobar:1>"))
            .to_markup();
        assert!(out.contains(ERR));
    }

    #[test]
    fn test_ids_restart_each_call() {
        let res = resources(HighlightType::Nesting);
        let highlighter = Highlighter::new(&res);
        let tokens = tokenize("(a) (b)");
        let first = highlighter.process_tokens(&tokens).to_markup();
        let second = highlighter.process_tokens(&tokens).to_markup();
        assert_eq!(first, second);
        assert!(first.contains("span-1"));
        assert!(!first.contains("span-2"));
    }

    #[test]
    fn test_plain_text_is_preserved() {
        let res = resources(HighlightType::Strength);
        let text = r"(a:1.2), <lora:x>, /(b, \(c\), embedding:d, ((e)";
        let highlighted = Highlighter::new(&res).process_tokens(&tokenize(text));
        assert_eq!(highlighted.plain_text(), text);
        assert!(!strip_tags(&highlighted.to_markup()).contains('<'));
    }

    #[test]
    fn test_duplicate_spanning_escape_is_wrapped_once() {
        let res = resources(HighlightType::Strength);
        assert_eq!(
            markup(r"a\(b, a\(b", &res),
            format!(
                "<span style=\"background-color: {ERR};\">a\\(b</span>, \
                 <span style=\"background-color: {ERR};\">a\\(b</span>"
            )
        );
    }

    #[test]
    fn test_many_repeated_tags() {
        let res = resources(HighlightType::Strength);
        let text = "(a:1.2), ".repeat(20_000);
        let highlighted = Highlighter::new(&res).process_tokens(&tokenize(&text));
        let duplicates = highlighted
            .pieces()
            .iter()
            .filter(|piece| matches!(piece, Piece::Open { kind: SpanKind::Duplicate, .. }))
            .count();
        assert_eq!(duplicates, 20_000);
        assert_eq!(highlighted.plain_text(), text);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_invalid_escape_is_logged() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let res = resources(HighlightType::Strength);
        tracing::subscriber::with_default(subscriber, || markup("x /(a", &res));

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("Replace \"/(\" at position 2 with \"\\\""));
    }
}
