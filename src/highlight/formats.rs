//! Output formats
//!
//! The highlighter's consumer usually wants markup, but the same result can be shown in a
//! terminal or dumped as data for other tools.

use crate::highlight::color::Rgb;
use crate::highlight::error::{FormatError, HighlightError};
use crate::highlight::highlighting::Highlighter;
use crate::highlight::markup::{Highlighted, Piece};
use crate::highlight::resources::ResourceBundle;
use crate::highlight::tokenizing::tokenize;
use crossterm::style::{Color, Stylize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Background for CSS colors a terminal can't show, such as `var(--error-text)`.
const TERMINAL_FALLBACK: Color = Color::DarkRed;

/// Represents the output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Inline-styled span markup
    Markup,
    /// The prompt text without styling
    Plain,
    /// Terminal text with ANSI background colors
    Ansi,
    /// Styled ranges as JSON
    SpansJson,
    /// Token list as JSON
    TokensJson,
    /// Token list as YAML
    TokensYaml,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Markup,
        OutputFormat::Plain,
        OutputFormat::Ansi,
        OutputFormat::SpansJson,
        OutputFormat::TokensJson,
        OutputFormat::TokensYaml,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Markup => "markup",
            OutputFormat::Plain => "plain",
            OutputFormat::Ansi => "ansi",
            OutputFormat::SpansJson => "spans-json",
            OutputFormat::TokensJson => "tokens-json",
            OutputFormat::TokensYaml => "tokens-yaml",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OutputFormat::Markup => "HTML spans with inline background colors",
            OutputFormat::Plain => "the prompt text, unstyled",
            OutputFormat::Ansi => "terminal output with background colors",
            OutputFormat::SpansJson => "colored ranges over the prompt text, as JSON",
            OutputFormat::TokensJson => "tokenizer output, as JSON",
            OutputFormat::TokensYaml => "tokenizer output, as YAML",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.name() == s)
            .ok_or_else(|| FormatError::UnknownFormat(s.to_string()))
    }
}

/// Tokenize, highlight and render `text` in `format`.
pub fn render(
    text: &str,
    resources: &ResourceBundle,
    format: OutputFormat,
) -> Result<String, FormatError> {
    let tokens = tokenize(text);
    match format {
        OutputFormat::TokensJson => {
            serde_json::to_string_pretty(&tokens).map_err(|e| FormatError::Serialization(e.to_string()))
        }
        OutputFormat::TokensYaml => {
            serde_yaml::to_string(&tokens).map_err(|e| FormatError::Serialization(e.to_string()))
        }
        _ => {
            let highlighted = Highlighter::new(resources).process_tokens(&tokens);
            render_highlighted(&highlighted, format)
        }
    }
}

/// Read a whole prompt from `reader` and render it in the format named `format`.
///
/// The format name is checked before anything is read.
pub fn render_reader<R: Read>(
    mut reader: R,
    resources: &ResourceBundle,
    format: &str,
) -> Result<String, HighlightError> {
    let format: OutputFormat = format.parse()?;
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(render(&text, resources, format)?)
}

/// Render an already highlighted result. Token formats are not available here.
pub fn render_highlighted(
    highlighted: &Highlighted,
    format: OutputFormat,
) -> Result<String, FormatError> {
    match format {
        OutputFormat::Markup => Ok(highlighted.to_markup()),
        OutputFormat::Plain => Ok(highlighted.plain_text()),
        OutputFormat::Ansi => Ok(to_ansi(highlighted)),
        OutputFormat::SpansJson => serde_json::to_string_pretty(&highlighted.styled_spans())
            .map_err(|e| FormatError::Serialization(e.to_string())),
        OutputFormat::TokensJson | OutputFormat::TokensYaml => Err(FormatError::UnknownFormat(
            format!("{} (needs the token stream)", format),
        )),
    }
}

/// Terminal rendering: each text run gets the background of its innermost span.
pub fn to_ansi(highlighted: &Highlighted) -> String {
    let mut backgrounds: Vec<Color> = Vec::new();
    let mut run = String::new();
    let mut out = String::new();

    for piece in highlighted.pieces() {
        match piece {
            Piece::Text(text) => run.push_str(text),
            Piece::Open { color, .. } => {
                flush_run(&mut out, &mut run, backgrounds.last());
                backgrounds.push(terminal_color(color));
            }
            Piece::Close => {
                flush_run(&mut out, &mut run, backgrounds.last());
                backgrounds.pop();
            }
        }
    }
    flush_run(&mut out, &mut run, backgrounds.last());
    out
}

fn flush_run(out: &mut String, run: &mut String, background: Option<&Color>) {
    if run.is_empty() {
        return;
    }
    match background {
        Some(color) => out.push_str(&run.as_str().on(*color).to_string()),
        None => out.push_str(run),
    }
    run.clear();
}

fn terminal_color(css: &str) -> Color {
    Rgb::parse(css).map_or(TERMINAL_FALLBACK, |rgb| Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::resources::HighlightType;

    fn resources() -> ResourceBundle {
        ResourceBundle::new(["#000000", "#ffffff"], "var(--error-text)", HighlightType::Nesting)
            .unwrap()
    }

    #[test]
    fn test_format_names_round_trip() {
        for format in OutputFormat::ALL {
            assert_eq!(format.name().parse::<OutputFormat>().unwrap(), format);
        }
        assert_eq!(
            "xml".parse::<OutputFormat>(),
            Err(FormatError::UnknownFormat("xml".into()))
        );
    }

    #[test]
    fn test_plain_and_markup() {
        let res = resources();
        assert_eq!(render("(a)", &res, OutputFormat::Plain).unwrap(), "(a)");
        assert_eq!(
            render("(a)", &res, OutputFormat::Markup).unwrap(),
            "<span id=\"span-0\" style=\"background-color: rgb(0, 0, 0);\">(a)</span>"
        );
    }

    #[test]
    fn test_tokens_json() {
        let out = render("(a", &resources(), OutputFormat::TokensJson).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["kind"], "paren_open");
        assert_eq!(value[1]["value"], "a");
        assert_eq!(value[1]["start"], 1);
    }

    #[test]
    fn test_tokens_yaml() {
        let out = render("<lora:x>", &resources(), OutputFormat::TokensYaml).unwrap();
        assert!(out.contains("kind: lora_open"));
        assert!(out.contains("kind: lora_close"));
    }

    #[test]
    fn test_spans_json() {
        let out = render("x (a)", &resources(), OutputFormat::SpansJson).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["id"], "span-0");
        assert_eq!(value[0]["kind"], "group");
        assert_eq!(value[0]["start"], 2);
        assert_eq!(value[0]["end"], 5);
    }

    #[test]
    fn test_ansi_keeps_text_runs_together() {
        let out = render("x (a", &resources(), OutputFormat::Ansi).unwrap();
        assert!(out.starts_with("x "));
        assert!(out.contains("(a"));
    }

    #[test]
    fn test_render_reader() {
        let out = render_reader("(a)".as_bytes(), &resources(), "plain").unwrap();
        assert_eq!(out, "(a)");
    }

    #[test]
    fn test_render_reader_errors() {
        assert!(matches!(
            render_reader("(a)".as_bytes(), &resources(), "xml"),
            Err(HighlightError::Format(FormatError::UnknownFormat(name))) if name == "xml"
        ));
        let not_utf8: &[u8] = &[0x28, 0xff, 0xfe];
        assert!(matches!(
            render_reader(not_utf8, &resources(), "markup"),
            Err(HighlightError::Io(_))
        ));
    }

    #[test]
    fn test_terminal_color_fallback() {
        assert_eq!(terminal_color("rgb(1, 2, 3)"), Color::Rgb { r: 1, g: 2, b: 3 });
        assert_eq!(terminal_color("var(--error-text)"), TERMINAL_FALLBACK);
    }
}
