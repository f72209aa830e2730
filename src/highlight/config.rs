//! Configuration loading
//!
//! `defaults/highlight.default.toml` is embedded into the binary so that the documented
//! defaults and runtime behavior stay in sync. Callers layer their own files and overrides on
//! top of those defaults via [Loader] before deserializing into [HighlightConfig], which then
//! produces the [ResourceBundle] the highlighter reads.

use crate::highlight::catalog::names_from_dir;
use crate::highlight::color::Rgb;
use crate::highlight::error::{CatalogError, HighlightError};
use crate::highlight::resources::{HighlightType, NameList, ResourceBundle};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../../defaults/highlight.default.toml");

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HighlightConfig {
    pub highlight: PaletteConfig,
    #[serde(default)]
    pub names: NamesConfig,
}

/// Colors and mode
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteConfig {
    pub colors: Vec<String>,
    pub error_color: String,
    pub highlight_type: HighlightType,
}

/// Where known LoRA and embedding names come from.
///
/// For each category an explicit list and a folder may both be given; their names are
/// merged. With neither, the category has no list and every name is accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamesConfig {
    #[serde(default)]
    pub loras: Option<Vec<String>>,
    #[serde(default)]
    pub embeddings: Option<Vec<String>>,
    #[serde(default)]
    pub loras_dir: Option<PathBuf>,
    #[serde(default)]
    pub embeddings_dir: Option<PathBuf>,
}

impl HighlightConfig {
    /// Build the resource bundle, scanning name folders if configured.
    pub fn resources(&self) -> Result<ResourceBundle, HighlightError> {
        let bundle = ResourceBundle::new(
            &self.highlight.colors,
            self.highlight.error_color.as_str(),
            self.highlight.highlight_type,
        )?;
        let loras = merge_names(self.names.loras.as_deref(), self.names.loras_dir.as_deref())?;
        let embeddings = merge_names(
            self.names.embeddings.as_deref(),
            self.names.embeddings_dir.as_deref(),
        )?;
        Ok(bundle.with_loras(loras).with_embeddings(embeddings))
    }
}

fn merge_names(list: Option<&[String]>, dir: Option<&Path>) -> Result<NameList, CatalogError> {
    if list.is_none() && dir.is_none() {
        return Ok(NameList::unavailable());
    }
    let mut names: Vec<String> = list.map(<[String]>::to_vec).unwrap_or_default();
    if let Some(dir) = dir {
        names.extend(names_from_dir(dir)?);
    }
    names.sort();
    names.dedup();
    Ok(NameList::known(names))
}

/// Parse the multi-line color setting: one color per line, blank lines ignored, hex colors
/// normalized to `rgb(r, g, b)`. Lines that aren't colors are kept as written so that
/// [ResourceBundle::new] can report them.
pub fn parse_color_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match (line.starts_with('#'), Rgb::parse(line)) {
            (true, Some(rgb)) => rgb.to_string(),
            _ => line.to_string(),
        })
        .collect()
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<HighlightConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<HighlightConfig, ConfigError> {
    Loader::new().build()
}
