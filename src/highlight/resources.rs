//! Resources consumed by the highlighter
//!
//!     The highlighter itself knows nothing about settings or model folders. Everything it
//!     needs arrives in a [ResourceBundle]: the color palette, the error color, the highlight
//!     mode, and the lists of known LoRA and embedding names. A bundle is treated as a read-only
//!     snapshot for one highlighting call.
//!
//! Name Validation
//!
//!     Name lookups go through the [NameValidator] trait so callers can swap the matching
//!     strategy. The stock [NameList] is loose: a name is valid when it contains a list entry or
//!     a list entry contains it, ignoring case, so a short name like `a` matches almost any
//!     list. When no list is available at all, every name is valid.

use crate::highlight::color::Rgb;
use crate::highlight::error::ResourceError;
use std::fmt;
use std::str::FromStr;

/// How closed groups are colored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightType {
    /// Color from the trailing weight, on the gradient between the first and last color
    #[default]
    Strength,
    /// Color from nesting depth, cycling through the palette
    Nesting,
}

impl fmt::Display for HighlightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightType::Strength => write!(f, "strength"),
            HighlightType::Nesting => write!(f, "nesting"),
        }
    }
}

impl FromStr for HighlightType {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strength" => Ok(HighlightType::Strength),
            "nesting" => Ok(HighlightType::Nesting),
            other => Err(ResourceError::UnknownHighlightType(other.to_string())),
        }
    }
}

/// Decides whether a referenced name is known.
pub trait NameValidator {
    fn is_valid(&self, name: &str) -> bool;
}

impl<F> NameValidator for F
where
    F: Fn(&str) -> bool,
{
    fn is_valid(&self, name: &str) -> bool {
        self(name)
    }
}

/// A list of known names, or the absence of one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList {
    names: Option<Vec<String>>,
}

impl NameList {
    /// No reference data: every name validates.
    pub fn unavailable() -> Self {
        NameList { names: None }
    }

    pub fn known<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameList {
            names: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.names.is_some()
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }
}

impl NameValidator for NameList {
    fn is_valid(&self, name: &str) -> bool {
        let Some(names) = &self.names else {
            return true;
        };
        let name = name.to_lowercase();
        names.iter().any(|entry| {
            let entry = entry.to_lowercase();
            entry.contains(&name) || name.contains(&entry)
        })
    }
}

/// Everything a highlighting call reads
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBundle {
    colors: Vec<Rgb>,
    error_color: String,
    highlight_type: HighlightType,
    pub valid_loras: NameList,
    pub valid_embeddings: NameList,
}

impl ResourceBundle {
    /// Build a bundle, rejecting an empty palette, unparseable colors, or a blank error color.
    ///
    /// The error color is kept verbatim and may be any CSS value. Palette colors must carry
    /// RGB channels since the strength gradient interpolates them.
    pub fn new<I, S>(
        colors: I,
        error_color: impl Into<String>,
        highlight_type: HighlightType,
    ) -> Result<Self, ResourceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let colors = colors
            .into_iter()
            .map(|color| {
                let color = color.as_ref();
                Rgb::parse(color).ok_or_else(|| ResourceError::InvalidColor(color.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if colors.is_empty() {
            return Err(ResourceError::EmptyColors);
        }

        let error_color = error_color.into().trim().to_string();
        if error_color.is_empty() {
            return Err(ResourceError::EmptyErrorColor);
        }

        Ok(ResourceBundle {
            colors,
            error_color,
            highlight_type,
            valid_loras: NameList::unavailable(),
            valid_embeddings: NameList::unavailable(),
        })
    }

    pub fn with_loras(mut self, loras: NameList) -> Self {
        self.valid_loras = loras;
        self
    }

    pub fn with_embeddings(mut self, embeddings: NameList) -> Self {
        self.valid_embeddings = embeddings;
        self
    }

    /// Palette color for a nesting depth, cycling.
    pub fn color_for_depth(&self, depth: usize) -> Rgb {
        self.colors[depth % self.colors.len()]
    }

    pub fn first_color(&self) -> Rgb {
        self.colors[0]
    }

    pub fn last_color(&self) -> Rgb {
        self.colors[self.colors.len() - 1]
    }

    pub fn error_color(&self) -> &str {
        &self.error_color
    }

    pub fn highlight_type(&self) -> HighlightType {
        self.highlight_type
    }
}
