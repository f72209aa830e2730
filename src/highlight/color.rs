//! Colors and the strength gradient
//!
//!     Colors arrive as CSS strings from settings, either `#rrggbb` (or `#rgb`) hex or a
//!     functional `rgb(r, g, b)` / `rgba(r, g, b, a)`. Hex colors are normalized to the
//!     `rgb(r, g, b)` form before use, and that is also the form every computed color is
//!     rendered in.
//!
//!     A strength in `[0, 2]` maps onto the gradient between the first and last palette color:
//!     the strength is halved to `t in [0, 1]`, eased with a cubic ease-in-out curve, and each
//!     channel is interpolated and rounded.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static CHANNEL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("valid channel pattern"));

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parse a hex or functional color. Returns `None` for anything without three channels.
    ///
    /// Functional colors take the first three integer runs as channels, so `rgba(1, 2, 3, 0.5)`
    /// reads as `rgb(1, 2, 3)`. Channels above 255 saturate.
    pub fn parse(input: &str) -> Option<Rgb> {
        let input = input.trim();
        match input.strip_prefix('#') {
            Some(hex) => Self::parse_hex(hex),
            None => Self::parse_channels(input),
        }
    }

    fn parse_hex(hex: &str) -> Option<Rgb> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Some(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }

    fn parse_channels(input: &str) -> Option<Rgb> {
        let mut channels = CHANNEL_REGEX
            .find_iter(input)
            .map(|m| m.as_str().parse::<u32>().map_or(255, |v| v.min(255) as u8));
        Some(Rgb::new(channels.next()?, channels.next()?, channels.next()?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::parse(s).ok_or_else(|| s.to_string())
    }
}

/// Cubic ease-in-out over `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Linear per-channel interpolation, rounding half up.
pub fn interpolate(from: Rgb, to: Rgb, factor: f64) -> Rgb {
    let channel = |a: u8, b: u8| {
        let value = f64::from(a) + factor * (f64::from(b) - f64::from(a));
        (value + 0.5).floor().clamp(0.0, 255.0) as u8
    };
    Rgb::new(
        channel(from.r, to.r),
        channel(from.g, to.g),
        channel(from.b, to.b),
    )
}

/// Color for a group weight: clamp to `[0, 2]`, normalize, ease, interpolate.
pub fn strength_color(strength: f64, from: Rgb, to: Rgb) -> Rgb {
    let clamped = if strength.is_nan() {
        0.0
    } else {
        strength.clamp(0.0, 2.0)
    };
    interpolate(from, to, ease_in_out_cubic(clamped / 2.0))
}
