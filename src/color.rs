use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// A 24-bit RGB color packed as `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(u32);

impl Color {
    pub const BLACK: Color = Color(0);

    /// Pack three channel bytes
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Pack three channels given as wider integers, rejecting anything outside 0..=255
    pub fn try_from_rgb(r: i32, g: i32, b: i32) -> Result<Self> {
        match (u8::try_from(r), u8::try_from(g), u8::try_from(b)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Color::new(r, g, b)),
            _ => Err(Error::Range(format!(
                "color values must be 0 to 255, got ({}, {}, {})",
                r, g, b
            ))),
        }
    }

    /// Accept an already packed value, rejecting bits above the low 24
    pub fn from_packed(value: u32) -> Result<Self> {
        if value > 0xFF_FFFF {
            return Err(Error::Range(format!(
                "packed color {:#x} does not fit in 24 bits",
                value
            )));
        }
        Ok(Color(value))
    }

    pub const fn packed(self) -> u32 {
        self.0
    }

    /// Split into `(r, g, b)`
    pub const fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    /// Scale every channel by `brightness`, truncating toward zero.
    ///
    /// Truncation is intentional: 255 at half brightness is 127, not 128.
    pub fn scale(self, brightness: Brightness) -> (u8, u8, u8) {
        let (r, g, b) = self.rgb();
        let factor = brightness.value();
        let scale = |c: u8| (f64::from(c) * factor) as u8;
        (scale(r), scale(g), scale(b))
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Color::new(r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse `#RRGGBB` or `RRGGBB`
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::Range(format!("expected 6 hex digits in color {:?}", s)));
        }
        let value = u32::from_str_radix(hex, 16)
            .map_err(|e| Error::Range(format!("invalid color {:?}: {}", s, e)))?;
        Color::from_packed(value)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Output scale factor in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Brightness(f64);

impl Brightness {
    pub const FULL: Brightness = Brightness(1.0);

    pub fn new(value: f64) -> Result<Self> {
        // NaN fails both comparisons
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::Range(format!(
                "brightness must be 0 to 1.0, got {}",
                value
            )));
        }
        Ok(Brightness(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Brightness {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Brightness::new(value).map_err(serde::de::Error::custom)
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Brightness::FULL
    }
}
