//! Stroke colors, palette and brush presets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a color string is not `#rrggbb` or `#rgb`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #rrggbb")]
pub struct ColorParseError(pub String);

/// Opaque RGB color, stored and persisted as a `#rrggbb` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` (or shorthand `#rgb`) hex color
    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(value.to_string());
        let hex = value.strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }

        match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
                Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
            }
            3 => {
                let channel = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| err())
                };
                Ok(Self::new(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => Err(err()),
        }
    }

    /// Lowercase `#rrggbb` representation
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Normalized (0.0 to 1.0) channel triple, as PDF color operators expect
    pub fn to_normalized(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

/// Palette offered by the toolbar
impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const RED: Rgb = Rgb::new(0xef, 0x44, 0x44);
    pub const GREEN: Rgb = Rgb::new(0x22, 0xc5, 0x5e);
    pub const DARK_BLUE: Rgb = Rgb::new(0x1e, 0x40, 0xaf);
    pub const ORANGE: Rgb = Rgb::new(0xf9, 0x73, 0x16);
    pub const PURPLE: Rgb = Rgb::new(0xa8, 0x55, 0xf7);
    pub const YELLOW: Rgb = Rgb::new(0xea, 0xb3, 0x08);
    pub const PINK: Rgb = Rgb::new(0xec, 0x48, 0x99);
    pub const CYAN: Rgb = Rgb::new(0x06, 0xb6, 0xd4);
    pub const BLUE: Rgb = Rgb::new(0x3b, 0x82, 0xf6);
}

/// Colors always visible in the palette
pub const PRIMARY_COLORS: [(&str, Rgb); 5] = [
    ("black", Rgb::BLACK),
    ("white", Rgb::WHITE),
    ("red", Rgb::RED),
    ("green", Rgb::GREEN),
    ("dark blue", Rgb::DARK_BLUE),
];

/// Colors shown when the palette is expanded
pub const EXTRA_COLORS: [(&str, Rgb); 6] = [
    ("orange", Rgb::ORANGE),
    ("purple", Rgb::PURPLE),
    ("yellow", Rgb::YELLOW),
    ("pink", Rgb::PINK),
    ("cyan", Rgb::CYAN),
    ("blue", Rgb::BLUE),
];

/// Pen widths in page units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSize {
    Thin,
    #[default]
    Medium,
    Thick,
    ExtraThick,
}

impl LineSize {
    pub const ALL: [LineSize; 4] = [
        LineSize::Thin,
        LineSize::Medium,
        LineSize::Thick,
        LineSize::ExtraThick,
    ];

    pub fn width(self) -> f32 {
        match self {
            LineSize::Thin => 2.0,
            LineSize::Medium => 4.0,
            LineSize::Thick => 8.0,
            LineSize::ExtraThick => 12.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LineSize::Thin => "thin",
            LineSize::Medium => "medium",
            LineSize::Thick => "thick",
            LineSize::ExtraThick => "extra thick",
        }
    }
}

pub const HIGHLIGHTER_SIZE: f32 = 20.0;
pub const HIGHLIGHTER_OPACITY: f32 = 0.5;

/// Color, width and opacity applied to the stroke being drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushStyle {
    pub color: Rgb,
    /// Width in page units
    pub line_width: f32,
    /// Whole-stroke opacity in (0, 1]
    pub opacity: f32,
}

impl BrushStyle {
    /// Opaque pen of the given size
    pub fn pen(color: Rgb, size: LineSize) -> Self {
        Self {
            color,
            line_width: size.width(),
            opacity: 1.0,
        }
    }

    /// Wide translucent highlighter
    pub fn highlighter(color: Rgb) -> Self {
        Self {
            color,
            line_width: HIGHLIGHTER_SIZE,
            opacity: HIGHLIGHTER_OPACITY,
        }
    }
}

impl Default for BrushStyle {
    fn default() -> Self {
        Self::pen(Rgb::BLACK, LineSize::default())
    }
}
