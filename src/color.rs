use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type Rgb = (u8, u8, u8);

pub const BLACK: Rgb = (0, 0, 0);

// Tk 8.6 values: green, gray, maroon and purple follow the web definitions.
const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("maroon", (128, 0, 0)),
    ("brown", (165, 42, 42)),
    ("pink", (255, 192, 203)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("olive", (128, 128, 0)),
];

/// Converts a hex color string like `"#FF0000"` to an RGB triple.
///
/// Leading and trailing `#` are stripped and the first three character pairs
/// are parsed as hex bytes. Anything that does not parse resolves to black.
pub fn hex_to_rgb(hex_color: &str) -> Rgb {
    parse_hex(hex_color).unwrap_or_else(|| {
        log::debug!("Unparseable color {:?}, falling back to black", hex_color);
        BLACK
    })
}

fn parse_hex(hex_color: &str) -> Option<Rgb> {
    let digits = hex_color.trim_matches('#');
    let byte = |range: std::ops::Range<usize>| {
        let pair = digits.get(range)?;
        if pair.len() != 2 || !pair.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u8::from_str_radix(pair, 16).ok()
    };
    Some((byte(0..2)?, byte(2..4)?, byte(4..6)?))
}

pub fn named_color(name: &str) -> Option<Rgb> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, rgb)| *rgb)
}

/// A color exactly as the canvas stores it: a symbolic name or `#RRGGBB`.
/// The text is kept verbatim so saved files round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color {
    text: String,
    hex: Option<Rgb>,
}

impl Color {
    pub fn parse(value: &str) -> Self {
        let text = value.trim().to_string();
        let hex = if text.starts_with('#') && text.len() == 7 {
            parse_hex(&text)
        } else {
            None
        };
        Self { text, hex }
    }

    pub fn named(name: &str) -> Self {
        Self::parse(name)
    }

    pub fn from_rgb(rgb: Rgb) -> Self {
        let (r, g, b) = rgb;
        Self {
            text: format!("#{:02x}{:02x}{:02x}", r, g, b),
            hex: Some(rgb),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Resolves to RGB. Never fails: unknown names go through
    /// [`hex_to_rgb`] and usually end up black.
    pub fn to_rgb(&self) -> Rgb {
        self.hex
            .or_else(|| named_color(&self.text))
            .unwrap_or_else(|| hex_to_rgb(&self.text))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Color::parse(value)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Color::parse(&value))
    }
}
