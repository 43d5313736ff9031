//! Ordinal color scale keyed by a row/marker property.
//!
//! Colors are handed out in first-seen key order and cycle through the palette,
//! so the same measure keeps the same color for the whole story.
use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{Marker, Row};
use crate::error::{Error, Result};

/// Default story palette.
pub const DEFAULT_PALETTE: [&str; 7] = [
    "#3C6998", "#B05154", "#1B7A7D", "#8D4579", "#97593F", "#605487", "#306C3F",
];

/// An opaque 8-bit RGB color.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Parses `#rgb` or `#rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex
            .strip_prefix('#')
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| Error::InvalidColor(hex.to_owned()))?;
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_owned(),
            _ => return Err(Error::InvalidColor(hex.to_owned())),
        };
        let value =
            u32::from_str_radix(&expanded, 16).map_err(|_| Error::InvalidColor(hex.to_owned()))?;
        Ok(Rgb([
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ]))
    }

    /// CSS `rgba(r,g,b,a)` string.
    pub fn to_rgba_string(&self, alpha: f32) -> String {
        let [r, g, b] = self.0;
        format!("rgba({r},{g},{b},{alpha})")
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

/// Which field a color is keyed by.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorProperty {
    #[default]
    Measure,
    Comparison,
    Group,
}

impl ColorProperty {
    pub fn row_key<'a>(&self, row: &'a Row) -> &'a str {
        match self {
            ColorProperty::Measure => &row.measure,
            ColorProperty::Comparison => &row.comparison,
            ColorProperty::Group => &row.group,
        }
    }

    /// Markers carry no group; keying by group falls back to the measure.
    pub fn marker_key<'a>(&self, marker: &'a Marker) -> &'a str {
        match self {
            ColorProperty::Comparison => &marker.comparison,
            ColorProperty::Measure | ColorProperty::Group => &marker.measure,
        }
    }
}

/// Ordinal scale mapping keys to palette entries.
#[derive(Debug, Clone)]
pub struct ColorScale {
    palette: Vec<Rgb>,
    property: ColorProperty,
    assigned: HashMap<String, usize>,
}

impl ColorScale {
    /// Creates a scale from hex strings. The palette must not be empty.
    pub fn from_hex_palette<S: AsRef<str>>(palette: &[S], property: ColorProperty) -> Result<Self> {
        let palette = palette
            .iter()
            .map(|s| Rgb::from_hex(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(palette, property)
    }

    pub fn new(palette: Vec<Rgb>, property: ColorProperty) -> Result<Self> {
        if palette.is_empty() {
            return Err(Error::InvalidConfig("color palette must not be empty".into()));
        }
        Ok(Self {
            palette,
            property,
            assigned: HashMap::new(),
        })
    }

    pub fn property(&self) -> ColorProperty {
        self.property
    }

    /// Color for a key, assigning the next palette slot on first use.
    pub fn color(&mut self, key: &str) -> Rgb {
        let next = self.assigned.len();
        let slot = *self.assigned.entry(key.to_owned()).or_insert(next);
        self.palette[slot % self.palette.len()]
    }

    /// Color of a row: its override if it parses, else the scale color.
    pub fn row_color(&mut self, row: &Row) -> Rgb {
        if let Some(color) = row.color.as_deref().and_then(|c| Rgb::from_hex(c).ok()) {
            return color;
        }
        let key = self.property.row_key(row).to_owned();
        self.color(&key)
    }

    pub fn marker_color(&mut self, marker: &Marker) -> Rgb {
        let key = self.property.marker_key(marker).to_owned();
        self.color(&key)
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE
                .iter()
                .filter_map(|hex| Rgb::from_hex(hex).ok())
                .collect(),
            property: ColorProperty::Measure,
            assigned: HashMap::new(),
        }
    }
}
