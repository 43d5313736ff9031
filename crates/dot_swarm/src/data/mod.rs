//! Input records and narrative markers.
//!
//! [`Row`]s are loaded once (see [`csv`]) and indexed by [`catalog::DataCatalog`].
//! A [`Marker`] selects which `(measure, comparison)` slice of the rows is active.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod csv;

pub use catalog::DataCatalog;

/// One immutable record of the input dataset.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub measure: String,
    pub comparison: String,
    pub group: String,
    /// Share of the configured total, usually in `0..=100`.
    pub value: f64,
    /// Optional per-row color that overrides the palette.
    #[cfg_attr(feature = "serde", serde(default))]
    pub color: Option<String>,
}

impl Row {
    pub fn new(
        measure: impl Into<String>,
        comparison: impl Into<String>,
        group: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            measure: measure.into(),
            comparison: comparison.into(),
            group: group.into(),
            value,
            color: None,
        }
    }

    /// Sets the color override.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Horizontal bias applied to the cluster gravity center.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    Left,
    #[default]
    Center,
    Right,
}

impl Align {
    /// Fraction of the canvas width where the gravity center sits.
    pub fn width_fraction(self) -> f32 {
        match self {
            Align::Left => 1.0 / 3.0,
            Align::Center => 0.5,
            Align::Right => 2.0 / 3.0,
        }
    }
}

/// A discrete narrative state emitted by the external story controller.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub measure: String,
    pub comparison: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub align: Align,
}

impl Marker {
    pub fn new(measure: impl Into<String>, comparison: impl Into<String>) -> Self {
        Self {
            measure: measure.into(),
            comparison: comparison.into(),
            align: Align::Center,
        }
    }

    /// Sets the horizontal alignment.
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}
