//! Renderer-facing snapshot of the layout.
//!
//! A [`RenderFrame`] is plain data: the engine never draws. Points are exposed
//! as [`mint::Point2`] so hosts can convert into their own math types.
use crate::color::Rgb;
use crate::label::{Anchor, LabelBox, LeaderPath};
use crate::layout::{ClusterKey, DotId};

/// One drawable dot.
#[derive(Debug, Clone, PartialEq)]
pub struct DotFrame {
    pub id: DotId,
    /// Position clamped into the canvas inset by the margin.
    pub position: mint::Point2<f32>,
    pub radius: f32,
    pub cluster: ClusterKey,
    pub color: Rgb,
}

/// One drawable cluster with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterFrame {
    pub key: ClusterKey,
    pub value: f64,
    pub radius: f32,
    pub position: mint::Point2<f32>,
    pub label: LabelBox,
    pub label_lines: Vec<String>,
    pub anchor: Anchor,
    pub leader: LeaderPath,
    pub color: Rgb,
}

impl ClusterFrame {
    /// `translate(x, y)` transform for the label text.
    pub fn label_transform(&self) -> String {
        format!("translate({}, {})", self.label.x, self.label.y)
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderFrame {
    pub width: f32,
    pub height: f32,
    /// Color of the current marker.
    pub background: Rgb,
    /// Background as translucent CSS, for panels drawn over the canvas.
    pub panel_background: String,
    pub dots: Vec<DotFrame>,
    pub clusters: Vec<ClusterFrame>,
}

impl RenderFrame {
    pub fn is_empty(&self) -> bool {
        self.dots.is_empty() && self.clusters.is_empty()
    }

    pub fn cluster(&self, key: &ClusterKey) -> Option<&ClusterFrame> {
        self.clusters.iter().find(|c| &c.key == key)
    }
}
