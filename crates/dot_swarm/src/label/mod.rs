//! Cluster labels: text wrapping, annealed placement and leader lines.
//!
//! - [`text`]: word wrapping and text measurement used to size label boxes.
//! - [`placer`]: simulated annealing over label positions ([`placer::LabelPlacer`]).
//! - [`leader`]: arc + segment path connecting a cluster to its label.
use glam::Vec2;

use crate::layout::Rect;

pub mod leader;
pub mod placer;
pub mod text;

pub use leader::LeaderPath;
pub use placer::{AnnealConfig, AnnealReport, LabelPlacer};
pub use text::{wordwrap, CharWidthMeasure, TextMeasure};

/// Text box positioned at its first baseline's left end.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LabelBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Vec2) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Occupied rectangle; text extends up from the baseline with 2px descent.
    pub fn rect(&self) -> Rect {
        Rect::new(
            Vec2::new(self.x, self.y - self.height + 2.0),
            Vec2::new(self.x + self.width, self.y + 2.0),
        )
    }
}

/// Point a label's leader line starts from, with a circular keep-out radius.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

impl Anchor {
    pub fn new(x: f32, y: f32, r: f32) -> Self {
        Self { x, y, r }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Bounding square of the keep-out circle.
    pub fn rect(&self) -> Rect {
        Rect::new(
            Vec2::new(self.x - self.r, self.y - self.r),
            Vec2::new(self.x + self.r, self.y + self.r),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_rect_extends_above_baseline() {
        let label = LabelBox::new(10.0, 50.0, 40.0, 20.0);
        let rect = label.rect();
        assert_eq!(rect.min, Vec2::new(10.0, 32.0));
        assert_eq!(rect.max, Vec2::new(50.0, 52.0));
    }

    #[test]
    fn anchor_rect_is_bounding_square() {
        let anchor = Anchor::new(0.0, 0.0, 5.0);
        assert_eq!(anchor.rect().width(), 10.0);
        assert_eq!(anchor.rect().height(), 10.0);
    }
}
