//! Layout state: canvas geometry, clusters and the dot pool.
//!
//! [`resolver`] turns a marker into the active [`Cluster`]s and [`reconcile`]
//! rebuilds the [`Dot`] pool against them. Positions are owned by the
//! simulations in [`crate::sim`].
use std::fmt;

use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::data::Align;
use crate::label::{Anchor, LabelBox};

pub mod reconcile;
pub mod resolver;

/// Canvas size in pixels, supplied by the host's resize observer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A canvas with no drawable area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Center the cluster gravity pulls toward for the given alignment.
    pub fn gravity_center(&self, align: Align) -> Vec2 {
        Vec2::new(self.width * align.width_fraction(), self.height * 0.5)
    }

    /// Full canvas inset by `margin` on every side.
    pub fn inset(&self, margin: f32) -> Rect {
        Rect::new(
            Vec2::splat(margin),
            Vec2::new(self.width - margin, self.height - margin),
        )
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Area of the intersection, zero when disjoint.
    pub fn overlap_area(&self, other: &Rect) -> f32 {
        let x = (self.max.x.min(other.max.x) - self.min.x.max(other.min.x)).max(0.0);
        let y = (self.max.y.min(other.max.y) - self.min.y.max(other.min.y)).max(0.0);
        x * y
    }

    /// Clamps a point into the rectangle shrunk by `inset` on every side.
    ///
    /// An empty interval collapses to its midpoint instead of panicking.
    pub fn clamp_inset(&self, point: Vec2, inset: f32) -> Vec2 {
        Vec2::new(
            clamp_axis(point.x, self.min.x + inset, self.max.x - inset),
            clamp_axis(point.y, self.min.y + inset, self.max.y - inset),
        )
    }
}

#[inline]
fn clamp_axis(v: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi {
        (lo + hi) * 0.5
    } else {
        v.max(lo).min(hi)
    }
}

/// Identity of a cluster across markers: `measure + group`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterKey {
    pub measure: String,
    pub group: String,
}

impl ClusterKey {
    pub fn new(measure: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            measure: measure.into(),
            group: group.into(),
        }
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.measure, self.group)
    }
}

/// A labeled group of dots for one `(measure, comparison, group)` row.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub key: ClusterKey,
    pub comparison: String,
    /// Share of the configured total.
    pub value: f64,
    /// Dots owned by this cluster, apportioned from `value`.
    pub units: usize,
    /// Area-preserving radius derived from `value`.
    pub radius: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Group name wrapped for display.
    pub label_lines: Vec<String>,
    pub label: LabelBox,
    pub anchor: Anchor,
    pub color: Rgb,
}

impl Cluster {
    pub fn group(&self) -> &str {
        &self.key.group
    }

    pub fn measure(&self) -> &str {
        &self.key.measure
    }

    /// Number of dots this cluster needs.
    pub fn dot_count(&self) -> usize {
        self.units
    }

    /// Label position relative to the cluster center.
    pub fn label_offset(&self) -> Vec2 {
        Vec2::new(self.label.x, self.label.y) - self.position
    }
}

/// `r = sqrt(value * k / π)`.
pub fn cluster_radius(value: f64, radius_scale: f32) -> f32 {
    ((value.max(0.0) as f32) * radius_scale / std::f32::consts::PI).sqrt()
}

/// Splits `values` into whole units with the largest remainder method.
///
/// The counts sum to `round(Σ values)`. Ties in the remainder go to the
/// earlier value. Values must be finite and non-negative.
pub fn apportion(values: &[f64]) -> Vec<usize> {
    let mut counts: Vec<usize> = values.iter().map(|v| v.floor() as usize).collect();
    let target = values.iter().sum::<f64>().round() as usize;
    let assigned: usize = counts.iter().sum();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = values[a] - values[a].floor();
        let rb = values[b] - values[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &i in order.iter().take(target.saturating_sub(assigned)) {
        counts[i] += 1;
    }
    counts
}

/// Stable dot identifier, unique for the life of an engine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DotId(pub u64);

/// One visual unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Dot {
    pub id: DotId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Cluster the dot currently swarms around.
    pub cluster: ClusterKey,
    /// Update serial at which the dot was created or last retagged.
    pub reassigned_at: u64,
}

impl Dot {
    pub fn new(id: DotId, position: Vec2, cluster: ClusterKey, serial: u64) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            cluster,
            reassigned_at: serial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_canvas_detection() {
        assert!(Canvas::new(0.0, 100.0).is_degenerate());
        assert!(Canvas::new(100.0, -1.0).is_degenerate());
        assert!(Canvas::new(f32::NAN, 100.0).is_degenerate());
        assert!(!Canvas::new(400.0, 300.0).is_degenerate());
    }

    #[test]
    fn gravity_center_follows_alignment() {
        let canvas = Canvas::new(300.0, 200.0);
        assert_eq!(canvas.gravity_center(Align::Center), Vec2::new(150.0, 100.0));
        assert!((canvas.gravity_center(Align::Left).x - 100.0).abs() < 1e-3);
        assert!((canvas.gravity_center(Align::Right).x - 200.0).abs() < 1e-3);
    }

    #[test]
    fn clamp_inset_respects_bounds_and_empty_intervals() {
        let rect = Canvas::new(100.0, 100.0).inset(10.0);
        assert_eq!(rect.clamp_inset(Vec2::new(-5.0, 200.0), 5.0), Vec2::new(15.0, 85.0));
        // Inset larger than the rect collapses to the midpoint.
        assert_eq!(rect.clamp_inset(Vec2::new(0.0, 0.0), 60.0), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn overlap_area_of_rects() {
        let a = Rect::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Rect::new(Vec2::new(5.0, 5.0), Vec2::new(20.0, 20.0));
        let c = Rect::new(Vec2::new(30.0, 30.0), Vec2::new(40.0, 40.0));
        assert_eq!(a.overlap_area(&b), 25.0);
        assert_eq!(a.overlap_area(&c), 0.0);
        assert!(Rect::new(Vec2::ZERO, Vec2::splat(50.0)).contains_rect(&a));
        assert!(!a.contains_rect(&b));
    }

    #[test]
    fn radius_grows_with_value_and_preserves_area() {
        let k = 420.0;
        let r40 = cluster_radius(40.0, k);
        let r60 = cluster_radius(60.0, k);
        assert!(r60 > r40);
        let area_ratio = (r60 * r60) / (r40 * r40);
        assert!((area_ratio - 1.5).abs() < 1e-4);
        assert_eq!(cluster_radius(-3.0, k), 0.0);
    }

    #[test]
    fn apportion_keeps_the_rounded_total() {
        assert_eq!(apportion(&[40.0, 60.0]), vec![40, 60]);
        assert_eq!(apportion(&[33.5, 66.5]), vec![34, 66]);
        assert_eq!(apportion(&[33.4, 33.3, 33.3]), vec![34, 33, 33]);
        assert_eq!(apportion(&[0.4, 0.4, 0.2]), vec![1, 0, 0]);
        let counts = apportion(&[12.25, 30.25, 27.25, 20.25]);
        assert_eq!(counts.iter().sum::<usize>(), 90);
        assert!(apportion(&[]).is_empty());
    }

    #[test]
    fn cluster_key_display() {
        assert_eq!(ClusterKey::new("m", "A").to_string(), "m+A");
    }
}
