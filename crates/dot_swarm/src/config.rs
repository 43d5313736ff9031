//! Engine configuration.
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::{ColorProperty, ColorScale, DEFAULT_PALETTE};
use crate::error::{Error, Result};
use crate::label::AnnealConfig;
use crate::sim::{ClusterSimConfig, DotSimConfig};

/// Multiplier turning `mark_radius + mark_margin` into the radius packing constant.
pub const PACKING_FACTOR: f32 = 35.0;

/// Configuration for a [`crate::engine::LayoutEngine`].
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Sum active and reserved values must reach for every marker.
    pub total: f64,
    /// Inset from each canvas edge kept free of clusters and dots.
    pub margin: f32,
    /// Radius of a drawn dot.
    pub mark_radius: f32,
    /// Extra space around each dot.
    pub mark_margin: f32,
    /// Packing constant `k` in `r = sqrt(value * k / π)`.
    /// `None` derives it from the mark size.
    pub radius_scale: Option<f32>,
    /// Gap kept between cluster edges.
    pub cluster_padding: f32,
    /// Maximum characters per wrapped label line.
    pub label_wrap_chars: usize,
    /// Vertical space reserved per label line above a new cluster.
    pub label_line_offset: f32,
    /// Keep-out distance around a cluster for its label.
    pub anchor_margin: f32,
    /// Space left above the top cluster row for labels.
    pub label_headroom: f32,
    pub label_sweeps_per_cluster: usize,
    /// Groups that count toward the total but are never drawn.
    pub reserved_groups: HashSet<String>,
    /// Hex colors of the ordinal scale.
    pub palette: Vec<String>,
    pub color_property: ColorProperty,
    /// Alpha of the panel background color.
    pub panel_alpha: f32,
    /// Seed for every random decision the engine makes.
    pub seed: u64,
    pub cluster_sim: ClusterSimConfig,
    pub dot_sim: DotSimConfig,
    pub anneal: AnnealConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            total: 100.0,
            margin: 10.0,
            mark_radius: 5.0,
            mark_margin: 7.0,
            radius_scale: None,
            cluster_padding: 20.0,
            label_wrap_chars: 10,
            label_line_offset: 15.0,
            anchor_margin: 20.0,
            label_headroom: 40.0,
            label_sweeps_per_cluster: 2,
            reserved_groups: HashSet::new(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            color_property: ColorProperty::Measure,
            panel_alpha: 0.85,
            seed: 0,
            cluster_sim: ClusterSimConfig::default(),
            dot_sim: DotSimConfig::default(),
            anneal: AnnealConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total(mut self, total: f64) -> Self {
        self.total = total;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Sets dot radius and margin. The dot collision radius follows the margin.
    pub fn with_marks(mut self, mark_radius: f32, mark_margin: f32) -> Self {
        self.mark_radius = mark_radius;
        self.mark_margin = mark_margin;
        self.dot_sim.collide_radius = mark_margin;
        self
    }

    pub fn with_radius_scale(mut self, radius_scale: f32) -> Self {
        self.radius_scale = Some(radius_scale);
        self
    }

    pub fn with_cluster_padding(mut self, cluster_padding: f32) -> Self {
        self.cluster_padding = cluster_padding;
        self
    }

    pub fn with_label_wrap_chars(mut self, label_wrap_chars: usize) -> Self {
        self.label_wrap_chars = label_wrap_chars;
        self
    }

    pub fn with_label_headroom(mut self, label_headroom: f32) -> Self {
        self.label_headroom = label_headroom;
        self
    }

    pub fn with_label_sweeps_per_cluster(mut self, sweeps: usize) -> Self {
        self.label_sweeps_per_cluster = sweeps;
        self
    }

    /// Adds a group that is counted in totals but never drawn.
    pub fn with_reserved_group(mut self, group: impl Into<String>) -> Self {
        self.reserved_groups.insert(group.into());
        self
    }

    pub fn with_palette<S: Into<String>>(mut self, palette: impl IntoIterator<Item = S>) -> Self {
        self.palette = palette.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_color_property(mut self, color_property: ColorProperty) -> Self {
        self.color_property = color_property;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cluster_sim(mut self, cluster_sim: ClusterSimConfig) -> Self {
        self.cluster_sim = cluster_sim;
        self
    }

    pub fn with_dot_sim(mut self, dot_sim: DotSimConfig) -> Self {
        self.dot_sim = dot_sim;
        self
    }

    pub fn with_anneal(mut self, anneal: AnnealConfig) -> Self {
        self.anneal = anneal;
        self
    }

    /// Effective packing constant, 420 with the default marks.
    pub fn radius_scale(&self) -> f32 {
        self.radius_scale
            .unwrap_or((self.mark_radius + self.mark_margin) * PACKING_FACTOR)
    }

    pub fn is_reserved(&self, group: &str) -> bool {
        self.reserved_groups.contains(group)
    }

    /// Builds the color scale described by `palette` and `color_property`.
    pub fn color_scale(&self) -> Result<ColorScale> {
        ColorScale::from_hex_palette(&self.palette, self.color_property)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.total.is_finite() && self.total > 0.0) {
            return Err(Error::InvalidConfig("total must be > 0".into()));
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(Error::InvalidConfig("margin must be >= 0".into()));
        }
        if !(self.mark_radius > 0.0 && self.mark_margin >= 0.0) {
            return Err(Error::InvalidConfig(
                "mark_radius must be > 0 and mark_margin >= 0".into(),
            ));
        }
        if !(self.radius_scale().is_finite() && self.radius_scale() > 0.0) {
            return Err(Error::InvalidConfig("radius_scale must be > 0".into()));
        }
        if self.cluster_padding < 0.0 || self.anchor_margin < 0.0 || self.label_headroom < 0.0 {
            return Err(Error::InvalidConfig(
                "cluster_padding, anchor_margin and label_headroom must be >= 0".into(),
            ));
        }
        if self.label_wrap_chars == 0 {
            return Err(Error::InvalidConfig("label_wrap_chars must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.panel_alpha) {
            return Err(Error::InvalidConfig("panel_alpha must be in [0, 1]".into()));
        }
        if self.anneal.max_move < 0.0 || self.anneal.initial_temperature <= 0.0 {
            return Err(Error::InvalidConfig(
                "anneal.max_move must be >= 0 and initial_temperature > 0".into(),
            ));
        }
        self.color_scale()?;
        self.cluster_sim.validate()?;
        self.dot_sim.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.radius_scale(), 420.0);
        assert_eq!(config.palette.len(), 7);
    }

    #[test]
    fn marks_drive_radius_scale_and_collision() {
        let config = EngineConfig::default().with_marks(4.0, 6.0);
        assert_eq!(config.radius_scale(), 350.0);
        assert_eq!(config.dot_sim.collide_radius, 6.0);
        assert_eq!(config.with_radius_scale(100.0).radius_scale(), 100.0);
    }

    #[test]
    fn reserved_groups() {
        let config = EngineConfig::default().with_reserved_group("Not stated");
        assert!(config.is_reserved("Not stated"));
        assert!(!config.is_reserved("Renters"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(EngineConfig::default().with_total(0.0).validate().is_err());
        assert!(EngineConfig::default().with_margin(-1.0).validate().is_err());
        assert!(EngineConfig::default().with_label_wrap_chars(0).validate().is_err());
        assert!(EngineConfig::default()
            .with_palette(Vec::<String>::new())
            .validate()
            .is_err());
        let err = EngineConfig::default()
            .with_palette(["#12345"])
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidColor(_)));
        assert!(EngineConfig::default()
            .with_cluster_sim(ClusterSimConfig::default().with_max_iterations(0))
            .validate()
            .is_err());
    }
}
