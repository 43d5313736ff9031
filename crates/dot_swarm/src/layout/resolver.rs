//! Marker → active clusters.
//!
//! The resolver is a pure function of the catalog, the marker and the previous
//! clusters. Clusters whose `measure + group` key survives keep their position,
//! velocity and label offset so the relaxation hot-starts; every derived field
//! is recomputed, which makes repeated calls idempotent.
use glam::Vec2;
use tracing::{debug, warn};

use crate::color::ColorScale;
use crate::config::EngineConfig;
use crate::data::{DataCatalog, Marker};
use crate::error::{Error, Result};
use crate::label::{wordwrap, Anchor, LabelBox, TextMeasure};
use crate::layout::{apportion, cluster_radius, Canvas, Cluster, ClusterKey};
use crate::sim::cluster::phyllotaxis_offset;

/// Allowed difference between the summed values and the configured total.
pub const TOTAL_TOLERANCE: f64 = 1e-6;

/// Resolves the clusters of a marker.
pub struct ClusterResolver<'a> {
    config: &'a EngineConfig,
    text: &'a dyn TextMeasure,
}

impl<'a> ClusterResolver<'a> {
    pub fn new(config: &'a EngineConfig, text: &'a dyn TextMeasure) -> Self {
        Self { config, text }
    }

    /// Active clusters for `marker`, in dataset order.
    ///
    /// Fails with [`Error::DataIntegrity`] when a value is negative or not
    /// finite, or when active and reserved values do not add up to the
    /// configured total; nothing is mutated in that case.
    pub fn resolve(
        &self,
        catalog: &DataCatalog,
        marker: &Marker,
        previous: &[Cluster],
        canvas: Canvas,
        colors: &mut ColorScale,
    ) -> Result<Vec<Cluster>> {
        let rows: Vec<_> = catalog.rows_for(&marker.measure, &marker.comparison).collect();

        let total: f64 = rows.iter().map(|r| r.value).sum();
        if let Some(row) = rows.iter().find(|r| !r.value.is_finite() || r.value < 0.0) {
            warn!(
                "Group error: value of '{}' for '{}'/'{}' is {}.",
                row.group, marker.measure, marker.comparison, row.value
            );
            return Err(Error::DataIntegrity {
                measure: marker.measure.clone(),
                comparison: marker.comparison.clone(),
                total,
                expected: self.config.total,
            });
        }
        if !total.is_finite() || (total - self.config.total).abs() > TOTAL_TOLERANCE {
            warn!(
                "Group error: total value for '{}'/'{}' is {}, it should be {}.",
                marker.measure, marker.comparison, total, self.config.total
            );
            return Err(Error::DataIntegrity {
                measure: marker.measure.clone(),
                comparison: marker.comparison.clone(),
                total,
                expected: self.config.total,
            });
        }

        let seed = canvas.gravity_center(marker.align);
        let radius_scale = self.config.radius_scale();
        let mut clusters: Vec<Cluster> = Vec::with_capacity(rows.len());
        let mut fresh = 0;

        for row in rows {
            if self.config.is_reserved(&row.group) {
                continue;
            }
            let key = ClusterKey::new(row.measure.clone(), row.group.clone());
            if let Some(existing) = clusters.iter_mut().find(|c| c.key == key) {
                warn!("Duplicate group '{}' for marker; merging values.", key);
                existing.value += row.value;
                existing.radius = cluster_radius(existing.value, radius_scale);
                continue;
            }

            let lines = wordwrap(&row.group, self.config.label_wrap_chars, None, false);
            let (width, height) = self.text.measure(&lines);
            let radius = cluster_radius(row.value, radius_scale);

            let (position, velocity, offset) = match previous.iter().find(|c| c.key == key) {
                Some(prev) => (prev.position, prev.velocity, prev.label_offset()),
                None => {
                    let position = seed + phyllotaxis_offset(fresh);
                    fresh += 1;
                    let offset = Vec2::new(
                        0.0,
                        -radius - 3.0 - self.config.label_line_offset * lines.len() as f32,
                    );
                    (position, Vec2::ZERO, offset)
                }
            };
            let label_pos = position + offset;

            clusters.push(Cluster {
                comparison: row.comparison.clone(),
                value: row.value,
                units: 0,
                radius,
                position,
                velocity,
                label_lines: lines,
                label: LabelBox::new(label_pos.x, label_pos.y, width, height),
                anchor: Anchor::new(position.x, position.y, radius + self.config.anchor_margin),
                color: colors.row_color(row),
                key,
            });
        }

        let values: Vec<f64> = clusters.iter().map(|c| c.value).collect();
        for (cluster, units) in clusters.iter_mut().zip(apportion(&values)) {
            cluster.units = units;
        }

        debug!(
            "Resolved {} clusters for '{}'/'{}' ({} new).",
            clusters.len(),
            marker.measure,
            marker.comparison,
            fresh
        );
        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Align, Row};
    use crate::label::CharWidthMeasure;

    fn catalog() -> DataCatalog {
        DataCatalog::new(vec![
            Row::new("m", "c", "A", 40.0),
            Row::new("m", "c", "B", 60.0),
            Row::new("m", "c2", "B", 60.0),
            Row::new("m", "c2", "C", 30.0),
            Row::new("m", "c2", "Not stated", 10.0),
            Row::new("m", "bad", "A", 70.0),
        ])
    }

    fn resolve(config: &EngineConfig, marker: &Marker, previous: &[Cluster]) -> Result<Vec<Cluster>> {
        resolve_in(&catalog(), config, marker, previous)
    }

    fn resolve_in(
        catalog: &DataCatalog,
        config: &EngineConfig,
        marker: &Marker,
        previous: &[Cluster],
    ) -> Result<Vec<Cluster>> {
        let text = CharWidthMeasure::default();
        let mut colors = config.color_scale().unwrap();
        ClusterResolver::new(config, &text).resolve(
            catalog,
            marker,
            previous,
            Canvas::new(400.0, 400.0),
            &mut colors,
        )
    }

    #[test]
    fn resolves_rows_in_order_with_radius_and_lines() {
        let config = EngineConfig::default();
        let clusters = resolve(&config, &Marker::new("m", "c"), &[]).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].group(), "A");
        assert_eq!(clusters[1].group(), "B");
        assert!(clusters[1].radius > clusters[0].radius);
        assert_eq!(clusters[0].label_lines, vec!["A".to_string()]);
        assert_eq!(clusters[0].anchor.r, clusters[0].radius + 20.0);
        assert_ne!(clusters[0].position, clusters[1].position);
    }

    #[test]
    fn new_label_sits_above_the_cluster() {
        let config = EngineConfig::default();
        let clusters = resolve(&config, &Marker::new("m", "c"), &[]).unwrap();
        let c = &clusters[0];
        let offset = c.label_offset();
        assert_eq!(offset.x, 0.0);
        assert!((offset.y - (-c.radius - 3.0 - 15.0)).abs() < 1e-4);
    }

    #[test]
    fn integrity_failure_is_reported() {
        let config = EngineConfig::default();
        let err = resolve(&config, &Marker::new("m", "bad"), &[]).unwrap_err();
        assert!(err.is_data_integrity());
        // Unknown marker sums to zero.
        assert!(resolve(&config, &Marker::new("x", "y"), &[])
            .unwrap_err()
            .is_data_integrity());
    }

    #[test]
    fn non_finite_or_negative_values_are_rejected() {
        let config = EngineConfig::default();
        let marker = Marker::new("m", "c");
        let nan = DataCatalog::new(vec![
            Row::new("m", "c", "A", 40.0),
            Row::new("m", "c", "B", 60.0),
            Row::new("m", "c", "C", f64::NAN),
        ]);
        assert!(resolve_in(&nan, &config, &marker, &[])
            .unwrap_err()
            .is_data_integrity());

        let inf = DataCatalog::new(vec![
            Row::new("m", "c", "A", f64::INFINITY),
            Row::new("m", "c", "B", f64::NEG_INFINITY),
        ]);
        assert!(resolve_in(&inf, &config, &marker, &[])
            .unwrap_err()
            .is_data_integrity());

        // Sums to the total but one share is negative.
        let negative = DataCatalog::new(vec![
            Row::new("m", "c", "A", 150.0),
            Row::new("m", "c", "B", -50.0),
        ]);
        assert!(resolve_in(&negative, &config, &marker, &[])
            .unwrap_err()
            .is_data_integrity());

        // Reserved rows are validated too.
        let reserved = DataCatalog::new(vec![
            Row::new("m", "c", "A", 110.0),
            Row::new("m", "c", "Not stated", -10.0),
        ]);
        let config = config.with_reserved_group("Not stated");
        assert!(resolve_in(&reserved, &config, &marker, &[])
            .unwrap_err()
            .is_data_integrity());
    }

    #[test]
    fn fractional_shares_are_apportioned_to_the_total() {
        let config = EngineConfig::default();
        let marker = Marker::new("m", "c");
        let catalog = DataCatalog::new(vec![
            Row::new("m", "c", "A", 33.5),
            Row::new("m", "c", "B", 66.5),
        ]);
        let clusters = resolve_in(&catalog, &config, &marker, &[]).unwrap();
        let units: Vec<_> = clusters.iter().map(Cluster::dot_count).collect();
        assert_eq!(units, vec![34, 66]);

        let integral = resolve(&config, &marker, &[]).unwrap();
        let units: Vec<_> = integral.iter().map(Cluster::dot_count).collect();
        assert_eq!(units, vec![40, 60]);
    }

    #[test]
    fn reserved_groups_count_but_are_not_drawn() {
        let config = EngineConfig::default().with_reserved_group("Not stated");
        let clusters = resolve(&config, &Marker::new("m", "c2"), &[]).unwrap();
        let groups: Vec<_> = clusters.iter().map(Cluster::group).collect();
        assert_eq!(groups, vec!["B", "C"]);

        // Without the reservation the same rows still sum to 100 and all are drawn.
        let all = resolve(&EngineConfig::default(), &Marker::new("m", "c2"), &[]).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn resolving_twice_is_idempotent() {
        let config = EngineConfig::default();
        let marker = Marker::new("m", "c");
        let first = resolve(&config, &marker, &[]).unwrap();
        let second = resolve(&config, &marker, &first).unwrap();
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.position, b.position);
            assert_eq!(a.radius, b.radius);
            assert_eq!(a.value, b.value);
            assert!(a.label.position().distance(b.label.position()) < 1e-4);
        }
    }

    #[test]
    fn surviving_clusters_keep_position_and_label_offset() {
        let config = EngineConfig::default();
        let mut first = resolve(&config, &Marker::new("m", "c"), &[]).unwrap();
        first[1].position = Vec2::new(300.0, 250.0);
        first[1].label.set_position(Vec2::new(320.0, 180.0));

        let next = resolve(&config, &Marker::new("m", "c2"), &first).unwrap();
        let b = next.iter().find(|c| c.group() == "B").unwrap();
        assert_eq!(b.position, Vec2::new(300.0, 250.0));
        assert_eq!(b.label.position(), Vec2::new(320.0, 180.0));
        assert_eq!(b.comparison, "c2");
    }

    #[test]
    fn new_clusters_seed_around_the_aligned_gravity_center() {
        let config = EngineConfig::default();
        let clusters =
            resolve(&config, &Marker::new("m", "c").with_align(Align::Left), &[]).unwrap();
        let expected = Canvas::new(400.0, 400.0).gravity_center(Align::Left);
        for c in &clusters {
            assert!(c.position.distance(expected) < 20.0);
        }
    }
}
