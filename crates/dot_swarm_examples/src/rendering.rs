//! Minimal rasterizer for [`RenderFrame`]s.
//!
//! Draws dots as filled circles, clusters as outlines, label boxes as
//! rectangles and leader paths as polylines. There is no font rendering, so
//! label text is represented by its box.
use std::path::Path;

use anyhow::Context;
use dot_swarm::color::Rgb;
use dot_swarm::engine::RenderFrame;
use dot_swarm::label::LeaderPath;
use glam::Vec2;
use image::{Rgb as Pixel, RgbImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber honoring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Appearance of the rendered PNG.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Pixels per layout unit.
    pub scale: f32,
    pub dot_color: [u8; 3],
    pub outline_color: [u8; 3],
    pub label_color: [u8; 3],
    pub draw_cluster_outlines: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            dot_color: [245, 245, 245],
            outline_color: [255, 255, 255],
            label_color: [230, 230, 230],
            draw_cluster_outlines: false,
        }
    }
}

impl RenderConfig {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_cluster_outlines(mut self, draw: bool) -> Self {
        self.draw_cluster_outlines = draw;
        self
    }
}

/// Rasterizes `frame` and writes it to `path` as PNG.
pub fn render_frame_to_png(
    frame: &RenderFrame,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let img = render_frame(frame, config);
    img.save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        "Wrote {} ({} dots, {} clusters).",
        path.display(),
        frame.dots.len(),
        frame.clusters.len()
    );
    Ok(())
}

/// Rasterizes `frame` into an image.
pub fn render_frame(frame: &RenderFrame, config: &RenderConfig) -> RgbImage {
    let s = config.scale;
    let w = (frame.width * s).round().max(1.0) as u32;
    let h = (frame.height * s).round().max(1.0) as u32;
    let mut img = RgbImage::from_pixel(w, h, Pixel(frame.background.0));

    for cluster in &frame.clusters {
        let center = Vec2::new(cluster.position.x, cluster.position.y) * s;
        if config.draw_cluster_outlines {
            stroke_circle(&mut img, center, cluster.radius * s, config.outline_color);
        }
        stroke_leader(&mut img, &cluster.leader, s, config.outline_color);
        let rect = cluster.label.rect();
        stroke_rect(&mut img, rect.min * s, rect.max * s, config.label_color);
    }

    for dot in &frame.dots {
        let center = Vec2::new(dot.position.x, dot.position.y) * s;
        fill_circle(&mut img, center, dot.radius * s, blend(dot.color, config.dot_color));
    }

    img
}

/// Dots are drawn in a light tint of their cluster color.
fn blend(color: Rgb, tint: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = color.0;
    let mix = |a: u8, t: u8| ((a as u16 + 3 * t as u16) / 4) as u8;
    [mix(r, tint[0]), mix(g, tint[1]), mix(b, tint[2])]
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: [u8; 3]) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, Pixel(color));
    }
}

fn fill_circle(img: &mut RgbImage, center: Vec2, radius: f32, color: [u8; 3]) {
    let r = radius.max(0.5);
    let r2 = r * r;
    let (x0, x1) = ((center.x - r).floor() as i64, (center.x + r).ceil() as i64);
    let (y0, y1) = ((center.y - r).floor() as i64, (center.y + r).ceil() as i64);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
            if d.length_squared() <= r2 {
                put(img, x, y, color);
            }
        }
    }
}

fn stroke_line(img: &mut RgbImage, from: Vec2, to: Vec2, color: [u8; 3]) {
    let steps = from.distance(to).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let p = from.lerp(to, i as f32 / steps as f32);
        put(img, p.x.round() as i64, p.y.round() as i64, color);
    }
}

fn stroke_circle(img: &mut RgbImage, center: Vec2, radius: f32, color: [u8; 3]) {
    stroke_arc(img, center, radius, 0.0, std::f32::consts::TAU, color);
}

fn stroke_arc(img: &mut RgbImage, center: Vec2, radius: f32, start: f32, end: f32, color: [u8; 3]) {
    let steps = ((end - start).abs() * radius).ceil().max(8.0) as usize;
    let mut prev = center + Vec2::from_angle(start) * radius;
    for i in 1..=steps {
        let a = start + (end - start) * i as f32 / steps as f32;
        let next = center + Vec2::from_angle(a) * radius;
        stroke_line(img, prev, next, color);
        prev = next;
    }
}

fn stroke_rect(img: &mut RgbImage, min: Vec2, max: Vec2, color: [u8; 3]) {
    let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
    for i in 0..4 {
        stroke_line(img, corners[i], corners[(i + 1) % 4], color);
    }
}

fn stroke_leader(img: &mut RgbImage, leader: &LeaderPath, scale: f32, color: [u8; 3]) {
    let arc = &leader.arc;
    stroke_arc(
        img,
        arc.center * scale,
        arc.radius * scale,
        arc.start_angle,
        arc.end_angle,
        color,
    );
    stroke_line(img, leader.tick.from * scale, leader.tick.to * scale, color);
    stroke_line(img, leader.leader.from * scale, leader.leader.to * scale, color);
}

#[cfg(test)]
mod tests {
    use dot_swarm::prelude::*;

    use super::*;

    #[test]
    fn renders_background_and_dots() {
        let catalog = DataCatalog::new(vec![
            Row::new("m", "c", "A", 40.0),
            Row::new("m", "c", "B", 60.0),
        ]);
        let mut engine = LayoutEngine::new(catalog, EngineConfig::default()).unwrap();
        engine
            .update(&Marker::new("m", "c"), Canvas::new(200.0, 150.0))
            .unwrap();
        let frame = engine.frame();
        let img = render_frame(&frame, &RenderConfig::default().with_scale(2.0));
        assert_eq!(img.dimensions(), (400, 300));
        assert_eq!(img.get_pixel(0, 0).0, frame.background.0);

        let dot = &frame.dots[0];
        let px = (dot.position.x * 2.0) as u32;
        let py = (dot.position.y * 2.0) as u32;
        assert_ne!(img.get_pixel(px, py).0, frame.background.0);
    }
}
