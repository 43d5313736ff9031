//! RON-described stories: a canvas, a dataset and a sequence of markers.
use std::path::{Path, PathBuf};

use anyhow::Context;
use dot_swarm::prelude::*;
use serde::Deserialize;
use tracing::info;

use crate::rendering::{render_frame_to_png, RenderConfig};

/// One story to play back.
///
/// ```ron
/// (
///     width: 900.0,
///     height: 600.0,
///     dataset: "housing.csv",
///     markers: [(measure: "tenure", comparison: "2001")],
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Story {
    pub width: f32,
    pub height: f32,
    /// CSV path, relative to the story file.
    pub dataset: PathBuf,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub reserved_groups: Vec<String>,
    /// Dot simulation ticks to run after each marker before rendering.
    #[serde(default = "default_ticks")]
    pub ticks_per_marker: usize,
    #[serde(default = "default_scale")]
    pub scale: f32,
    pub markers: Vec<Marker>,
}

fn default_ticks() -> usize {
    400
}

fn default_scale() -> f32 {
    1.0
}

impl Story {
    pub fn from_ron_str(input: &str) -> anyhow::Result<Self> {
        ron::de::from_str(input).map_err(|e| anyhow::anyhow!(e))
    }

    /// Loads a story and resolves its dataset path against the story's directory.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut story = Self::from_ron_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if let Some(dir) = path.parent() {
            story.dataset = dir.join(&story.dataset);
        }
        Ok(story)
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Builds the engine configuration for this story.
    pub fn engine_config(&self) -> EngineConfig {
        self.reserved_groups
            .iter()
            .fold(EngineConfig::new().with_seed(self.seed), |config, group| {
                config.with_reserved_group(group.clone())
            })
    }

    /// Builds an engine over the story's dataset.
    pub fn engine(&self) -> anyhow::Result<LayoutEngine> {
        let catalog = DataCatalog::from_path(&self.dataset)
            .with_context(|| format!("failed to load {}", self.dataset.display()))?;
        Ok(LayoutEngine::new(catalog, self.engine_config())?)
    }

    /// Applies every marker in order, settles the dots and hands the frame to `on_frame`.
    ///
    /// Markers the engine rejects are logged and skipped.
    pub fn play<F>(&self, engine: &mut LayoutEngine, mut on_frame: F) -> anyhow::Result<usize>
    where
        F: FnMut(usize, &Marker, &RenderFrame) -> anyhow::Result<()>,
    {
        let canvas = self.canvas();
        let mut rendered = 0;
        for (index, marker) in self.markers.iter().enumerate() {
            match engine.update(marker, canvas) {
                Ok(outcome) => {
                    if let Some(report) = outcome.report() {
                        info!(
                            "Marker {index} ({}/{}): {} clusters, {} dots.",
                            marker.measure, marker.comparison, report.clusters, report.dots
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!("Marker {index} rejected: {err}");
                    continue;
                }
            }
            engine.settle(self.ticks_per_marker);
            on_frame(index, marker, &engine.frame())?;
            rendered += 1;
        }
        Ok(rendered)
    }

    /// Plays the story and writes one PNG per marker into `out_dir`.
    pub fn render_to_dir(&self, out_dir: impl AsRef<Path>, prefix: &str) -> anyhow::Result<usize> {
        let out_dir = out_dir.as_ref();
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        let mut engine = self.engine()?;
        let config = RenderConfig::default().with_scale(self.scale);
        self.play(&mut engine, |index, _, frame| {
            render_frame_to_png(frame, &config, out_dir.join(format!("{prefix}-{index:02}.png")))
        })
    }
}
