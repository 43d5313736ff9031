use dot_swarm_examples::{init_tracing, Story};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        format!(
            "{}/assets/housing.story.ron",
            env!("CARGO_MANIFEST_DIR")
        )
    });
    let story = Story::from_path(&path)?;
    let rendered = story.render_to_dir("story-from-files", "marker")?;
    tracing::info!("Rendered {rendered} of {} markers.", story.markers.len());
    Ok(())
}
