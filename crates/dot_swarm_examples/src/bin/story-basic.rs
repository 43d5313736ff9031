use dot_swarm::prelude::*;
use dot_swarm_examples::{init_tracing, render_frame_to_png, RenderConfig};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let catalog = DataCatalog::new(vec![
        Row::new("commute", "2011", "Car", 40.0),
        Row::new("commute", "2011", "Bus", 60.0),
        Row::new("commute", "2021", "Bus", 60.0),
        Row::new("commute", "2021", "Bicycle", 40.0),
    ]);
    let mut engine = LayoutEngine::new(catalog, EngineConfig::new().with_seed(42))?;
    let canvas = Canvas::new(800.0, 500.0);
    let config = RenderConfig::default().with_cluster_outlines(true);

    for (index, comparison) in ["2011", "2021"].into_iter().enumerate() {
        let marker = Marker::new("commute", comparison);
        engine.update(&marker, canvas)?;
        let ticks = engine.settle(500);
        tracing::info!("{comparison}: settled after {ticks} ticks");
        render_frame_to_png(&engine.frame(), &config, format!("story-basic-{index}.png"))?;
    }
    Ok(())
}
