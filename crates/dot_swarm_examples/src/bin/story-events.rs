use dot_swarm::prelude::*;
use dot_swarm_examples::init_tracing;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let catalog = DataCatalog::new(vec![
        Row::new("diet", "adults", "Meat", 70.0),
        Row::new("diet", "adults", "Vegetarian", 22.0),
        Row::new("diet", "adults", "Vegan", 8.0),
        Row::new("diet", "teens", "Meat", 58.0),
        Row::new("diet", "teens", "Vegetarian", 27.0),
        Row::new("diet", "teens", "Vegan", 15.0),
        // Does not sum to the total; the engine rejects this marker.
        Row::new("diet", "broken", "Meat", 50.0),
    ]);
    let mut engine = LayoutEngine::new(catalog, EngineConfig::new().with_seed(7))?;
    let canvas = Canvas::new(640.0, 480.0);

    let mut sink = FnSink::new(|event: EngineEvent| match event {
        EngineEvent::DotsTicked { .. } => {}
        other => println!("{other:?}"),
    });

    for comparison in ["adults", "teens", "teens", "broken"] {
        let marker = Marker::new("diet", comparison);
        match engine.update_with_events(&marker, canvas, &mut sink) {
            Ok(outcome) => println!("-> {comparison}: applied = {}", outcome.is_applied()),
            Err(err) => println!("-> {comparison}: {err}"),
        }
        for _ in 0..200 {
            if !engine.tick_with_events(&mut sink) {
                break;
            }
        }
    }
    Ok(())
}
