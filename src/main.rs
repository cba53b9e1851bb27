// src/main.rs
// Entry point for navgraph: builds the navigation graph from recorded samples and exports it.

// Imports dependencies and navgraph modules.
// - env_logger: Logging, filtered through RUST_LOG.
// - navgraph: Pipeline, configuration and path queries.
use log::{info, warn};
use navgraph::{NavGraphConfig, NavGraphPipeline, RawSampleFile};
use std::error::Error;
use std::path::Path;

const CONFIG_FILE: &str = "navgraph.yaml";

/// Loads the configuration, runs the pipeline, writes the graph and runs a
/// sample query across it.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    info!("Starting navgraph...");

    let config = if Path::new(CONFIG_FILE).exists() {
        NavGraphConfig::load(CONFIG_FILE)?
    } else {
        warn!("{} not found, using default settings", CONFIG_FILE);
        NavGraphConfig::default()
    };

    let samples = RawSampleFile::new(&config.io.samples);
    let output = config.io.output.clone();
    let mut pipeline = NavGraphPipeline::new(config)?;

    let graph = pipeline.run(&samples)?;
    pipeline.serialize(&graph, &output)?;

    let report = pipeline.report();
    info!(
        "{} trajectories, {} -> {} samples, {} trajectory edges, {} merge edges",
        report.trajectories,
        report.samples_before,
        report.samples_after,
        report.trajectory_edges,
        report.merge_edges
    );

    // Demo query between the first and the last vertex
    if graph.vertex_count() > 1 {
        let target = graph.vertex_count() - 1;
        match pipeline.query(&graph, 0, target)? {
            Some(path) => info!(
                "Path 0 -> {}: {} vertices, length {:.2}",
                target,
                path.len(),
                path.length()
            ),
            None => warn!("Vertex {} is not reachable from vertex 0", target),
        }
    }

    info!("navgraph completed");
    Ok(())
}
