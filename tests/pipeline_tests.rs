// tests/pipeline_tests.rs
// End-to-end runs of the build pipeline through the public API.

use navgraph::{
    GraphReader, GraphSerializer, NavGraphConfig, NavGraphError, NavGraphPipeline, Sample,
};

// Two parallel recordings 2 units apart, each closed by a zero sample.
fn flat_recording() -> Vec<f32> {
    let mut flat = Vec::new();
    for y in [1.0f32, 3.0] {
        for i in 0..8 {
            let x = i as f32 * 3.0 + 1.0;
            // small zig-zag in height so not every sample is collinear
            let z = if i % 2 == 0 { 0.5 } else { 1.5 };
            flat.extend_from_slice(&[x, y, z]);
        }
        flat.extend_from_slice(&[0.0, 0.0, 0.0]);
    }
    flat
}

#[test]
fn pipeline_builds_connected_symmetric_graph() {
    let flat = flat_recording();
    let mut pipeline = NavGraphPipeline::new(NavGraphConfig::default()).unwrap();
    let graph = pipeline.run(&flat[..]).unwrap();
    let report = *pipeline.report();

    assert_eq!(report.trajectories, 2);
    assert_eq!(report.samples_before, 16);
    assert!(report.samples_after <= report.samples_before);
    assert!(report.samples_after >= 4);
    assert!(graph.is_symmetric());
    assert!(report.merge_edges > 0);
    assert!(graph.vertices().iter().all(|v| !v.neighbors.is_empty()));

    // merging joins the two recordings
    let last = graph.vertex_count() - 1;
    let path = pipeline.query(&graph, 0, last).unwrap();
    assert!(path.is_some());
}

#[test]
fn exported_graph_reads_back_identically() {
    let flat = flat_recording();
    let mut pipeline = NavGraphPipeline::new(NavGraphConfig::default()).unwrap();
    let graph = pipeline.run(&flat[..]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("navigation_graph.bytes");
    pipeline.serialize(&graph, &out).unwrap();

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(bytes.len(), GraphSerializer::new(&graph).encoded_len());
    assert_eq!(
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
        graph.vertex_count()
    );

    // first vertex is stored as x, z, y
    let first = graph.vertices()[0].position;
    let word = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    assert_eq!(word(4), first.x);
    assert_eq!(word(8), first.z);
    assert_eq!(word(12), first.y);

    let decoded = GraphReader::load(&out).unwrap();
    assert_eq!(decoded.vertex_count(), graph.vertex_count());
    for (a, b) in graph.vertices().iter().zip(decoded.vertices()) {
        assert_eq!(a.position, b.position);
        assert_eq!(a.neighbors, b.neighbors);
    }
}

#[test]
fn flat_input_of_wrong_length_is_rejected() {
    let flat = vec![1.0f32, 2.0, 3.0, 4.0];
    let mut pipeline = NavGraphPipeline::new(NavGraphConfig::default()).unwrap();
    assert!(matches!(
        pipeline.run(&flat[..]),
        Err(NavGraphError::MalformedInput(_))
    ));
}

#[test]
fn single_sample_recording_is_rejected() {
    let samples = vec![Sample::new(4.0, 4.0, 4.0), Sample::zeros()];
    let mut pipeline = NavGraphPipeline::new(NavGraphConfig::default()).unwrap();
    assert!(matches!(
        pipeline.run(&samples),
        Err(NavGraphError::MalformedInput(_))
    ));
}

#[test]
fn missing_sample_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = navgraph::RawSampleFile::new(dir.path().join("absent.bin"));
    let mut pipeline = NavGraphPipeline::new(NavGraphConfig::default()).unwrap();
    assert!(matches!(
        pipeline.run(&source),
        Err(NavGraphError::Read { .. })
    ));
}

#[test]
fn empty_recording_gives_empty_graph() {
    let samples: Vec<Sample> = Vec::new();
    let mut pipeline = NavGraphPipeline::new(NavGraphConfig::default()).unwrap();
    let graph = pipeline.run(&samples).unwrap();
    assert!(graph.is_empty());
    assert_eq!(GraphSerializer::new(&graph).to_bytes().unwrap(), vec![0, 0, 0, 0]);
}
