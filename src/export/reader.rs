// src/export/reader.rs
// Parses the binary navigation graph back into a `Graph`.

// The format has no index table, so reading is a single forward scan. Decoded
// vertices carry no trajectory, which the format does not store.

use log::debug;
use std::io::Read;
use std::path::Path;

use crate::core::{Graph, Sample};
use crate::{NavGraphError, Result};

struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        ByteCursor { bytes, offset: 0 }
    }

    fn take4(&mut self, what: &str) -> Result<[u8; 4]> {
        let end = self.offset + 4;
        let Some(b) = self.bytes.get(self.offset..end) else {
            return Err(NavGraphError::MalformedGraph(format!(
                "stream ends at byte {} while reading {}",
                self.bytes.len(),
                what
            )));
        };
        self.offset = end;
        Ok([b[0], b[1], b[2], b[3]])
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        self.take4(what).map(u32::from_le_bytes)
    }

    fn f32(&mut self, what: &str) -> Result<f32> {
        self.take4(what).map(f32::from_le_bytes)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

/// Decoder for exported navigation graphs
pub struct GraphReader;

impl GraphReader {
    /// Decodes a complete export
    pub fn from_bytes(bytes: &[u8]) -> Result<Graph> {
        let mut cursor = ByteCursor::new(bytes);
        let count = cursor.u32("vertex count")? as usize;

        let mut graph = Graph::new();
        let mut edges = Vec::new();
        for i in 0..count {
            let x = cursor.f32("vertex position")?;
            let z = cursor.f32("vertex position")?;
            let y = cursor.f32("vertex position")?;
            let vertex = graph.add_vertex(Sample::new(x, y, z), None);

            let edge_count = cursor.u32("edge count")? as usize;
            for _ in 0..edge_count {
                let n = cursor.u32("neighbor index")? as usize;
                if n >= count {
                    return Err(NavGraphError::MalformedGraph(format!(
                        "vertex {} lists neighbor {} but the graph has {} vertices",
                        i, n, count
                    )));
                }
                edges.push((vertex, n));
            }
        }

        if cursor.remaining() != 0 {
            return Err(NavGraphError::MalformedGraph(format!(
                "{} trailing bytes after the last vertex",
                cursor.remaining()
            )));
        }

        // Each stored entry is one side of an edge; keep the lists as written.
        for (a, b) in edges {
            graph.push_neighbor(a, b);
        }
        if !graph.is_symmetric() {
            return Err(NavGraphError::MalformedGraph(
                "neighbor lists do not describe undirected edges".to_string(),
            ));
        }

        debug!("Decoded {} vertices, {} edges", graph.vertex_count(), graph.edge_count());
        Ok(graph)
    }

    /// Reads everything from `input` and decodes it
    pub fn read_from<R: Read>(input: &mut R) -> Result<Graph> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Loads an export file
    pub fn load(path: impl AsRef<Path>) -> Result<Graph> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| NavGraphError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::GraphSerializer;

    fn sample_graph() -> Graph {
        let mut g = Graph::new();
        g.add_vertex(Sample::new(1.0, 2.0, 3.0), Some(0));
        g.add_vertex(Sample::new(-4.0, 5.5, 6.0), Some(0));
        g.add_vertex(Sample::new(7.0, 8.0, -9.0), Some(1));
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 0).unwrap();
        g.add_edge(2, 0).unwrap();
        g
    }

    #[test]
    fn decodes_what_the_serializer_wrote() {
        let g = sample_graph();
        let bytes = GraphSerializer::new(&g).to_bytes().unwrap();
        let decoded = GraphReader::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.vertex_count(), 3);
        for (a, b) in g.vertices().iter().zip(decoded.vertices()) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.neighbors, b.neighbors);
            assert_eq!(b.trajectory, None);
        }
        assert!(decoded.is_symmetric());
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let bytes = GraphSerializer::new(&sample_graph()).to_bytes().unwrap();
        for cut in [0, 3, 4, 10, bytes.len() - 1] {
            let err = GraphReader::from_bytes(&bytes[..cut]).unwrap_err();
            assert!(matches!(err, NavGraphError::MalformedGraph(_)), "cut at {}", cut);
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = GraphSerializer::new(&sample_graph()).to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            GraphReader::from_bytes(&bytes),
            Err(NavGraphError::MalformedGraph(_))
        ));
    }

    #[test]
    fn neighbor_outside_graph_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        for c in [0.0f32, 0.0, 0.0] {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&5u32.to_le_bytes());

        assert!(matches!(
            GraphReader::from_bytes(&bytes),
            Err(NavGraphError::MalformedGraph(_))
        ));
    }

    fn encode(vertices: &[&[u32]]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(vertices.len() as u32).to_le_bytes());
        for (i, neighbors) in vertices.iter().enumerate() {
            for c in [i as f32, 0.0, 0.0] {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
            bytes.extend_from_slice(&(neighbors.len() as u32).to_le_bytes());
            for n in neighbors.iter() {
                bytes.extend_from_slice(&n.to_le_bytes());
            }
        }
        bytes
    }

    #[test]
    fn one_sided_edge_is_rejected() {
        let bytes = encode(&[&[1], &[]]);
        assert!(matches!(
            GraphReader::from_bytes(&bytes),
            Err(NavGraphError::MalformedGraph(_))
        ));
    }

    #[test]
    fn duplicate_edge_listed_once_on_one_side_is_rejected() {
        let bytes = encode(&[&[1, 1], &[0]]);
        assert!(matches!(
            GraphReader::from_bytes(&bytes),
            Err(NavGraphError::MalformedGraph(_))
        ));

        let decoded = GraphReader::from_bytes(&encode(&[&[1, 1], &[0, 0]])).unwrap();
        assert_eq!(decoded.edge_count(), 2);
    }

    #[test]
    fn reads_from_stream() {
        let bytes = GraphSerializer::new(&sample_graph()).to_bytes().unwrap();
        let mut input = std::io::Cursor::new(bytes);

        let decoded = GraphReader::read_from(&mut input).unwrap();
        assert_eq!(decoded.line_indices(), vec![(0, 1), (0, 2), (0, 2), (1, 2)]);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bytes");
        GraphSerializer::new(&sample_graph()).save(&path).unwrap();

        let decoded = GraphReader::load(&path).unwrap();
        assert_eq!(decoded.vertex_count(), 3);
        assert_eq!(decoded.edge_count(), 4);
    }
}
