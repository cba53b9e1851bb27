// src/export/writer.rs
// Writes a navigation graph in the binary format read by the viewer.

// Layout, little-endian and densely packed:
//   u32 vertex count
//   per vertex: f32 x, f32 z, f32 y, u32 edge count, u32 neighbor index * edge count
// The y/z swap converts the recording frame to the viewer's y-up frame.

use log::info;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::core::Graph;
use crate::{NavGraphError, Result};

/// Serializes a borrowed graph
pub struct GraphSerializer<'g> {
    graph: &'g Graph,
}

impl<'g> GraphSerializer<'g> {
    /// Create a serializer for `graph`
    pub fn new(graph: &'g Graph) -> Self {
        GraphSerializer { graph }
    }

    /// Exact size of the encoding in bytes
    pub fn encoded_len(&self) -> usize {
        4 + self
            .graph
            .vertices()
            .iter()
            .map(|v| 16 + 4 * v.neighbors.len())
            .sum::<usize>()
    }

    /// Streams the encoding into `out`
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        self.check_limits()?;
        self.encode(out)?;
        Ok(())
    }

    /// The encoding as an in-memory buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Writes to a uniquely named temporary file next to `path`, syncs it and
    /// renames it over `path`. On failure the temporary file is removed and
    /// `path` is left as it was.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.check_limits()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Dropping the temporary file on any error path deletes it.
        let result = self
            .write_temp(dir)
            .and_then(|tmp| tmp.persist(path).map(|_| ()).map_err(|e| e.error));
        if let Err(source) = result {
            return Err(NavGraphError::Serialization {
                path: path.to_path_buf(),
                source,
            });
        }

        info!(
            "Saved navigation graph to {} ({} vertices, {} bytes)",
            path.display(),
            self.graph.vertex_count(),
            self.encoded_len()
        );
        Ok(())
    }

    fn write_temp(&self, dir: &Path) -> io::Result<NamedTempFile> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".navgraph-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            self.encode(&mut out)?;
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }

    // Counts must already have passed `check_limits`.
    fn encode<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&(self.graph.vertex_count() as u32).to_le_bytes())?;
        for v in self.graph.vertices() {
            for c in [v.position.x, v.position.z, v.position.y] {
                out.write_all(&c.to_le_bytes())?;
            }
            out.write_all(&(v.neighbors.len() as u32).to_le_bytes())?;
            for &n in &v.neighbors {
                out.write_all(&(n as u32).to_le_bytes())?;
            }
        }
        Ok(())
    }

    fn check_limits(&self) -> Result<()> {
        let count = self.graph.vertex_count();
        if u32::try_from(count).is_err() {
            return Err(NavGraphError::ExportOverflow(format!(
                "{} vertices exceed the u32 vertex count",
                count
            )));
        }
        // with the vertex count in range every valid neighbor index is too
        if let Some((i, v)) = self
            .graph
            .vertices()
            .iter()
            .enumerate()
            .find(|(_, v)| u32::try_from(v.neighbors.len()).is_err())
        {
            return Err(NavGraphError::ExportOverflow(format!(
                "vertex {} has {} edges, more than a u32 edge count holds",
                i,
                v.neighbors.len()
            )));
        }
        Ok(())
    }
}
