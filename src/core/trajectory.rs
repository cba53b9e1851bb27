// core/trajectory.rs

// Splits the flat stream of recorded samples into trajectories. The recorder
// writes one all-zero sample after every run, and those sentinels are the only
// boundary information in the stream.

// Dependencies
use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{NavGraphError, Result};

/// A recorded 3D position
pub type Sample = Vector3<f32>;

/// Floats per sample record
pub const SAMPLE_FLOATS: usize = 3;

/// Bytes per little-endian sample record
pub const SAMPLE_BYTES: usize = SAMPLE_FLOATS * std::mem::size_of::<f32>();

/// Returns true for the reserved all-zero boundary marker
pub fn is_sentinel(sample: &Sample) -> bool {
    *sample == Sample::zeros()
}

/// Groups a flat float array into samples
pub fn samples_from_flat(values: &[f32]) -> Result<Vec<Sample>> {
    if values.len() % SAMPLE_FLOATS != 0 {
        return Err(NavGraphError::MalformedInput(format!(
            "{} floats is not a whole number of {}-float samples",
            values.len(),
            SAMPLE_FLOATS
        )));
    }

    Ok(values
        .chunks_exact(SAMPLE_FLOATS)
        .map(|c| Sample::new(c[0], c[1], c[2]))
        .collect())
}

/// Decodes little-endian `f32` triples
pub fn samples_from_le_bytes(bytes: &[u8]) -> Result<Vec<Sample>> {
    if bytes.len() % SAMPLE_BYTES != 0 {
        return Err(NavGraphError::MalformedInput(format!(
            "{} bytes is not a whole number of {}-byte samples",
            bytes.len(),
            SAMPLE_BYTES
        )));
    }

    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    samples_from_flat(&values)
}

/// Upstream supplier of the sentinel-delimited sample stream
#[cfg_attr(test, mockall::automock)]
pub trait SampleSource {
    /// Produces every recorded sample in order, sentinels included
    fn samples(&self) -> Result<Vec<Sample>>;
}

impl SampleSource for Vec<Sample> {
    fn samples(&self) -> Result<Vec<Sample>> {
        Ok(self.clone())
    }
}

impl SampleSource for [f32] {
    fn samples(&self) -> Result<Vec<Sample>> {
        samples_from_flat(self)
    }
}

/// A file of densely packed little-endian `f32` triples
#[derive(Debug, Clone)]
pub struct RawSampleFile {
    path: PathBuf,
}

impl RawSampleFile {
    /// Points at a raw sample file; nothing is read until `samples` is called
    pub fn new(path: impl AsRef<Path>) -> Self {
        RawSampleFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the sample file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for RawSampleFile {
    fn samples(&self) -> Result<Vec<Sample>> {
        let bytes = std::fs::read(&self.path).map_err(|source| NavGraphError::Read {
            path: self.path.clone(),
            source,
        })?;
        debug!("Read {} bytes of samples from {}", bytes.len(), self.path.display());
        samples_from_le_bytes(&bytes)
    }
}

/// One recorded run: an ordered sequence of samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    points: Vec<Sample>,
}

impl Trajectory {
    /// Wraps an ordered list of samples
    pub fn new(points: Vec<Sample>) -> Self {
        Trajectory { points }
    }

    /// Samples in recording order
    pub fn points(&self) -> &[Sample] {
        &self.points
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the trajectory holds no samples
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First sample, if any
    pub fn first(&self) -> Option<&Sample> {
        self.points.first()
    }

    /// Last sample, if any
    pub fn last(&self) -> Option<&Sample> {
        self.points.last()
    }

    /// Releases the underlying samples
    pub fn into_points(self) -> Vec<Sample> {
        self.points
    }
}

impl FromIterator<Sample> for Trajectory {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Trajectory::new(iter.into_iter().collect())
    }
}

/// Loader settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Emit a final run that has no terminating sentinel instead of dropping it
    pub keep_unterminated_tail: bool,
}

/// Splits sample streams into trajectories
pub struct TrajectoryLoader {
    config: LoaderConfig,
}

impl TrajectoryLoader {
    /// Create a loader with the given settings
    pub fn new(config: &LoaderConfig) -> Self {
        TrajectoryLoader { config: *config }
    }

    /// Pulls the stream from `source` and splits it
    pub fn load<S: SampleSource + ?Sized>(&self, source: &S) -> Result<Vec<Trajectory>> {
        let samples = source.samples()?;
        let trajectories = self.split(&samples);
        info!(
            "Loaded {} trajectories from {} samples",
            trajectories.len(),
            samples.len()
        );
        Ok(trajectories)
    }

    /// Splits on sentinels. Sentinels are discarded and empty runs are skipped.
    pub fn split(&self, samples: &[Sample]) -> Vec<Trajectory> {
        let mut trajectories = Vec::new();
        let mut run = Vec::new();

        for (i, sample) in samples.iter().enumerate() {
            if !is_sentinel(sample) {
                run.push(*sample);
            } else if run.is_empty() {
                debug!("Skipping empty run ending at sample {}", i);
            } else {
                trajectories.push(Trajectory::new(std::mem::take(&mut run)));
            }
        }

        if !run.is_empty() {
            if self.config.keep_unterminated_tail {
                debug!("Keeping unterminated run of {} samples", run.len());
                trajectories.push(Trajectory::new(run));
            } else {
                warn!(
                    "Dropping {} trailing samples with no terminating sentinel",
                    run.len()
                );
            }
        }

        trajectories
    }
}
