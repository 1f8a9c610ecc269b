//! Core data types for the composition pipeline.

/// An immutable mono audio clip.
///
/// Samples are f64 in [-1, 1]. Clips are mono by construction: the
/// decode boundary downmixes before the composer ever sees a buffer.
/// A clip moves (never copies) from its source pool into a scheduled
/// segment, so each clip is placed at most once.
#[derive(Debug, PartialEq)]
pub struct AudioClip {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Consume the clip, yielding its sample buffer.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_ms(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64 * 1000.0
    }
}

/// A clip placed in time by the scheduler, consumed exactly once by
/// the renderer.
#[derive(Debug)]
pub struct ScheduledSegment {
    pub clip: AudioClip,
    /// Start time within the master buffer (ms, >= 0).
    pub offset_ms: f64,
    /// Stereo placement: -1 fully left, +1 fully right, 0 center.
    pub pan: f64,
}

/// Stereo master buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoBuffer {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    pub sample_rate: u32,
}

impl StereoBuffer {
    /// Allocate a silent buffer of the given duration.
    pub fn silent(duration_ms: f64, sample_rate: u32) -> Self {
        let n = (duration_ms / 1000.0 * sample_rate as f64).round() as usize;
        Self {
            left: vec![0.0; n],
            right: vec![0.0; n],
            sample_rate,
        }
    }

    /// Number of frames (samples per channel).
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.left.len() as f64 / self.sample_rate as f64
    }
}

/// The finished composition: rendered master plus total duration.
/// Immutable once rendered.
#[derive(Debug)]
pub struct Composition {
    pub master: StereoBuffer,
    pub duration_seconds: f64,
}
