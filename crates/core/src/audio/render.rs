//! Overlay mixer: renders scheduled segments into a stereo master.

use crate::audio::effects::{apply_edge_fades, normalize_peak, pan_gains};
use crate::types::{ScheduledSegment, StereoBuffer};

/// Render scheduled segments into a silent stereo master of
/// `length_ms` at `sample_rate`.
///
/// Per segment, in order: peak normalization, `fade_ms` linear edge
/// fades, constant-power pan, then additive overlay at the scheduled
/// offset. Overlapping segments sum sample-wise and no limiting is
/// applied after summation, so dense overlaps may clip downstream —
/// an accepted trait of the collage aesthetic.
///
/// Summation is commutative, so segment order never changes the mix.
/// Clips are expected at the master sample rate; the decode boundary
/// resamples.
pub fn render(
    length_ms: f64,
    segments: Vec<ScheduledSegment>,
    sample_rate: u32,
    fade_ms: f64,
) -> StereoBuffer {
    let mut master = StereoBuffer::silent(length_ms, sample_rate);
    for segment in segments {
        overlay(&mut master, segment, fade_ms);
    }
    master
}

/// Process one segment's clip and sum it into the master.
fn overlay(master: &mut StereoBuffer, segment: ScheduledSegment, fade_ms: f64) {
    let ScheduledSegment { clip, offset_ms, pan } = segment;
    let sample_rate = master.sample_rate;

    let mut samples = clip.into_samples();
    normalize_peak(&mut samples);
    apply_edge_fades(&mut samples, sample_rate, fade_ms);
    let (left_gain, right_gain) = pan_gains(pan);

    let start = (offset_ms / 1000.0 * sample_rate as f64).round() as usize;
    let frames = master.len();
    for (i, &sample) in samples.iter().enumerate() {
        let frame = start + i;
        if frame >= frames {
            break;
        }
        master.left[frame] += sample * left_gain;
        master.right[frame] += sample * right_gain;
    }
}
