//! Randomized scheduler: drains bucketed pools into time-placed,
//! panned segments.
//!
//! Every random decision flows through an injected [`StdRng`], so a
//! seeded run reproduces its exact offsets and pans while an
//! entropy-seeded run keeps the generative variability.

use rand::rngs::StdRng;
use rand::Rng;

use crate::collect::SegmentPools;
use crate::types::ScheduledSegment;

/// Scheduling parameters derived from a bucket's rank among all
/// configured buckets. Shorter buckets pan wider, jitter more, and are
/// more likely to get silence inserted; the longest bucket sits near
/// center with tight forward-biased steps.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketParams {
    pub pan_min: f64,
    pub pan_max: f64,
    pub offset_min_ms: f64,
    pub offset_max_ms: f64,
    pub silence_probability: f64,
}

impl BucketParams {
    pub fn derive(threshold_ms: u32, bucket_index: usize, num_buckets: usize) -> Self {
        let i = bucket_index as f64;
        let n = num_buckets as f64;
        Self {
            pan_min: 1.0 - (i + 1.0) / n,
            pan_max: 1.0 - i / n,
            // threshold_ms / 2 is integer division: floor by construction.
            offset_min_ms: -((threshold_ms / 2) as f64 * (1.0 - i / n)).floor(),
            offset_max_ms: ((1.0 + n * (1.0 - i / n)) * threshold_ms as f64).floor(),
            silence_probability: 0.55 - 0.5 * (i + 1.0) / n,
        }
    }
}

/// A complete scheduling plan: per-bucket ordered segments plus the
/// composition length they imply.
#[derive(Debug)]
pub struct Schedule {
    /// Segments per bucket, in placement order, aligned with the
    /// configured thresholds. Empty buckets contribute empty lists.
    pub buckets: Vec<Vec<ScheduledSegment>>,
    /// Max over all segments of offset + clip duration (ms).
    pub length_ms: f64,
}

impl Schedule {
    pub fn num_segments(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }

    /// Flatten into a single segment list for rendering. Cross-bucket
    /// order is irrelevant: overlay summation is commutative.
    pub fn into_segments(self) -> Vec<ScheduledSegment> {
        self.buckets.into_iter().flatten().collect()
    }
}

/// Schedule every pooled clip, draining the pools.
///
/// Buckets are visited in ascending threshold order. Per placement:
/// advance the running offset by a step drawn from the bucket's range,
/// draw a pan, pop the oldest clip of a uniformly random source queue,
/// and record the segment at the clamped-non-negative offset. With the
/// bucket's silence probability, `(1 - density) * 1000` ms of extra
/// gap follows; density 1.0 therefore never widens the piece.
pub fn schedule(mut pools: SegmentPools, density: f64, rng: &mut StdRng) -> Schedule {
    let num_buckets = pools.num_buckets();
    let gap_ms = (1.0 - density) * 1000.0;

    let mut buckets = Vec::with_capacity(num_buckets);
    let mut length_ms = 0.0f64;

    for bucket in 0..num_buckets {
        let params = BucketParams::derive(pools.threshold(bucket), bucket, num_buckets);
        log::debug!(
            "Scheduling bucket {}ms: pan [{:.2}, {:.2}), step [{:.0}, {:.0})ms, p(silence) {:.2}",
            pools.threshold(bucket),
            params.pan_min,
            params.pan_max,
            params.offset_min_ms,
            params.offset_max_ms,
            params.silence_probability
        );

        let offset_span = params.offset_max_ms - params.offset_min_ms;
        let pan_span = params.pan_max - params.pan_min;

        let mut segments = Vec::new();
        let mut offset = (params.offset_min_ms + rng.gen::<f64>() * offset_span).max(0.0);

        while pools.num_sources(bucket) > 0 {
            offset += params.offset_min_ms + rng.gen::<f64>() * offset_span;
            let pan = params.pan_min + rng.gen::<f64>() * pan_span;
            let slot = rng.gen_range(0..pools.num_sources(bucket));
            let Some(clip) = pools.pop_from_source(bucket, slot) else {
                break;
            };

            let offset_ms = offset.max(0.0);
            length_ms = length_ms.max(offset_ms + clip.duration_ms());
            segments.push(ScheduledSegment { clip, offset_ms, pan });

            if rng.gen::<f64>() < params.silence_probability {
                offset += gap_ms;
            }
        }

        log::debug!(
            "Bucket {}ms: {} segments scheduled",
            pools.threshold(bucket),
            segments.len()
        );
        buckets.push(segments);
    }

    Schedule { buckets, length_ms }
}
