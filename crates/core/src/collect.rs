//! Collection manager: builds bucketed per-source clip pools from a
//! lazy candidate stream.
//!
//! The stream is assumed expensive (the clips behind it come from an
//! external retrieval/segmentation step), so collection is incremental
//! and stops pulling as soon as the soft total cap is exceeded.

use std::collections::{HashMap, VecDeque};

use anyhow::Result;

use crate::buckets::classify_index;
use crate::types::AudioClip;

/// One candidate from the external segmentation/retrieval step.
#[derive(Debug)]
pub struct Candidate {
    pub source: String,
    pub clip: AudioClip,
}

/// Bucketed clip pools: bucket index -> one FIFO queue per source.
///
/// Queues preserve the original extraction order within a source.
/// Drained queues are swap-removed, so queue order within a bucket is
/// arbitrary once scheduling starts; source identity is not retained
/// past collection.
#[derive(Debug)]
pub struct SegmentPools {
    thresholds: Vec<u32>,
    buckets: Vec<Vec<VecDeque<AudioClip>>>,
}

impl SegmentPools {
    pub fn new(thresholds: &[u32]) -> Self {
        Self {
            thresholds: thresholds.to_vec(),
            buckets: thresholds.iter().map(|_| Vec::new()).collect(),
        }
    }

    pub fn thresholds(&self) -> &[u32] {
        &self.thresholds
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn threshold(&self, bucket: usize) -> u32 {
        self.thresholds[bucket]
    }

    /// Number of non-empty source queues remaining in a bucket.
    pub fn num_sources(&self, bucket: usize) -> usize {
        self.buckets[bucket].len()
    }

    /// Per-source clip queues of a bucket, in current slot order.
    pub fn source_queues(&self, bucket: usize) -> &[VecDeque<AudioClip>] {
        &self.buckets[bucket]
    }

    pub fn bucket_clip_count(&self, bucket: usize) -> usize {
        self.buckets[bucket].iter().map(|q| q.len()).sum()
    }

    pub fn total_clips(&self) -> usize {
        (0..self.num_buckets()).map(|b| self.bucket_clip_count(b)).sum()
    }

    /// Append a new (empty) source queue to a bucket, returning its slot.
    fn add_source(&mut self, bucket: usize) -> usize {
        self.buckets[bucket].push(VecDeque::new());
        self.buckets[bucket].len() - 1
    }

    fn push(&mut self, bucket: usize, slot: usize, clip: AudioClip) {
        self.buckets[bucket][slot].push_back(clip);
    }

    /// Pop the oldest clip from the given source queue (FIFO). The
    /// queue is swap-removed once drained, keeping pops O(1) amortized.
    pub fn pop_from_source(&mut self, bucket: usize, slot: usize) -> Option<AudioClip> {
        let clip = self.buckets[bucket].get_mut(slot)?.pop_front()?;
        if self.buckets[bucket][slot].is_empty() {
            self.buckets[bucket].swap_remove(slot);
        }
        Some(clip)
    }
}

/// Gather candidates into bucketed per-source pools.
///
/// - a failed candidate (decode/IO error) is logged and skipped;
/// - clips longer than `max_section_length` seconds are skipped;
/// - at most `max_sections_per_source` clips are accepted per source,
///   further clips from a saturated source are skipped while other
///   sources keep flowing;
/// - once the running total exceeds `max_total_clips` (a soft cap),
///   collection stops pulling from the stream entirely. Partial pools
///   are still usable.
pub fn collect<I>(
    candidates: I,
    thresholds: &[u32],
    max_section_length: f64,
    max_sections_per_source: usize,
    max_total_clips: usize,
) -> SegmentPools
where
    I: IntoIterator<Item = Result<Candidate>>,
{
    let mut pools = SegmentPools::new(thresholds);
    let mut accepted_per_source: HashMap<String, usize> = HashMap::new();
    // (bucket, source) -> queue slot, dropped when collection ends.
    let mut slots: Vec<HashMap<String, usize>> = thresholds.iter().map(|_| HashMap::new()).collect();
    let mut total = 0usize;

    for candidate in candidates {
        let Candidate { source, clip } = match candidate {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Skipping candidate: {:#}", e);
                continue;
            }
        };

        let duration_ms = clip.duration_ms();
        if duration_ms > max_section_length * 1000.0 {
            log::debug!(
                "Skipping {:.0}ms clip from \"{}\" (over the {:.1}s cap)",
                duration_ms,
                source,
                max_section_length
            );
            continue;
        }

        let accepted = accepted_per_source.entry(source.clone()).or_insert(0);
        if *accepted >= max_sections_per_source {
            log::debug!(
                "\"{}\" already contributed {} clips, skipping",
                source,
                max_sections_per_source
            );
            continue;
        }
        *accepted += 1;

        let bucket = classify_index(duration_ms, thresholds);
        let slot = match slots[bucket].get(&source) {
            Some(&s) => s,
            None => {
                let s = pools.add_source(bucket);
                slots[bucket].insert(source.clone(), s);
                s
            }
        };
        pools.push(bucket, slot, clip);

        total += 1;
        if total > max_total_clips {
            log::debug!("Collected {} clips, stopping collection", total);
            break;
        }
    }

    for (i, &threshold) in thresholds.iter().enumerate() {
        log::debug!(
            "Bucket {}ms: {} clips across {} sources",
            threshold,
            pools.bucket_clip_count(i),
            pools.num_sources(i)
        );
    }

    pools
}
