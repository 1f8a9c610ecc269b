//! End-to-end composition pipeline: collect -> schedule -> render ->
//! export. Stateless between runs.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use crate::audio::io::encode_wav;
use crate::audio::render::render;
use crate::buckets::DEFAULT_BUCKETS_MS;
use crate::collect::{collect, Candidate, SegmentPools};
use crate::schedule::schedule;
use crate::types::Composition;

/// Set this environment variable to a path to write a JSON snapshot of
/// the pooled-but-unscheduled clips. Diagnostic only.
pub const SAVE_POOLS_ENV: &str = "MURMURATION_SAVE_POOLS";

/// Run-level failures. Per-candidate failures are logged and skipped
/// inside collection and never escalate to this level.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The candidate stream yielded no usable clips.
    #[error("no usable clips collected; nothing to compose")]
    NoMaterial,
    /// The master buffer could not be encoded.
    #[error("failed to encode master buffer")]
    Encode(#[source] anyhow::Error),
}

/// Configuration for a composition run.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Ascending duration bucket thresholds (ms).
    pub bucket_thresholds_ms: Vec<u32>,
    /// Clip duration cap in seconds; longer candidates are skipped.
    pub max_section_length: f64,
    /// Max clips accepted per source.
    pub max_sections_per_source: usize,
    /// Soft cap on total collected clips.
    pub max_total_clips: usize,
    /// In [0, 1]; inversely controls silence-gap length between
    /// placements.
    pub density: f64,
    /// Master (and expected clip) sample rate.
    pub sample_rate: u32,
    /// Edge fade length applied to every rendered clip.
    pub fade_ms: f64,
    /// RNG seed for reproducible output; None seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            bucket_thresholds_ms: DEFAULT_BUCKETS_MS.to_vec(),
            max_section_length: 10.0,
            max_sections_per_source: 15,
            max_total_clips: 50,
            density: 0.5,
            sample_rate: 48_000,
            fade_ms: 10.0,
            seed: None,
        }
    }
}

/// Run a full composition over a lazy candidate stream.
///
/// Fails only when the stream yields no usable material; individual
/// bad candidates are skipped during collection.
pub fn compose<I>(candidates: I, config: &ComposerConfig) -> Result<Composition>
where
    I: IntoIterator<Item = Result<Candidate>>,
{
    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let pools = collect(
        candidates,
        &config.bucket_thresholds_ms,
        config.max_section_length,
        config.max_sections_per_source,
        config.max_total_clips,
    );

    save_pool_snapshot(&pools);

    if pools.total_clips() == 0 {
        return Err(ComposeError::NoMaterial.into());
    }
    log::info!("Collected {} clips, composing...", pools.total_clips());

    let plan = schedule(pools, config.density, &mut rng);
    log::info!(
        "Scheduled {} segments over {:.1}s",
        plan.num_segments(),
        plan.length_ms / 1000.0
    );

    let length_ms = plan.length_ms;
    let master = render(length_ms, plan.into_segments(), config.sample_rate, config.fade_ms);
    let duration_seconds = master.duration_seconds();

    Ok(Composition { master, duration_seconds })
}

/// Encode the rendered master for delivery.
///
/// Returns the encoded bytes and the duration in seconds. Encoding
/// failure is fatal for the run: no partial output is useful.
pub fn export(composition: &Composition) -> Result<(Vec<u8>, f64)> {
    let bytes = encode_wav(&composition.master).map_err(ComposeError::Encode)?;
    Ok((bytes, composition.duration_seconds))
}

#[derive(Debug, Serialize)]
struct BucketSnapshot {
    threshold_ms: u32,
    /// Clip durations (ms) per source queue, in extraction order.
    sources: Vec<Vec<f64>>,
}

/// Write the pooled-but-unscheduled clips as JSON when the env flag is
/// set. Failures here are logged, never fatal.
fn save_pool_snapshot(pools: &SegmentPools) {
    let Ok(path) = std::env::var(SAVE_POOLS_ENV) else {
        return;
    };

    let snapshot: Vec<BucketSnapshot> = (0..pools.num_buckets())
        .map(|b| BucketSnapshot {
            threshold_ms: pools.threshold(b),
            sources: pools
                .source_queues(b)
                .iter()
                .map(|q| q.iter().map(|c| c.duration_ms()).collect())
                .collect(),
        })
        .collect();

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&path, json) {
                log::warn!("Unable to write pool snapshot to {}: {}", path, e);
            } else {
                log::debug!("Wrote pool snapshot to {}", path);
            }
        }
        Err(e) => log::warn!("Unable to serialize pool snapshot: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::schedule as run_schedule;
    use crate::types::AudioClip;
    use std::io::Cursor;

    const SR: u32 = 48000;

    fn candidate(source: &str, duration_ms: f64) -> Result<Candidate> {
        let n = (duration_ms / 1000.0 * SR as f64).round() as usize;
        let samples: Vec<f64> = (0..n).map(|i| (i as f64 / 40.0).sin() * 0.4).collect();
        Ok(Candidate {
            source: source.to_string(),
            clip: AudioClip::new(samples, SR),
        })
    }

    #[test]
    fn test_compose_empty_stream_fails() {
        let config = ComposerConfig::default();
        let err = compose(Vec::new(), &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ComposeError>(),
            Some(ComposeError::NoMaterial)
        ));
    }

    #[test]
    fn test_compose_all_candidates_rejected_fails() {
        let config = ComposerConfig {
            max_section_length: 0.1,
            ..Default::default()
        };
        let err = compose(vec![candidate("a", 900.0)], &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ComposeError>(),
            Some(ComposeError::NoMaterial)
        ));
    }

    #[test]
    fn test_compose_end_to_end_matches_schedule() {
        // 2 buckets, one source, 3 clips of 800ms, density 1.0,
        // fixed seed.
        let config = ComposerConfig {
            bucket_thresholds_ms: vec![1000, 3000],
            density: 1.0,
            seed: Some(21),
            ..Default::default()
        };
        let composition = compose(
            vec![candidate("a", 800.0), candidate("a", 800.0), candidate("a", 800.0)],
            &config,
        )
        .unwrap();

        // Replay the same seed through collect + schedule to get the
        // expected plan.
        let pools = collect(
            vec![candidate("a", 800.0), candidate("a", 800.0), candidate("a", 800.0)],
            &config.bucket_thresholds_ms,
            config.max_section_length,
            config.max_sections_per_source,
            config.max_total_clips,
        );
        let mut rng = StdRng::seed_from_u64(21);
        let plan = run_schedule(pools, config.density, &mut rng);

        assert_eq!(plan.num_segments(), 3);
        let expected_seconds =
            (plan.length_ms / 1000.0 * SR as f64).round() / SR as f64;
        assert!((composition.duration_seconds - expected_seconds).abs() < 1e-9);
        assert!(composition.master.len() > 0);
    }

    #[test]
    fn test_compose_seeded_is_reproducible() {
        let run = || {
            let config = ComposerConfig {
                seed: Some(9),
                ..Default::default()
            };
            let candidates = vec![
                candidate("a", 300.0),
                candidate("a", 700.0),
                candidate("b", 1200.0),
            ];
            compose(candidates, &config).unwrap()
        };
        let first = run();
        let second = run();
        assert_eq!(first.master, second.master);
    }

    #[test]
    fn test_compose_excludes_oversized_clip_entirely() {
        let config = ComposerConfig {
            max_section_length: 1.0,
            density: 1.0,
            seed: Some(4),
            ..Default::default()
        };
        // The 5s clip is skipped; only the two short clips are mixed,
        // so the master cannot reach anywhere near 5s of audio from
        // the long clip alone.
        let composition = compose(
            vec![candidate("a", 400.0), candidate("a", 5000.0), candidate("a", 600.0)],
            &config,
        )
        .unwrap();
        assert!(composition.duration_seconds > 0.0);

        let pools = collect(
            vec![candidate("a", 400.0), candidate("a", 5000.0), candidate("a", 600.0)],
            &config.bucket_thresholds_ms,
            config.max_section_length,
            config.max_sections_per_source,
            config.max_total_clips,
        );
        assert_eq!(pools.total_clips(), 2);
    }

    #[test]
    fn test_export_bytes_and_duration() {
        let config = ComposerConfig {
            seed: Some(2),
            ..Default::default()
        };
        let composition =
            compose(vec![candidate("a", 450.0), candidate("b", 450.0)], &config).unwrap();
        let (bytes, duration) = export(&composition).unwrap();
        assert!((duration - composition.duration_seconds).abs() < f64::EPSILON);

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, SR);
        let frames = reader.len() as usize / 2;
        assert_eq!(frames, composition.master.len());
    }

    #[test]
    fn test_composer_config_default() {
        let config = ComposerConfig::default();
        assert_eq!(config.bucket_thresholds_ms, DEFAULT_BUCKETS_MS);
        assert_eq!(config.max_total_clips, 50);
        assert!((config.density - 0.5).abs() < f64::EPSILON);
        assert!(config.seed.is_none());
    }
}
