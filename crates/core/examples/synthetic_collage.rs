//! Compose a collage from synthesized tone clips, no input files
//! needed.
//!
//! Run with: cargo run -p murmuration-core --example synthetic_collage

use murmuration_core::collect::Candidate;
use murmuration_core::compose::{compose, export, ComposerConfig};
use murmuration_core::types::AudioClip;

fn tone(freq: f64, duration_ms: f64, sample_rate: u32) -> Vec<f64> {
    let n = (duration_ms / 1000.0 * sample_rate as f64).round() as usize;
    (0..n)
        .map(|i| {
            (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin() * 0.5
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp(None)
        .init();

    let config = ComposerConfig {
        density: 0.6,
        seed: Some(1969),
        ..Default::default()
    };
    let sample_rate = config.sample_rate;

    // Three "sources", each a little scale of tones with varied clip
    // lengths so every bucket gets some material.
    let candidates = (0..3).flat_map(|source| {
        (0..8).map(move |i| {
            let freq = 220.0 * (source + 1) as f64 + 55.0 * i as f64;
            let duration_ms = 250.0 + 550.0 * ((source + i) % 4) as f64;
            Ok(Candidate {
                source: format!("source-{}", source),
                clip: AudioClip::new(tone(freq, duration_ms, sample_rate), sample_rate),
            })
        })
    });

    let composition = compose(candidates, &config)?;
    let (bytes, duration) = export(&composition)?;

    let output = std::env::temp_dir().join("synthetic_collage.wav");
    std::fs::write(&output, &bytes)?;
    println!("{} [{:.1}s]", output.display(), duration);
    Ok(())
}
