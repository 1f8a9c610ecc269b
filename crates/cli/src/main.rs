//! Murmuration CLI — generative audio collage from local clip files.
//!
//! Each input directory is one source whose audio files are that
//! source's clips; a bare file is a single-clip source. Clips are
//! decoded lazily while the collector pulls, mirroring the
//! expensive-stream shape of a network-backed candidate feed.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use murmuration_core::audio::io::decode_audio;
use murmuration_core::collect::Candidate;
use murmuration_core::compose::{compose, export, ComposerConfig};
use murmuration_core::types::AudioClip;

/// Extensions the decoder handles (symphonia: wav, mp3, mp4/aac).
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "mp4", "aac"];

#[derive(Parser, Debug)]
#[command(
    name = "murmuration",
    about = "Generative audio collage composer",
    version,
)]
struct Cli {
    /// Input sources: a directory per source (its audio files are the
    /// source's clips) or a single audio file as a one-clip source
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output WAV path
    #[arg(long, default_value = "murmuration.wav")]
    output: PathBuf,

    /// Ascending duration bucket thresholds (ms)
    #[arg(long, value_delimiter = ',', default_values_t = vec![500u32, 1000, 1500, 3000, 5000])]
    buckets: Vec<u32>,

    /// Maximum clip length in seconds; longer clips are skipped
    #[arg(long, default_value_t = 10.0)]
    max_section_length: f64,

    /// Maximum clips accepted per source
    #[arg(long, default_value_t = 15)]
    max_sections_per_source: usize,

    /// Soft cap on total collected clips
    #[arg(long, default_value_t = 50)]
    max_total_clips: usize,

    /// Composition density in [0, 1]; lower inserts longer silence gaps
    #[arg(long, default_value_t = 0.5)]
    density: f64,

    /// RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    validate_inputs(&cli.inputs)?;
    if !(0.0..=1.0).contains(&cli.density) {
        bail!("--density must be in [0, 1]");
    }
    if cli.buckets.is_empty() || !cli.buckets.windows(2).all(|w| w[0] < w[1]) {
        bail!("--buckets must be a non-empty ascending list");
    }

    let config = ComposerConfig {
        bucket_thresholds_ms: cli.buckets,
        max_section_length: cli.max_section_length,
        max_sections_per_source: cli.max_sections_per_source,
        max_total_clips: cli.max_total_clips,
        density: cli.density,
        seed: cli.seed,
        ..Default::default()
    };

    let pairs = clip_paths(&cli.inputs)?;
    log::info!(
        "Found {} clip file(s) across {} input(s)",
        pairs.len(),
        cli.inputs.len()
    );

    let sample_rate = config.sample_rate;
    let candidates = pairs.into_iter().map(move |(source, path)| {
        log::debug!("Decoding {}...", path.display());
        let samples = decode_audio(&path, sample_rate)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        Ok(Candidate {
            source,
            clip: AudioClip::new(samples, sample_rate),
        })
    });

    let composition = compose(candidates, &config)?;
    let (bytes, duration) = export(&composition)?;

    std::fs::write(&cli.output, &bytes)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    log::info!("Wrote {} [{:.1}s]", cli.output.display(), duration);
    println!("{} [{:.1}s]", cli.output.display(), duration);
    Ok(())
}

/// Validate input paths exist.
fn validate_inputs(paths: &[PathBuf]) -> Result<()> {
    if paths.is_empty() {
        bail!("At least one input is required");
    }
    for p in paths {
        if !p.exists() {
            bail!("Input not found: {}", p.display());
        }
    }
    Ok(())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Expand inputs into (source, clip file) pairs. Directory clips keep
/// filename order, preserving the source's extraction order.
fn clip_paths(inputs: &[PathBuf]) -> Result<Vec<(String, PathBuf)>> {
    let mut pairs = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let source = source_name(input);
            let mut files: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_audio_file(p))
                .collect();
            files.sort();
            if files.is_empty() {
                log::warn!("No audio files in {}", input.display());
            }
            for file in files {
                pairs.push((source.clone(), file));
            }
        } else {
            pairs.push((source_name(input), input.clone()));
        }
    }
    Ok(pairs)
}
