//! Audio I/O: compressed-format decode to the composer's rate, and
//! WAV encode of the stereo master.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::types::StereoBuffer;

/// Resample mono audio between sample rates.
///
/// Uses rubato sinc interpolation.
pub fn resample(samples: &[f64], from_rate: u32, to_rate: u32) -> Result<Vec<f64>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(vec![]);
    }

    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
        WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f64>::new(ratio, 2.0, params, samples.len(), 1)?;

    let output = resampler.process(&[samples.to_vec()], None)?;
    Ok(output.into_iter().next().unwrap_or_default())
}

/// Decode an audio file (WAV, MP3, or MP4/AAC) to mono f64 samples at
/// `target_rate`.
///
/// Multi-channel input is downmixed by channel averaging.
pub fn decode_audio(input_path: &Path, target_rate: u32) -> Result<Vec<f64>> {
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
    use symphonia::core::errors::Error as SymphError;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let file = std::fs::File::open(input_path)
        .with_context(|| format!("Failed to open: {}", input_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = input_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Unsupported format: {}", input_path.display()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let source_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Unsupported codec")?;

    let mut mono: Vec<f64> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let num_frames = decoded.frames();
                let mut sample_buf = SampleBuffer::<f64>::new(num_frames as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                let interleaved = sample_buf.samples();

                if channels > 1 {
                    for frame in 0..num_frames {
                        let mut sum = 0.0;
                        for ch in 0..channels {
                            sum += interleaved[frame * channels + ch];
                        }
                        mono.push(sum / channels as f64);
                    }
                } else {
                    mono.extend_from_slice(interleaved);
                }
            }
            Err(SymphError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    if mono.is_empty() {
        anyhow::bail!("No audio decoded from {}", input_path.display());
    }

    if source_rate != target_rate {
        resample(&mono, source_rate, target_rate)
    } else {
        Ok(mono)
    }
}

/// Encode a stereo buffer to interleaved 16-bit PCM WAV bytes.
///
/// Samples are clamped to [-1, 1] before conversion; overlap sums
/// beyond full scale clip here, by design.
pub fn encode_wav(buffer: &StereoBuffer) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        WavWriter::new(&mut cursor, spec).context("Failed to start WAV encoding")?;
    for frame in 0..buffer.len() {
        for &sample in [buffer.left[frame], buffer.right[frame]].iter() {
            let clipped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clipped * 32767.0) as i16)?;
        }
    }
    writer.finalize().context("Failed to finalize WAV encoding")?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;
    use std::path::PathBuf;

    fn temp_wav_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("murmuration_test_io");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_encode_wav_roundtrip() {
        let n = 4800;
        let buffer = StereoBuffer {
            left: (0..n).map(|i| (i as f64 / 100.0).sin() * 0.5).collect(),
            right: (0..n).map(|i| (i as f64 / 100.0).cos() * 0.5).collect(),
            sample_rate: 48000,
        };
        let bytes = encode_wav(&buffer).unwrap();

        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), n * 2);
        // Interleaved L/R; quantization error only.
        assert!((samples[0] as f64 / 32767.0 - buffer.left[0]).abs() < 0.001);
        assert!((samples[1] as f64 / 32767.0 - buffer.right[0]).abs() < 0.001);
    }

    #[test]
    fn test_encode_wav_clamps_overdriven_sums() {
        let buffer = StereoBuffer {
            left: vec![2.5; 100],
            right: vec![-2.5; 100],
            sample_rate: 48000,
        };
        let bytes = encode_wav(&buffer).unwrap();
        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples[0], 32767);
        assert_eq!(samples[1], -32767);
    }

    #[test]
    fn test_encode_wav_empty_buffer() {
        let buffer = StereoBuffer::silent(0.0, 48000);
        let bytes = encode_wav(&buffer).unwrap();
        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn test_resample_same_rate() {
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(resample(&samples, 48000, 48000).unwrap(), samples);
    }

    #[test]
    fn test_resample_empty() {
        assert!(resample(&[], 44100, 48000).unwrap().is_empty());
    }

    #[test]
    fn test_resample_upsamples() {
        let samples: Vec<f64> = (0..24000)
            .map(|i| (i as f64 / 24000.0 * std::f64::consts::TAU).sin())
            .collect();
        let result = resample(&samples, 24000, 48000).unwrap();
        // Sinc resampler trims edges; allow a wide tolerance.
        assert!(
            result.len() >= 44000 && result.len() <= 50000,
            "Expected ~48000 samples, got {}",
            result.len()
        );
    }

    #[test]
    fn test_decode_audio_wav_downmix_and_resample() {
        let path = temp_wav_path("stereo_44k.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..44100 {
            let sample =
                ((i as f64 / 44100.0 * 440.0 * std::f64::consts::TAU).sin() * 16000.0) as i16;
            writer.write_sample(sample).unwrap();
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let samples = decode_audio(&path, 48000).unwrap();
        // 1 second in, roughly 1 second out at the target rate.
        assert!(
            samples.len() > 44000 && samples.len() < 50000,
            "Expected ~48000 samples, got {}",
            samples.len()
        );

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_decode_audio_missing_file() {
        let missing = PathBuf::from("/nonexistent/murmuration.wav");
        assert!(decode_audio(&missing, 48000).is_err());
    }
}
