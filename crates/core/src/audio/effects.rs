//! Per-clip processing: peak normalization, edge fades, pan law.

/// Scale samples so the peak reaches full scale. Near-silent input is
/// left untouched.
pub fn normalize_peak(samples: &mut [f64]) {
    let peak = samples.iter().fold(0.0f64, |m, &s| m.max(s.abs()));
    if peak < 1e-9 {
        return;
    }
    let gain = 1.0 / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

/// Linear fade-in and fade-out over `fade_ms` at the clip edges,
/// removing click artifacts at segment boundaries.
///
/// Fades shrink to half the clip when the clip is shorter than two
/// full fades.
pub fn apply_edge_fades(samples: &mut [f64], sample_rate: u32, fade_ms: f64) {
    if fade_ms <= 0.0 || samples.is_empty() {
        return;
    }
    let fade_samples = (fade_ms / 1000.0 * sample_rate as f64).round() as usize;
    let fade = fade_samples.min(samples.len() / 2);
    if fade == 0 {
        return;
    }

    let len = samples.len();
    for i in 0..fade {
        let gain = i as f64 / fade as f64;
        samples[i] *= gain;
        samples[len - 1 - i] *= gain;
    }
}

/// Constant-power pan law: left = cos((pan + 1) * PI/4),
/// right = sin((pan + 1) * PI/4). Returns (left_gain, right_gain).
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * std::f64::consts::FRAC_PI_4;
    (theta.cos(), theta.sin())
}
