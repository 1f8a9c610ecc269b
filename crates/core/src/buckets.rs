//! Duration-bucket classification.
//!
//! Buckets separate voiced clips by length; a clip's bucket drives its
//! scheduling parameters (pan range, offset jitter, silence chance).

/// Default duration bucket thresholds in milliseconds.
pub const DEFAULT_BUCKETS_MS: &[u32] = &[500, 1000, 1500, 3000, 5000];

/// Index of the bucket for a clip of `duration_ms`.
///
/// Returns the index of the smallest threshold >= `duration_ms`;
/// durations beyond the largest threshold clamp to the last bucket,
/// never dropping a clip. Exact equality to a threshold resolves to
/// that threshold. Binary search over bucket midpoints, O(log B).
pub fn classify_index(duration_ms: f64, thresholds: &[u32]) -> usize {
    debug_assert!(!thresholds.is_empty());
    debug_assert!(thresholds.windows(2).all(|w| w[0] < w[1]));

    // First bucket whose midpoint-to-next lies above the duration.
    let mut lo = 0;
    let mut hi = thresholds.len() - 1;
    while lo < hi {
        let mid = (lo + hi) / 2;
        let midpoint = (thresholds[mid] as f64 + thresholds[mid + 1] as f64) / 2.0;
        if midpoint <= duration_ms {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    // Nearest-by-midpoint may still sit below the duration; bump up
    // unless already at the top bucket.
    if (thresholds[lo] as f64) < duration_ms && lo < thresholds.len() - 1 {
        lo += 1;
    }
    lo
}

/// Threshold value of the bucket for a clip of `duration_ms`.
pub fn classify(duration_ms: f64, thresholds: &[u32]) -> u32 {
    thresholds[classify_index(duration_ms, thresholds)]
}
