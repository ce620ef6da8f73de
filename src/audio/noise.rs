//! Stationary noise gate seeded from the head of each segment.
//!
//! The first ~0.5s of a segment is treated as a noise profile. Samples whose
//! magnitude stays near that floor are attenuated; louder samples pass
//! through untouched. This is a coarse stand-in for full spectral noise
//! suppression, which is out of scope.

use crate::defaults::{self, NOISE_PROFILE_SECS};

/// Samples below `floor * GATE_RATIO` are treated as noise.
const GATE_RATIO: f32 = 2.0;

/// Attenuation applied to gated samples.
const GATE_ATTENUATION: f32 = 0.1;

/// Applies the stationary noise gate in place.
///
/// Segments shorter than the noise profile are returned unchanged; there is
/// not enough signal to estimate a floor.
pub fn suppress(samples: &mut [f32], sample_rate: u32) {
    let profile_len = defaults::samples_for_secs(NOISE_PROFILE_SECS, sample_rate);
    if samples.len() <= profile_len || profile_len == 0 {
        return;
    }

    let floor = rms(&samples[..profile_len]);
    if floor <= f32::EPSILON {
        // Profile is digital silence; nothing to subtract.
        return;
    }

    let gate = floor * GATE_RATIO;
    for sample in samples.iter_mut() {
        if sample.abs() < gate {
            *sample *= GATE_ATTENUATION;
        }
    }
}

/// Root-mean-square energy of a sample slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
