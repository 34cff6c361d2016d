// ============================================================
// Layer 4 — Sensor Noise at a Target SNR
// ============================================================
// Real sensors are noisy, so every sensor vector gets white
// Gaussian noise whose power is set relative to the signal:
//
//   P_signal = mean(x²)
//   P_noise  = P_signal / 10^(SNR_dB / 10)
//   x'       = x + N(0, P_noise)
//
// At 80 dB the noise is ~1e-4 of the signal amplitude; at 10 dB
// it is about a third.

use rand::Rng;
use rand_distr::StandardNormal;

/// Standard deviation of the noise for `values` at `snr_db`.
pub fn noise_std(values: &[f32], snr_db: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let power = values.iter().map(|&v| (v as f64).powi(2)).sum::<f64>() / values.len() as f64;
    (power / 10f64.powf(snr_db / 10.0)).sqrt()
}

/// Add Gaussian noise to `values` in place so the result has the given SNR.
pub fn add_noise<R: Rng + ?Sized>(values: &mut [f32], snr_db: f64, rng: &mut R) {
    let std = noise_std(values, snr_db);
    if std == 0.0 {
        return;
    }
    for v in values.iter_mut() {
        *v += (std * rng.sample::<f64, _>(StandardNormal)) as f32;
    }
}
