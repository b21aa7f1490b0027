// DominantFrequencyEstimator - single-segment power spectrum peak picking
//
// One FFT covers the whole analysis window; there is no sub-windowing or
// averaging. The signal is detrended (constant) and tapered with a
// Tukey(0.25) window before transforming. Detrending matters here: the
// decoded samples are unsigned with a large DC offset, and without it the
// zero bin would win every argmax.

use rustfft::{num_complex::Complex, FftPlanner};

/// Tukey window taper fraction.
const TUKEY_ALPHA: f64 = 0.25;

/// Estimates the dominant oscillation frequency of a window.
pub struct DominantFrequencyEstimator {
    planner: FftPlanner<f64>,
}

impl Default for DominantFrequencyEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl DominantFrequencyEstimator {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Frequency bin of peak power, in Hz.
    ///
    /// Returns `None` for signals shorter than 2 samples; callers guard
    /// instead of the estimator failing.
    pub fn estimate(&mut self, signal: &[f64], sampling_rate_hz: f64) -> Option<f64> {
        let n = signal.len();
        if n < 2 {
            return None;
        }

        let mean = signal.iter().sum::<f64>() / n as f64;
        let window = tukey_window(n);
        let mut buffer: Vec<Complex<f64>> = signal
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new((s - mean) * w, 0.0))
            .collect();

        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        // One-sided power spectrum; scaling constants cancel in the argmax.
        // Ties resolve to the lowest bin (first maximum), so an all-zero
        // window reports DC rather than Nyquist.
        let mut peak_bin = 0usize;
        let mut peak_power = f64::NEG_INFINITY;
        for (i, power) in buffer[..n / 2 + 1].iter().map(|c| c.norm_sqr()).enumerate() {
            if power > peak_power {
                peak_power = power;
                peak_bin = i;
            }
        }

        Some(peak_bin as f64 * sampling_rate_hz / n as f64)
    }
}

fn tukey_window(n: usize) -> Vec<f64> {
    use std::f64::consts::PI;
    let edge = TUKEY_ALPHA / 2.0;
    (0..n)
        .map(|i| {
            let x = i as f64 / (n - 1) as f64;
            if x < edge {
                0.5 * (1.0 + (2.0 * PI / TUKEY_ALPHA * (x - edge)).cos())
            } else if x <= 1.0 - edge {
                1.0
            } else {
                0.5 * (1.0 + (2.0 * PI / TUKEY_ALPHA * (x - 1.0 + edge)).cos())
            }
        })
        .collect()
}
