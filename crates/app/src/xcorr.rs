use auricle_doa::TdoaEstimator;

/// Supplied delay estimator: normalized time-domain cross-correlation
/// searched over the admissible integer lag range, with optional parabolic
/// sub-sample refinement quantized to `1/interp` steps. Deterministic, and
/// silent input yields a zero delay rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct XcorrEstimator;

impl TdoaEstimator for XcorrEstimator {
    fn estimate(
        &mut self,
        a: &[i16],
        b: &[i16],
        sample_rate: u32,
        max_tau: f64,
        interp: usize,
    ) -> (f64, f64) {
        let len = a.len().min(b.len());
        if len < 2 || sample_rate == 0 {
            return (0.0, 0.0);
        }
        let a = &a[..len];
        let b = &b[..len];

        let energy_a: f64 = a.iter().map(|&s| (s as f64) * (s as f64)).sum();
        let energy_b: f64 = b.iter().map(|&s| (s as f64) * (s as f64)).sum();
        let norm = (energy_a * energy_b).sqrt();
        if norm == 0.0 {
            return (0.0, 0.0);
        }

        let max_lag = ((max_tau * sample_rate as f64).ceil() as usize).min(len - 1) as isize;

        // Zero lag first so ties from flat correlation stay at zero delay.
        let mut best_lag = 0isize;
        let mut best_val = correlation(a, b, 0);
        for lag in -max_lag..=max_lag {
            if lag == 0 {
                continue;
            }
            let val = correlation(a, b, lag);
            if val > best_val {
                best_val = val;
                best_lag = lag;
            }
        }

        let mut lag = best_lag as f64;
        if interp > 1 && best_lag.abs() < max_lag {
            // Parabolic fit through the peak and its neighbours.
            let prev = correlation(a, b, best_lag - 1);
            let next = correlation(a, b, best_lag + 1);
            let denom = prev - 2.0 * best_val + next;
            if denom.abs() > f64::EPSILON {
                let delta = (0.5 * (prev - next) / denom).clamp(-0.5, 0.5);
                lag += (delta * interp as f64).round() / interp as f64;
            }
        }

        (lag / sample_rate as f64, best_val / norm)
    }
}

/// r(lag) = sum over the overlap of a[n] * b[n + lag].
fn correlation(a: &[i16], b: &[i16], lag: isize) -> f64 {
    let len = a.len() as isize;
    let start = (-lag).max(0);
    let end = (len - lag).min(len);
    let mut sum = 0.0;
    for n in start..end {
        sum += a[n as usize] as f64 * b[(n + lag) as usize] as f64;
    }
    sum
}
