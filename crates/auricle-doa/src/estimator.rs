/// One per-pair delay estimate handed to the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayEstimate {
    /// Arrival-time difference in seconds. Positive when the second channel
    /// of the pair lags the first.
    pub tau: f64,
    /// Index of the pair group this estimate belongs to.
    pub group: usize,
}

/// Contract for the time-delay estimator supplied by the caller.
///
/// Implementations take two equal-length single-channel sample sequences at
/// the same rate and return `(tau, strength)`: the estimated delay in seconds
/// (positive when `b` lags `a`) and a correlation-strength value. They must
/// be deterministic for identical inputs and return a zero delay, not an
/// error, for uncorrelated or silent input. `max_tau` bounds the admissible
/// delay and `interp` is the sub-sample interpolation factor (>= 1).
pub trait TdoaEstimator: Send {
    fn estimate(
        &mut self,
        a: &[i16],
        b: &[i16],
        sample_rate: u32,
        max_tau: f64,
        interp: usize,
    ) -> (f64, f64);
}
