use crate::estimator::{DelayEstimate, TdoaEstimator};
use crate::topology::ArrayTopology;

/// Map a pair delay to an angle in [-90, 90] degrees off the pair's axis.
/// The ratio is clamped before the arcsine: measurement noise can push
/// `tau` past `max_tau`, and an unclamped call would leave the domain.
fn pair_angle(tau: f64, max_tau: f64) -> f64 {
    (tau / max_tau).clamp(-1.0, 1.0).asin().to_degrees()
}

/// First index with the smallest absolute delay. The group most
/// perpendicular to the source sits nearest the linear part of the arcsine,
/// so its angle is the most trustworthy.
fn min_abs_index(tau: &[f64]) -> usize {
    let mut min_index = 0;
    for (i, t) in tau.iter().enumerate().skip(1) {
        if t.abs() < tau[min_index].abs() {
            min_index = i;
        }
    }
    min_index
}

fn resolve_square4(theta: &[f64; 2]) -> f64 {
    let guess = if theta[0].abs() < theta[1].abs() {
        // Pair 0 is closer to broadside; pair 1's sign picks the half-plane.
        if theta[1] > 0.0 {
            (theta[0] + 360.0).rem_euclid(360.0)
        } else {
            180.0 - theta[0]
        }
    } else {
        let guess = if theta[0] < 0.0 {
            (theta[1] + 360.0).rem_euclid(360.0)
        } else {
            180.0 - theta[1]
        };
        // Pair 1 sits a quarter turn from pair 0, mirrored.
        (guess + 90.0 + 180.0).rem_euclid(360.0)
    };
    (-guess + 120.0).rem_euclid(360.0)
}

fn resolve_circular(theta: &[f64; 3], tau: &[f64; 3]) -> f64 {
    let min_index = min_abs_index(tau);
    let last = theta.len() - 1;
    let neighbour_front = (min_index != 0 && theta[min_index - 1] >= 0.0)
        || (min_index == 0 && theta[last] < 0.0);
    let guess = if neighbour_front {
        (theta[min_index] + 360.0).rem_euclid(360.0)
    } else {
        180.0 - theta[min_index]
    };
    (guess + 120.0 + min_index as f64 * 60.0).rem_euclid(360.0)
}

/// Resolve a single bearing in [0, 360) degrees from per-group delay
/// estimates. Returns `None` when the topology cannot disambiguate a
/// direction (`Pair2` has an unresolvable front/back ambiguity) or when the
/// estimate set does not cover the topology's pair groups.
pub fn resolve_bearing(topology: ArrayTopology, estimates: &[DelayEstimate]) -> Option<u16> {
    let groups = topology.pair_groups();
    if topology == ArrayTopology::Pair2 {
        return None;
    }
    if estimates.len() != groups.len() {
        tracing::warn!(
            got = estimates.len(),
            want = groups.len(),
            %topology,
            "delay estimate count does not match pair groups"
        );
        return None;
    }

    let max_tau = topology.max_tau();
    let mut tau = [0.0f64; 3];
    for estimate in estimates {
        if estimate.group >= groups.len() {
            return None;
        }
        tau[estimate.group] = estimate.tau;
    }

    let bearing = match topology {
        ArrayTopology::Pair2 => unreachable!(),
        ArrayTopology::Square4 => {
            let theta = [pair_angle(tau[0], max_tau), pair_angle(tau[1], max_tau)];
            resolve_square4(&theta)
        }
        ArrayTopology::Hex6Plus1 | ArrayTopology::Circular8 => {
            let theta = [
                pair_angle(tau[0], max_tau),
                pair_angle(tau[1], max_tau),
                pair_angle(tau[2], max_tau),
            ];
            resolve_circular(&theta, &[tau[0], tau[1], tau[2]])
        }
    };

    Some(bearing.rem_euclid(360.0) as u16 % 360)
}

/// Samples of one channel extracted from an interleaved buffer.
pub fn channel_samples(interleaved: &[i16], channels: usize, index: usize) -> Vec<i16> {
    interleaved
        .iter()
        .skip(index)
        .step_by(channels)
        .copied()
        .collect()
}

/// Runs the supplied delay estimator over every pair group of a topology and
/// resolves the estimates into a bearing.
pub struct DirectionFinder<E> {
    topology: ArrayTopology,
    sample_rate: u32,
    interp: usize,
    estimator: E,
}

impl<E: TdoaEstimator> DirectionFinder<E> {
    pub fn new(topology: ArrayTopology, sample_rate: u32, estimator: E) -> Self {
        Self {
            topology,
            sample_rate,
            interp: 1,
            estimator,
        }
    }

    pub fn with_interp(mut self, interp: usize) -> Self {
        self.interp = interp.max(1);
        self
    }

    pub fn topology(&self) -> ArrayTopology {
        self.topology
    }

    /// Estimate the bearing of the dominant source in an interleaved
    /// multi-channel buffer. `None` for topologies without enough pairs to
    /// disambiguate.
    pub fn estimate(&mut self, interleaved: &[i16]) -> Option<u16> {
        if self.topology == ArrayTopology::Pair2 {
            return None;
        }

        let channels = self.topology.channels() as usize;
        let max_tau = self.topology.max_tau();
        let groups = self.topology.pair_groups();

        let mut estimates = Vec::with_capacity(groups.len());
        for (group, pair) in groups.iter().enumerate() {
            let a = channel_samples(interleaved, channels, pair[0]);
            let b = channel_samples(interleaved, channels, pair[1]);
            let (tau, strength) =
                self.estimator
                    .estimate(&a, &b, self.sample_rate, max_tau, self.interp);
            tracing::trace!(group, tau, strength, "pair delay estimated");
            estimates.push(DelayEstimate { tau, group });
        }

        resolve_bearing(self.topology, &estimates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimates(taus: &[f64]) -> Vec<DelayEstimate> {
        taus.iter()
            .enumerate()
            .map(|(group, &tau)| DelayEstimate { tau, group })
            .collect()
    }

    #[test]
    fn square4_zero_delays_resolve_to_30_degrees() {
        let bearing = resolve_bearing(ArrayTopology::Square4, &estimates(&[0.0, 0.0]));
        assert_eq!(bearing, Some(30));
    }

    #[test]
    fn circular8_zero_delays_resolve_to_300_degrees() {
        let bearing = resolve_bearing(ArrayTopology::Circular8, &estimates(&[0.0, 0.0, 0.0]));
        assert_eq!(bearing, Some(300));
    }

    #[test]
    fn hex_resolves_like_circular8() {
        let max_tau = ArrayTopology::Circular8.max_tau();
        let taus = [0.3 * max_tau, -0.1 * max_tau, 0.6 * max_tau];
        assert_eq!(
            resolve_bearing(ArrayTopology::Hex6Plus1, &estimates(&taus)),
            resolve_bearing(ArrayTopology::Circular8, &estimates(&taus))
        );
    }

    #[test]
    fn pair2_yields_no_estimate() {
        assert_eq!(resolve_bearing(ArrayTopology::Pair2, &estimates(&[0.0])), None);
    }

    #[test]
    fn square4_bearing_stays_in_range_across_tau_sweep() {
        let max_tau = ArrayTopology::Square4.max_tau();
        for i in -10..=10 {
            for j in -10..=10 {
                let taus = [max_tau * i as f64 / 10.5, max_tau * j as f64 / 10.5];
                let bearing = resolve_bearing(ArrayTopology::Square4, &estimates(&taus))
                    .expect("square4 always resolves");
                assert!(bearing < 360, "bearing {bearing} for taus {taus:?}");
            }
        }
    }

    #[test]
    fn circular8_bearing_stays_in_range_across_tau_sweep() {
        let max_tau = ArrayTopology::Circular8.max_tau();
        for i in -6..=6 {
            for j in -6..=6 {
                for k in -6..=6 {
                    let taus = [
                        max_tau * i as f64 / 6.5,
                        max_tau * j as f64 / 6.5,
                        max_tau * k as f64 / 6.5,
                    ];
                    let bearing = resolve_bearing(ArrayTopology::Circular8, &estimates(&taus))
                        .expect("circular8 always resolves");
                    assert!(bearing < 360, "bearing {bearing} for taus {taus:?}");
                }
            }
        }
    }

    #[test]
    fn out_of_range_delays_are_clamped_not_rejected() {
        // Noise can push |tau| past max_tau; the arcsine argument is clamped.
        let max_tau = ArrayTopology::Square4.max_tau();
        let taus = [2.5 * max_tau, -3.0 * max_tau];
        let bearing = resolve_bearing(ArrayTopology::Square4, &estimates(&taus))
            .expect("clamped delays still resolve");
        assert!(bearing < 360);

        let max_tau = ArrayTopology::Circular8.max_tau();
        let taus = [-1.5 * max_tau, 4.0 * max_tau, 1.1 * max_tau];
        let bearing = resolve_bearing(ArrayTopology::Circular8, &estimates(&taus))
            .expect("clamped delays still resolve");
        assert!(bearing < 360);
    }

    #[test]
    fn identical_estimates_give_identical_bearings() {
        let max_tau = ArrayTopology::Circular8.max_tau();
        let taus = [0.4 * max_tau, -0.2 * max_tau, 0.7 * max_tau];
        let first = resolve_bearing(ArrayTopology::Circular8, &estimates(&taus));
        for _ in 0..32 {
            assert_eq!(resolve_bearing(ArrayTopology::Circular8, &estimates(&taus)), first);
        }
    }

    #[test]
    fn ties_in_min_delay_pick_the_first_group() {
        // All-equal |tau| must behave like the zero fixture: group 0 wins.
        let max_tau = ArrayTopology::Circular8.max_tau();
        let t = 0.2 * max_tau;
        let bearing = resolve_bearing(ArrayTopology::Circular8, &estimates(&[t, t, t])).unwrap();
        let theta = (t / max_tau).asin().to_degrees();
        // min_index = 0 and theta[2] >= 0 selects the back-half branch.
        let expected = ((180.0 - theta) + 120.0_f64).rem_euclid(360.0) as u16;
        assert_eq!(bearing, expected);
    }

    #[test]
    fn mismatched_estimate_count_yields_none() {
        assert_eq!(
            resolve_bearing(ArrayTopology::Circular8, &estimates(&[0.0, 0.0])),
            None
        );
    }

    #[test]
    fn channel_samples_strides_interleaved_buffers() {
        // Two frames of a 4-channel buffer.
        let interleaved = [10i16, 11, 12, 13, 20, 21, 22, 23];
        assert_eq!(channel_samples(&interleaved, 4, 0), vec![10, 20]);
        assert_eq!(channel_samples(&interleaved, 4, 3), vec![13, 23]);
    }

    struct FixedEstimator {
        taus: Vec<f64>,
        next: usize,
    }

    impl FixedEstimator {
        fn new(taus: &[f64]) -> Self {
            Self {
                taus: taus.to_vec(),
                next: 0,
            }
        }
    }

    impl TdoaEstimator for FixedEstimator {
        fn estimate(
            &mut self,
            _a: &[i16],
            _b: &[i16],
            _sample_rate: u32,
            _max_tau: f64,
            _interp: usize,
        ) -> (f64, f64) {
            let tau = self.taus[self.next % self.taus.len()];
            self.next += 1;
            (tau, 1.0)
        }
    }

    #[test]
    fn finder_runs_estimator_per_pair_group() {
        let mut finder = DirectionFinder::new(
            ArrayTopology::Square4,
            16_000,
            FixedEstimator::new(&[0.0, 0.0]),
        );
        let buffer = vec![0i16; 4 * 256];
        assert_eq!(finder.estimate(&buffer), Some(30));
    }

    #[test]
    fn finder_skips_estimation_for_pair2() {
        let mut finder = DirectionFinder::new(
            ArrayTopology::Pair2,
            16_000,
            FixedEstimator::new(&[0.0]),
        );
        let buffer = vec![0i16; 2 * 256];
        assert_eq!(finder.estimate(&buffer), None);
    }
}
