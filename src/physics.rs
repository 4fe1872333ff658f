//! Pure physics models for neutral-atom transport and error correction.
//!
//! Every function here is total, deterministic, and free of I/O: given the
//! same inputs they always return the same outputs. Stochastic behavior
//! (jitter, Bernoulli loss) lives one layer up, in [`crate::simulator`],
//! which injects a seeded random stream rather than reading ambient entropy.

/// Maximum safe AOD transport velocity, in µm/µs.
pub const MAX_AOD_VELOCITY: f64 = 0.55;

/// Vibrational quantum number above which an atom is considered critically hot.
pub const CRITICAL_N_VIB: f64 = 18.0;

/// Vibrational quantum number above which fidelity-loss warnings begin.
pub const FIDELITY_WARN_N_VIB: f64 = 10.0;

/// Base syndrome-decoder capacity `C₀` at zero code distance.
pub const DECODER_BASE_CAPACITY: f64 = 10.0;

/// Exponential decay rate `α` of decoder capacity with code distance.
pub const DECODER_DECAY_ALPHA: f64 = 0.4;

/// Default heating coefficient `k` used by [`heating_increment`].
///
/// Empirical; an implementer may want to expose this as a device-profile
/// parameter rather than rely on the default.
pub const DEFAULT_HEATING_K: f64 = 0.01;

/// Default fidelity-loss coefficient `α` used by [`fidelity_loss`].
pub const DEFAULT_FIDELITY_ALPHA: f64 = 0.008;

/// Default atom-loss threshold used by [`loss_probability`].
pub const DEFAULT_LOSS_THRESHOLD: f64 = 18.0;

/// Default atom-loss base rate used by [`loss_probability`].
pub const DEFAULT_LOSS_BASE: f64 = 0.001;

/// Default atom-loss factor used by [`loss_probability`].
pub const DEFAULT_LOSS_FACTOR: f64 = 0.005;

/// Vibrational-number increment from transporting an atom `distance_um` at
/// `velocity_um_per_us`, under heating coefficient `k`.
///
/// Non-negative, and monotone non-decreasing in both `distance_um` and
/// `velocity_um_per_us` for non-negative inputs.
#[must_use]
#[inline]
pub fn heating_increment(distance_um: f64, velocity_um_per_us: f64, k: f64) -> f64 {
    k * distance_um * velocity_um_per_us
}

/// [`heating_increment`] at the default coefficient [`DEFAULT_HEATING_K`].
#[must_use]
#[inline]
pub fn heating_increment_default(distance_um: f64, velocity_um_per_us: f64) -> f64 {
    heating_increment(distance_um, velocity_um_per_us, DEFAULT_HEATING_K)
}

/// Estimated gate-fidelity loss from vibrational heating, saturating at 1.
///
/// Monotone non-decreasing in `n_vib`, bounded to `[0, 1]`.
#[must_use]
#[inline]
pub fn fidelity_loss(n_vib: f64, alpha: f64) -> f64 {
    (alpha * n_vib).min(1.0)
}

/// [`fidelity_loss`] at the default coefficient [`DEFAULT_FIDELITY_ALPHA`].
#[must_use]
#[inline]
pub fn fidelity_loss_default(n_vib: f64) -> f64 {
    fidelity_loss(n_vib, DEFAULT_FIDELITY_ALPHA)
}

/// Probability an atom is lost this cycle given its vibrational state.
///
/// Below `threshold` only the `base` rate applies; above it, loss probability
/// grows linearly with `factor` per unit of excess heating, capped at 1.
#[must_use]
#[inline]
pub fn loss_probability(n_vib: f64, threshold: f64, base: f64, factor: f64) -> f64 {
    let excess = (n_vib - threshold).max(0.0);
    (base + factor * excess).min(1.0)
}

/// [`loss_probability`] at the spec's default threshold/base/factor.
#[must_use]
#[inline]
pub fn loss_probability_default(n_vib: f64) -> f64 {
    loss_probability(
        n_vib,
        DEFAULT_LOSS_THRESHOLD,
        DEFAULT_LOSS_BASE,
        DEFAULT_LOSS_FACTOR,
    )
}

/// Result of advancing the syndrome-decoder queue by one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderState {
    /// Updated queue length `Q` after this cycle's arrivals and service.
    pub queue: f64,
    /// Reported decoder backlog, in milliseconds.
    pub latency_ms: f64,
}

/// Advance the syndrome-decoder queue by one cycle and report its backlog.
///
/// `code_distance` sets the decoder's per-cycle capacity via exponential
/// decay from [`DECODER_BASE_CAPACITY`] at rate [`DECODER_DECAY_ALPHA`];
/// `jitter` (expected in `[0.9, 1.1]`) models measurement-to-measurement
/// capacity variance and must come from a seeded source for determinism.
/// `window_ms` is the cycle's reorder-latency window (`T_cycle` in the
/// simulator).
#[must_use]
pub fn decoder_latency(code_distance: u32, queue: f64, jitter: f64, window_ms: f64) -> DecoderState {
    let capacity = DECODER_BASE_CAPACITY * (-DECODER_DECAY_ALPHA * code_distance as f64).exp() * jitter;
    let next_queue = (queue + 1.0 - capacity).max(0.0);
    let latency_ms = if next_queue > 0.0 {
        (next_queue * window_ms) / capacity
    } else {
        window_ms / capacity
    };
    DecoderState {
        queue: next_queue,
        latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heating_increment_matches_known_value() {
        // 10 µm at 0.5 µm/µs, k=0.01 -> 0.05
        let delta = heating_increment_default(10.0, 0.5);
        assert!((delta - 0.05).abs() < 1e-9);
    }

    #[test]
    fn heating_increment_monotone_in_distance_and_velocity() {
        let short = heating_increment_default(5.0, 0.3);
        let long = heating_increment_default(20.0, 0.3);
        assert!(long > short);

        let slow = heating_increment_default(10.0, 0.1);
        let fast = heating_increment_default(10.0, 0.5);
        assert!(fast > slow);
    }

    #[test]
    fn heating_increment_never_negative() {
        for d in [0.0, 1.0, 500.0] {
            for v in [0.0, 0.1, 10.0] {
                assert!(heating_increment_default(d, v) >= 0.0);
            }
        }
    }

    #[test]
    fn fidelity_loss_matches_known_values() {
        assert!((fidelity_loss_default(5.0) - 0.04).abs() < 1e-9);
        assert!((fidelity_loss_default(20.0) - 0.16).abs() < 1e-9);
    }

    #[test]
    fn fidelity_loss_saturates_at_one() {
        assert_eq!(fidelity_loss_default(200.0), 1.0);
    }

    #[test]
    fn fidelity_loss_in_unit_interval() {
        for n in [0.0, 1.0, 18.0, 1000.0] {
            let f = fidelity_loss_default(n);
            assert!((0.0..=1.0).contains(&f));
        }
    }

    #[test]
    fn loss_probability_base_rate_below_threshold() {
        let p = loss_probability_default(10.0);
        assert!((p - 0.001).abs() < 1e-9);
    }

    #[test]
    fn loss_probability_matches_known_formula() {
        // n_vib=25, threshold=18, excess=7 -> 0.001 + 0.005*7 = 0.036
        let p = loss_probability_default(25.0);
        assert!((p - 0.036).abs() < 1e-9);
    }

    #[test]
    fn loss_probability_caps_at_one() {
        assert_eq!(loss_probability_default(10_000.0), 1.0);
    }

    #[test]
    fn loss_probability_in_unit_interval() {
        for n in [-5.0, 0.0, 18.0, 500.0] {
            let p = loss_probability_default(n);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn decoder_latency_empty_queue_uses_window_over_capacity() {
        let st = decoder_latency(3, 0.0, 1.0, 20.0);
        let capacity = DECODER_BASE_CAPACITY * (-DECODER_DECAY_ALPHA * 3.0_f64).exp();
        assert!((st.latency_ms - 20.0 / capacity).abs() < 1e-9);
    }

    #[test]
    fn decoder_latency_queue_grows_when_arrivals_exceed_capacity() {
        // Large code distance starves capacity, queue should grow cycle over cycle.
        let mut q = 0.0;
        for _ in 0..5 {
            let st = decoder_latency(7, q, 1.0, 20.0);
            assert!(st.queue >= q);
            q = st.queue;
        }
        assert!(q > 0.0);
    }

    #[test]
    fn decoder_latency_never_negative_queue() {
        let st = decoder_latency(0, 0.0, 1.1, 20.0);
        assert!(st.queue >= 0.0);
    }
}
