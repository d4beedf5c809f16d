use approx::assert_abs_diff_eq;
use circoord_metric::{
    invariant_metric, invariant_metric_with, translation_invariant, translation_invariant_with,
    BaseMetricKind, DynamicTimeWarping, Euclidean, MeanAbsoluteError, SearchMode,
    ShiftSearchConfig,
};

#[derive(Clone, Copy)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    fn next_unit(&mut self) -> f64 {
        let x = self.next_u64() >> 11;
        (x as f64) / ((1u64 << 53) as f64)
    }

    fn next_f64_sym(&mut self) -> f64 {
        2.0 * self.next_unit() - 1.0
    }
}

/// Unwrapped walk drifting upward: steps in (-0.15, 0.45).
fn rising_walk(rng: &mut SplitMix64, len: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(len);
    let mut x = rng.next_f64_sym();
    for _ in 0..len {
        out.push(x);
        x += 0.15 + 0.3 * rng.next_f64_sym();
    }
    out
}

fn wrap(c: &[f64]) -> Vec<f64> {
    c.iter().map(|v| v.rem_euclid(1.0)).collect()
}

fn reflect(c: &[f64]) -> Vec<f64> {
    let mut out = vec![c[0]];
    for pair in c.windows(2) {
        let prev = out[out.len() - 1];
        out.push(prev - (pair[1] - pair[0]));
    }
    out
}

fn plus(c: &[f64], a: f64) -> Vec<f64> {
    c.iter().map(|v| v + a).collect()
}

#[test]
fn p1_inversion_invariance() {
    let mut rng = SplitMix64::new(101);
    let metric = invariant_metric(Euclidean);
    for _ in 0..32 {
        let c = rising_walk(&mut rng, 40);
        let flipped = reflect(&c);
        assert_abs_diff_eq!(metric.distance(&c, &flipped).unwrap(), 0.0, epsilon = 1e-9);
        let wrapped = metric.distance(&wrap(&c), &wrap(&flipped)).unwrap();
        assert_abs_diff_eq!(wrapped, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn p2_translation_invariance() {
    let mut rng = SplitMix64::new(202);
    for kind in [BaseMetricKind::Euclidean, BaseMetricKind::MeanAbsoluteError] {
        let metric = invariant_metric(kind);
        for _ in 0..16 {
            let c1 = wrap(&rising_walk(&mut rng, 30));
            let c2 = wrap(&rising_walk(&mut rng, 30));
            let a = 5.0 * rng.next_f64_sym();
            let b = 5.0 * rng.next_f64_sym();
            let base = metric.distance(&c1, &c2).unwrap();
            let moved = metric.distance(&plus(&c1, a), &plus(&c2, b)).unwrap();
            assert_abs_diff_eq!(base, moved, epsilon = 1e-6);
        }
    }
}

#[test]
fn p3_mod_one_invariance() {
    let mut rng = SplitMix64::new(303);
    let metric = invariant_metric(Euclidean);
    for _ in 0..32 {
        let walk1 = rising_walk(&mut rng, 25);
        let walk2 = rising_walk(&mut rng, 25);
        let start = 1 + (rng.next_u64() as usize) % 24;
        let mut rewrapped = walk1.clone();
        for v in rewrapped.iter_mut().skip(start) {
            *v -= 2.0;
        }
        let base = metric.distance(&walk1, &walk2).unwrap();
        let alt = metric.distance(&rewrapped, &wrap(&walk2)).unwrap();
        assert_abs_diff_eq!(base, alt, epsilon = 1e-6);
    }
}

#[test]
fn p4_euclidean_is_symmetric_under_swap() {
    let mut rng = SplitMix64::new(404);
    let metric = invariant_metric(Euclidean);
    for _ in 0..32 {
        let c1 = wrap(&rising_walk(&mut rng, 20));
        let c2 = wrap(&rising_walk(&mut rng, 20));
        let forward = metric.search(&c1, &c2).unwrap();
        let backward = metric.search(&c2, &c1).unwrap();
        assert_abs_diff_eq!(forward.distance, backward.distance, epsilon = 1e-6);
        assert_abs_diff_eq!(forward.shift, -backward.shift, epsilon = 1e-4);
    }
}

#[test]
fn p5_self_distance_is_zero() {
    let mut rng = SplitMix64::new(505);
    let metric = invariant_metric(MeanAbsoluteError);
    let c = wrap(&rising_walk(&mut rng, 50));
    assert_abs_diff_eq!(metric.distance(&c, &c).unwrap(), 0.0, epsilon = 1e-12);
}

#[test]
fn s1_mean_difference_finds_offset() {
    let mean_gap = |l: &[f64], r: &[f64]| -> Result<f64, String> {
        let ml = l.iter().sum::<f64>() / l.len() as f64;
        let mr = r.iter().sum::<f64>() / r.len() as f64;
        Ok((ml - mr).abs())
    };
    let metric = translation_invariant(mean_gap);
    let outcome = metric
        .search(&[0.0, 1.0, 2.0], &[10.0, 11.0, 12.0])
        .unwrap();
    assert_abs_diff_eq!(outcome.shift, -10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(outcome.distance, 0.0, epsilon = 1e-9);
}

#[test]
fn s2_bounded_search_respects_shift_range() {
    let c1 = [0.0, 0.0, 0.0, 10.0];
    let c2 = [0.0, 10.0, 10.0, 10.0];
    let bounded = translation_invariant(Euclidean).search(&c1, &c2).unwrap();
    assert_eq!(bounded.range.lower, 0.0);
    assert_eq!(bounded.range.upper, 0.0);
    assert_abs_diff_eq!(bounded.shift, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(bounded.distance, 200.0_f64.sqrt(), epsilon = 1e-9);
}

#[test]
fn s3_unbounded_search_may_leave_shift_range() {
    let c1 = [0.0, 0.0, 0.0, 10.0];
    let c2 = [0.0, 10.0, 10.0, 10.0];
    let config = ShiftSearchConfig {
        mode: SearchMode::Unbounded,
        ..ShiftSearchConfig::default()
    };
    let unbounded = translation_invariant_with(Euclidean, config)
        .unwrap()
        .search(&c1, &c2)
        .unwrap();
    assert!(unbounded.converged);
    assert_abs_diff_eq!(unbounded.shift, -5.0, epsilon = 1e-5);
    assert_abs_diff_eq!(unbounded.distance, 10.0, epsilon = 1e-6);
}

#[test]
fn s4_bounded_interior_optimum() {
    let c1 = [0.0, 0.4, 0.8, 1.2];
    let c2 = [0.0, 0.5, 0.7, 1.5];
    let outcome = translation_invariant(Euclidean).search(&c1, &c2).unwrap();
    // Optimal L2 shift is the mean difference, here -0.075.
    assert!(outcome.converged);
    assert_abs_diff_eq!(outcome.shift, -0.075, epsilon = 1e-6);
}

#[test]
fn dtw_compares_resampled_sequences() {
    let mut rng = SplitMix64::new(606);
    let walk = rising_walk(&mut rng, 20);
    let stretched: Vec<f64> = walk.iter().flat_map(|v| [v + 0.3, v + 0.3]).collect();
    let metric = invariant_metric(DynamicTimeWarping);
    let d = metric.distance(&wrap(&walk), &wrap(&stretched)).unwrap();
    assert_abs_diff_eq!(d, 0.0, epsilon = 1e-9);
}

#[test]
fn as_fn_matches_distance() {
    let config = ShiftSearchConfig {
        x_tolerance: 1e-10,
        ..ShiftSearchConfig::default()
    };
    let metric = invariant_metric_with(Euclidean, config).unwrap();
    let c1 = [0.1, 0.3, 0.6, 0.95, 0.2];
    let c2 = [0.5, 0.45, 0.2, 0.9, 0.7];
    let f = metric.as_fn();
    assert_eq!(f(&c1[..], &c2[..]).unwrap(), metric.distance(&c1, &c2).unwrap());
}

#[test]
fn large_offsets_keep_search_precision() {
    let c1 = [0.05, 0.21, 0.38, 0.62, 0.81, 0.97, 0.12];
    let c2 = [0.44, 0.58, 0.79, 0.03, 0.25, 0.41];
    let (a, b) = (123.456, -77.7);

    let dtw = invariant_metric(DynamicTimeWarping);
    let near = dtw.search(&c1, &c2).unwrap();
    let far = dtw.search(&plus(&c1, a), &plus(&c2, b)).unwrap();
    assert!(far.shift.abs() > 150.0);
    assert_abs_diff_eq!(near.distance, far.distance, epsilon = 5e-7);

    let l2 = invariant_metric(Euclidean);
    let near = l2.search(&c1[..6], &c2).unwrap();
    let far = l2.search(&plus(&c1[..6], a), &plus(&c2, b)).unwrap();
    assert_abs_diff_eq!(near.distance, far.distance, epsilon = 1e-9);
    assert_abs_diff_eq!(far.shift - near.shift, a - b, epsilon = 1e-6);
}
