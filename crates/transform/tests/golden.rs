use approx::assert_abs_diff_eq;
use circoord_transform::{
    align_unwrap, normalize, normalize_orientation, shifted, value_range, SequenceError,
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

    fn next_f64_sym(&mut self) -> f64 {
        let x = self.next_u64() >> 11;
        let unit = (x as f64) / ((1u64 << 53) as f64);
        (2.0 * unit) - 1.0
    }

    fn next_int(&mut self, span: i64) -> i64 {
        (self.next_u64() % (2 * span as u64 + 1)) as i64 - span
    }
}

/// Random walk with steps in (-0.45, 0.45), together with its mod-1 reduction.
fn random_circular(rng: &mut SplitMix64, len: usize) -> (Vec<f64>, Vec<f64>) {
    let mut walk = Vec::with_capacity(len);
    let mut x = rng.next_f64_sym() * 3.0;
    for _ in 0..len {
        walk.push(x);
        x += 0.45 * rng.next_f64_sym();
    }
    let wrapped = walk.iter().map(|v| v.rem_euclid(1.0)).collect();
    (walk, wrapped)
}

fn assert_seq_close(a: &[f64], b: &[f64], eps: f64) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!(*x, *y, epsilon = eps);
    }
}

#[test]
fn g1_single_upward_wrap() {
    let out = align_unwrap(&[0.0, 0.3, 0.6, 0.9, 0.2]).expect("must unwrap");
    assert_seq_close(&out, &[0.0, 0.3, 0.6, 0.9, 1.2], 1e-12);
}

#[test]
fn g2_single_downward_wrap() {
    let out = align_unwrap(&[0.9, 0.1]).expect("must unwrap");
    assert_seq_close(&out, &[0.9, 1.1], 1e-12);
}

#[test]
fn g3_multi_turn_jump_is_fully_reduced() {
    let out = align_unwrap(&[0.2, 3.4, -1.7]).expect("must unwrap");
    assert_seq_close(&out, &[0.2, 0.4, 0.3], 1e-12);
}

#[test]
fn g4_orientation_reflects_decrements() {
    let out = normalize_orientation(&[5.0, 3.0, 1.0]).expect("must orient");
    assert_eq!(out, vec![5.0, 7.0, 9.0]);
}

#[test]
fn g5_length_one_is_noop() {
    assert_eq!(align_unwrap(&[0.7]).unwrap(), vec![0.7]);
    assert_eq!(normalize_orientation(&[0.7]).unwrap(), vec![0.7]);
    assert_eq!(normalize(&[0.7]).unwrap(), vec![0.7]);
}

#[test]
fn g6_empty_and_non_finite_rejected() {
    assert_eq!(normalize(&[]), Err(SequenceError::Empty));
    assert!(matches!(
        align_unwrap(&[0.1, 0.2, f64::NAN]),
        Err(SequenceError::NonFinite { index: 2, .. })
    ));
}

#[test]
fn unwrap_output_steps_stay_within_half_turn() {
    let mut rng = SplitMix64::new(7);
    for _ in 0..64 {
        let c: Vec<f64> = (0..40).map(|_| 4.0 * rng.next_f64_sym()).collect();
        let out = align_unwrap(&c).unwrap();
        assert_eq!(out[0], c[0]);
        for pair in out.windows(2) {
            let step = pair[1] - pair[0];
            assert!(step > -0.5 - 1e-12 && step <= 0.5 + 1e-12, "step={step}");
        }
        for (x, y) in out.iter().zip(c.iter()) {
            let k = x - y;
            assert_abs_diff_eq!(k, k.round(), epsilon = 1e-9);
        }
    }
}

#[test]
fn unwrap_recovers_walk_up_to_integer_offset() {
    let mut rng = SplitMix64::new(11);
    for _ in 0..32 {
        let (walk, wrapped) = random_circular(&mut rng, 50);
        let out = align_unwrap(&wrapped).unwrap();
        let offset = out[0] - walk[0];
        assert_abs_diff_eq!(offset, offset.round(), epsilon = 1e-9);
        assert_seq_close(&out, &shifted(&walk, offset), 1e-9);
    }
}

#[test]
fn normalize_is_mod_one_invariant_under_suffix_integers() {
    let mut rng = SplitMix64::new(23);
    for _ in 0..64 {
        let (_, c) = random_circular(&mut rng, 30);
        let start = 1 + (rng.next_u64() as usize) % (c.len() - 1);
        let k = rng.next_int(3) as f64;
        let mut perturbed = c.clone();
        for v in perturbed.iter_mut().skip(start) {
            *v += k;
        }
        assert_seq_close(&normalize(&c).unwrap(), &normalize(&perturbed).unwrap(), 1e-9);
    }
}

#[test]
fn normalize_is_idempotent() {
    let mut rng = SplitMix64::new(31);
    for _ in 0..64 {
        let (_, c) = random_circular(&mut rng, 25);
        let once = normalize(&c).unwrap();
        let twice = normalize(&once).unwrap();
        assert_seq_close(&once, &twice, 1e-12);
    }
}

#[test]
fn normalize_ends_at_or_above_start() {
    let mut rng = SplitMix64::new(43);
    for _ in 0..64 {
        let (_, c) = random_circular(&mut rng, 20);
        let out = normalize(&c).unwrap();
        assert!(out[out.len() - 1] >= out[0]);
    }
}

#[test]
fn normalize_commutes_with_constant_offset() {
    let c = [0.1, 0.45, 0.85, 0.15, 0.6];
    let base = normalize(&c).unwrap();
    let moved = normalize(&shifted(&c, 2.25)).unwrap();
    assert_seq_close(&moved, &shifted(&base, 2.25), 1e-12);
}

#[test]
fn value_range_reports_extremes() {
    let (lo, hi) = value_range(&[0.3, -1.5, 2.0, 0.0]).unwrap();
    assert_eq!(lo, -1.5);
    assert_eq!(hi, 2.0);
}
