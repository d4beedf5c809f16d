use crate::{validate_sequence, SequenceError, HALF_TURN};

/// Integer `k` such that `jump - k` lies in `(-0.5, 0.5]`.
#[inline]
fn wrap_count(jump: f64) -> f64 {
    (jump - HALF_TURN).ceil()
}

/// Removes the mod-1 ambiguity of a circular coordinate sequence.
///
/// The first sample is kept as is. Every later sample is moved by an integer
/// so that its step from the previous output lies in `(-0.5, 0.5]`. The
/// offsets accumulate left to right, so a wrap at index `i` carries over to
/// every sample after it.
pub fn align_unwrap(c: &[f64]) -> Result<Vec<f64>, SequenceError> {
    validate_sequence(c)?;

    let mut out = Vec::with_capacity(c.len());
    out.push(c[0]);
    let mut offset = 0.0;
    for pair in c.windows(2) {
        let prev = out[out.len() - 1];
        let jump = (pair[1] + offset) - prev;
        offset -= wrap_count(jump);
        out.push(pair[1] + offset);
    }
    Ok(out)
}
