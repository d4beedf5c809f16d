use crate::{validate_sequence, SequenceError};

/// Flips the traversal direction when the sequence ends below where it
/// started. The first sample is anchored and every step changes sign, so
/// the output always satisfies `out[n-1] >= out[0]`.
pub fn normalize_orientation(c: &[f64]) -> Result<Vec<f64>, SequenceError> {
    validate_sequence(c)?;

    let first = c[0];
    let last = c[c.len() - 1];
    if first <= last {
        return Ok(c.to_vec());
    }

    let mut out = Vec::with_capacity(c.len());
    out.push(first);
    for pair in c.windows(2) {
        let prev = out[out.len() - 1];
        out.push(prev + (pair[0] - pair[1]));
    }
    Ok(out)
}
