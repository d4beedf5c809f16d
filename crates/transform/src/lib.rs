mod orientation;
mod unwrap;

pub use orientation::normalize_orientation;
pub use unwrap::align_unwrap;

use std::fmt;

/// Largest consecutive jump left in place by [`align_unwrap`].
pub const HALF_TURN: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SequenceError {
    Empty,
    NonFinite { index: usize, value: f64 },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "sequence is empty"),
            Self::NonFinite { index, value } => {
                write!(f, "non-finite value {} at index {}", value, index)
            }
        }
    }
}

impl std::error::Error for SequenceError {}

/// Rejects empty sequences and sequences holding NaN or infinities.
pub fn validate_sequence(c: &[f64]) -> Result<(), SequenceError> {
    if c.is_empty() {
        return Err(SequenceError::Empty);
    }
    if let Some((index, value)) = c.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(SequenceError::NonFinite {
            index,
            value: *value,
        });
    }
    Ok(())
}

/// Unwrap-align, then orient: `normalize_orientation(align_unwrap(c))`.
pub fn normalize(c: &[f64]) -> Result<Vec<f64>, SequenceError> {
    let aligned = align_unwrap(c)?;
    normalize_orientation(&aligned)
}

/// Adds `shift` to every element.
pub fn shifted(c: &[f64], shift: f64) -> Vec<f64> {
    c.iter().map(|v| v + shift).collect()
}

/// `(min, max)` of a non-empty finite sequence.
pub fn value_range(c: &[f64]) -> Result<(f64, f64), SequenceError> {
    validate_sequence(c)?;
    let (lo, hi) = c
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    Ok((lo, hi))
}
