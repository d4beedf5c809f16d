//! Invariant comparison of circular coordinate sequences.
//!
//! Re-exports the sequence transforms from `circoord-transform` and the
//! metric wrappers from `circoord-metric`, plus a few one-call helpers used
//! by the command-line tool and the Python bindings.

pub use circoord_metric::{
    blake3_hex, config_hash, invariant_metric, invariant_metric_with, jcs_bytes,
    translation_invariant, translation_invariant_with, BaseMetric, BaseMetricKind,
    DynamicTimeWarping, Euclidean, InvariantMetric, MeanAbsoluteError, MeanDifference,
    MetricError, SearchMode, SequenceRole, ShiftRange, ShiftSearchConfig, ShiftSearchOutcome,
    TranslationInvariant,
};
pub use circoord_transform::{
    align_unwrap, normalize, normalize_orientation, validate_sequence, SequenceError, HALF_TURN,
};

#[cfg(feature = "python")]
mod python;

/// Which transform stages a sequence goes through before comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    Unwrap,
    Orient,
    #[default]
    Full,
}

pub fn apply_stage(stage: Stage, c: &[f64]) -> Result<Vec<f64>, SequenceError> {
    match stage {
        Stage::Unwrap => align_unwrap(c),
        Stage::Orient => normalize_orientation(c),
        Stage::Full => normalize(c),
    }
}

/// Full invariant comparison (normalize both, then shift search).
pub fn invariant_search<D: BaseMetric>(
    metric: D,
    c1: &[f64],
    c2: &[f64],
    config: ShiftSearchConfig,
) -> Result<ShiftSearchOutcome, MetricError> {
    invariant_metric_with(metric, config)?.search(c1, c2)
}

/// Shift search only; inputs are compared as given.
pub fn translation_search<D: BaseMetric>(
    metric: D,
    c1: &[f64],
    c2: &[f64],
    config: ShiftSearchConfig,
) -> Result<ShiftSearchOutcome, MetricError> {
    translation_invariant_with(metric, config)?.search(c1, c2)
}
