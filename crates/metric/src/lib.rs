//! Invariant distances between circular coordinate sequences.
//!
//! Circular coordinates are only meaningful modulo 1, have no preferred
//! traversal direction and no preferred origin. [`invariant_metric`] wraps any
//! [`BaseMetric`] so that all three freedoms are factored out before the
//! comparison: both inputs are unwrap-aligned and oriented (see
//! `circoord_transform::normalize`), then the base metric is minimized over
//! additive shifts of the second sequence.
//!
//! The wrapped distance keeps determinism but not the metric axioms of the
//! base metric; the shift minimization can break the triangle inequality.

mod base;
mod config;
mod invariant;
mod search;

pub use base::{
    BaseMetric, BaseMetricKind, DynamicTimeWarping, Euclidean, MeanAbsoluteError, MeanDifference,
};
pub use config::{blake3_hex, config_hash, jcs_bytes, SearchMode, ShiftSearchConfig};
pub use invariant::{
    invariant_metric, invariant_metric_with, translation_invariant, translation_invariant_with,
    InvariantMetric, MetricError, SequenceRole, ShiftRange, ShiftSearchOutcome,
    TranslationInvariant,
};
