use crate::search::{bracket, minimize_bounded, Minimum};
use crate::{BaseMetric, SearchMode, ShiftSearchConfig};
use circoord_transform::{normalize, shifted, validate_sequence, value_range, SequenceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

const BRACKET_MAX_ITERATIONS: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceRole {
    Left,
    Right,
}

impl fmt::Display for SequenceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MetricError {
    InvalidSequence {
        role: SequenceRole,
        source: SequenceError,
    },
    BaseMetric {
        shift: f64,
        message: String,
    },
    NonFiniteDistance {
        shift: f64,
        value: f64,
    },
    NonConvergence {
        iterations: usize,
        best_shift: f64,
        best_distance: f64,
    },
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSequence { role, source } => {
                write!(f, "{} sequence rejected: {}", role, source)
            }
            Self::BaseMetric { shift, message } => {
                write!(f, "base metric failed at shift {}: {}", shift, message)
            }
            Self::NonFiniteDistance { shift, value } => write!(
                f,
                "base metric returned non-finite distance {} at shift {}",
                value, shift
            ),
            Self::NonConvergence {
                iterations,
                best_shift,
                best_distance,
            } => write!(
                f,
                "shift search did not converge after {} iterations (best shift {}, distance {})",
                iterations, best_shift, best_distance
            ),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid shift search config `{}`: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for MetricError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSequence { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn check(role: SequenceRole, c: &[f64]) -> Result<(), MetricError> {
    validate_sequence(c).map_err(|source| MetricError::InvalidSequence { role, source })
}

/// Candidate shifts `a` for comparing `c1` against `c2 + a`.
///
/// Built from `min(c1) - min(c2)` and `max(c1) - max(c2)`; the two values are
/// ordered, so `lower <= upper` even when `c2` spans the wider range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftRange {
    pub lower: f64,
    pub upper: f64,
}

impl ShiftRange {
    pub fn between(c1: &[f64], c2: &[f64]) -> Result<Self, MetricError> {
        let (min1, max1) = value_range(c1).map_err(|source| MetricError::InvalidSequence {
            role: SequenceRole::Left,
            source,
        })?;
        let (min2, max2) = value_range(c2).map_err(|source| MetricError::InvalidSequence {
            role: SequenceRole::Right,
            source,
        })?;
        let from_min = min1 - min2;
        let from_max = max1 - max2;
        Ok(Self {
            lower: from_min.min(from_max),
            upper: from_min.max(from_max),
        })
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShiftSearchOutcome {
    pub distance: f64,
    pub shift: f64,
    pub range: ShiftRange,
    pub evaluations: usize,
    pub iterations: usize,
    pub converged: bool,
}

/// Base metric minimized over additive shifts of its second argument.
#[derive(Clone, Debug)]
pub struct TranslationInvariant<D> {
    metric: D,
    config: ShiftSearchConfig,
}

pub fn translation_invariant<D: BaseMetric>(metric: D) -> TranslationInvariant<D> {
    TranslationInvariant {
        metric,
        config: ShiftSearchConfig::default(),
    }
}

pub fn translation_invariant_with<D: BaseMetric>(
    metric: D,
    config: ShiftSearchConfig,
) -> Result<TranslationInvariant<D>, MetricError> {
    config.validate()?;
    Ok(TranslationInvariant { metric, config })
}

impl<D: BaseMetric> TranslationInvariant<D> {
    pub fn config(&self) -> &ShiftSearchConfig {
        &self.config
    }

    pub fn base(&self) -> &D {
        &self.metric
    }

    pub fn distance(&self, c1: &[f64], c2: &[f64]) -> Result<f64, MetricError> {
        self.search(c1, c2).map(|outcome| outcome.distance)
    }

    pub fn as_fn(&self) -> impl Fn(&[f64], &[f64]) -> Result<f64, MetricError> + '_ {
        move |c1: &[f64], c2: &[f64]| self.distance(c1, c2)
    }

    pub fn search(&self, c1: &[f64], c2: &[f64]) -> Result<ShiftSearchOutcome, MetricError> {
        check(SequenceRole::Left, c1)?;
        check(SequenceRole::Right, c2)?;
        let range = ShiftRange::between(c1, c2)?;

        let mut evaluate = |shift: f64| -> Result<f64, MetricError> {
            let moved = shifted(c2, shift);
            let value = self
                .metric
                .distance(c1, &moved)
                .map_err(|message| MetricError::BaseMetric { shift, message })?;
            if !value.is_finite() {
                return Err(MetricError::NonFiniteDistance { shift, value });
            }
            Ok(value)
        };

        let minimum = match self.config.mode {
            SearchMode::Bounded => self.search_bounded(&mut evaluate, range)?,
            SearchMode::Unbounded => self.search_unbounded(&mut evaluate, range)?,
        };

        let outcome = ShiftSearchOutcome {
            distance: minimum.fx,
            shift: minimum.x,
            range,
            evaluations: minimum.evaluations,
            iterations: minimum.iterations,
            converged: minimum.converged,
        };
        debug!(
            mode = self.config.mode.id(),
            lower = range.lower,
            upper = range.upper,
            shift = outcome.shift,
            distance = outcome.distance,
            evaluations = outcome.evaluations,
            "shift search finished"
        );

        if !outcome.converged {
            warn!(
                iterations = outcome.iterations,
                shift = outcome.shift,
                distance = outcome.distance,
                "shift search hit its iteration limit"
            );
            if self.config.require_convergence {
                return Err(MetricError::NonConvergence {
                    iterations: outcome.iterations,
                    best_shift: outcome.shift,
                    best_distance: outcome.distance,
                });
            }
        }
        Ok(outcome)
    }

    fn search_bounded<F>(&self, evaluate: &mut F, range: ShiftRange) -> Result<Minimum, MetricError>
    where
        F: FnMut(f64) -> Result<f64, MetricError>,
    {
        if range.width() <= self.config.x_tolerance {
            let x = range.midpoint();
            return Ok(Minimum {
                x,
                fx: evaluate(x)?,
                evaluations: 1,
                iterations: 0,
                converged: true,
            });
        }

        // Solve in offsets from the lower bound so the tolerance does not
        // scale with the absolute shift.
        let origin = range.lower;
        let mut best = minimize_bounded(
            |t: f64| evaluate(origin + t),
            0.0,
            range.width(),
            self.config.x_tolerance,
            self.config.max_iterations,
        )?;
        best.x += origin;
        if self.config.evaluate_endpoints {
            for x in [range.lower, range.upper] {
                let fx = evaluate(x)?;
                best.evaluations += 1;
                if fx < best.fx {
                    best.x = x;
                    best.fx = fx;
                }
            }
        }
        Ok(best)
    }

    fn search_unbounded<F>(
        &self,
        evaluate: &mut F,
        range: ShiftRange,
    ) -> Result<Minimum, MetricError>
    where
        F: FnMut(f64) -> Result<f64, MetricError>,
    {
        let origin = range.lower;
        let step = if range.width() > self.config.x_tolerance {
            range.width()
        } else {
            1.0
        };
        let mut at = |t: f64| evaluate(origin + t);
        let enclosing = bracket(&mut at, 0.0, step, BRACKET_MAX_ITERATIONS)?;
        if !enclosing.found {
            return Ok(Minimum {
                x: origin + enclosing.best_x,
                fx: enclosing.best_fx,
                evaluations: enclosing.evaluations,
                iterations: BRACKET_MAX_ITERATIONS,
                converged: false,
            });
        }

        let mut best = minimize_bounded(
            &mut at,
            enclosing.lo,
            enclosing.hi,
            self.config.x_tolerance,
            self.config.max_iterations,
        )?;
        best.evaluations += enclosing.evaluations;
        if enclosing.best_fx < best.fx {
            best.x = enclosing.best_x;
            best.fx = enclosing.best_fx;
        }
        best.x += origin;
        Ok(best)
    }
}

/// Base metric made invariant to unwrap choice, traversal direction and
/// additive offsets: both inputs are normalized, then compared through
/// [`TranslationInvariant`].
#[derive(Clone, Debug)]
pub struct InvariantMetric<D> {
    inner: TranslationInvariant<D>,
}

pub fn invariant_metric<D: BaseMetric>(metric: D) -> InvariantMetric<D> {
    InvariantMetric {
        inner: translation_invariant(metric),
    }
}

pub fn invariant_metric_with<D: BaseMetric>(
    metric: D,
    config: ShiftSearchConfig,
) -> Result<InvariantMetric<D>, MetricError> {
    Ok(InvariantMetric {
        inner: translation_invariant_with(metric, config)?,
    })
}

impl<D: BaseMetric> InvariantMetric<D> {
    pub fn config(&self) -> &ShiftSearchConfig {
        self.inner.config()
    }

    pub fn normalized_pair(
        &self,
        c1: &[f64],
        c2: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>), MetricError> {
        let left = normalize(c1).map_err(|source| MetricError::InvalidSequence {
            role: SequenceRole::Left,
            source,
        })?;
        let right = normalize(c2).map_err(|source| MetricError::InvalidSequence {
            role: SequenceRole::Right,
            source,
        })?;
        Ok((left, right))
    }

    pub fn search(&self, c1: &[f64], c2: &[f64]) -> Result<ShiftSearchOutcome, MetricError> {
        let (left, right) = self.normalized_pair(c1, c2)?;
        self.inner.search(&left, &right)
    }

    pub fn distance(&self, c1: &[f64], c2: &[f64]) -> Result<f64, MetricError> {
        self.search(c1, c2).map(|outcome| outcome.distance)
    }

    pub fn as_fn(&self) -> impl Fn(&[f64], &[f64]) -> Result<f64, MetricError> + '_ {
        move |c1: &[f64], c2: &[f64]| self.distance(c1, c2)
    }
}
