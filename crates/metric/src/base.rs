use serde::{Deserialize, Serialize};

/// Distance between two sequences, wrapped by [`crate::translation_invariant`]
/// and [`crate::invariant_metric`].
///
/// Implementations must be deterministic. A base metric may reject its
/// inputs (for example on a length mismatch) by returning a message.
pub trait BaseMetric {
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, String>;
}

impl<F> BaseMetric for F
where
    F: Fn(&[f64], &[f64]) -> Result<f64, String>,
{
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, String> {
        self(left, right)
    }
}

fn require_same_len(left: &[f64], right: &[f64]) -> Result<(), String> {
    if left.len() != right.len() {
        return Err(format!(
            "sequence length mismatch: {} vs {}",
            left.len(),
            right.len()
        ));
    }
    Ok(())
}

fn mean(values: &[f64]) -> Result<f64, String> {
    if values.is_empty() {
        return Err("mean of empty sequence".to_string());
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Euclidean;

impl BaseMetric for Euclidean {
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, String> {
        require_same_len(left, right)?;
        let sum_sq = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| (l - r) * (l - r))
            .sum::<f64>();
        Ok(sum_sq.sqrt())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeanAbsoluteError;

impl BaseMetric for MeanAbsoluteError {
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, String> {
        require_same_len(left, right)?;
        let diffs: Vec<f64> = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| (l - r).abs())
            .collect();
        mean(&diffs)
    }
}

/// Absolute difference of the two sequence means. Lengths may differ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeanDifference;

impl BaseMetric for MeanDifference {
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, String> {
        Ok((mean(left)? - mean(right)?).abs())
    }
}

/// Dynamic time warping with absolute-difference step cost. Lengths may differ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DynamicTimeWarping;

impl BaseMetric for DynamicTimeWarping {
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, String> {
        if left.is_empty() || right.is_empty() {
            return Err("dynamic time warping needs non-empty sequences".to_string());
        }
        let m = right.len();
        let mut prev = vec![f64::INFINITY; m + 1];
        let mut curr = vec![f64::INFINITY; m + 1];
        prev[0] = 0.0;
        for l in left {
            curr[0] = f64::INFINITY;
            for j in 1..=m {
                let cost = (l - right[j - 1]).abs();
                let best = prev[j].min(curr[j - 1]).min(prev[j - 1]);
                curr[j] = cost + best;
            }
            std::mem::swap(&mut prev, &mut curr);
        }
        Ok(prev[m])
    }
}

/// Built-in base metrics selectable by name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseMetricKind {
    #[default]
    Euclidean,
    MeanAbsoluteError,
    MeanDifference,
    DynamicTimeWarping,
}

impl BaseMetricKind {
    pub fn id(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::MeanAbsoluteError => "mean_absolute_error",
            Self::MeanDifference => "mean_difference",
            Self::DynamicTimeWarping => "dynamic_time_warping",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        [
            Self::Euclidean,
            Self::MeanAbsoluteError,
            Self::MeanDifference,
            Self::DynamicTimeWarping,
        ]
        .into_iter()
        .find(|kind| kind.id() == id)
    }
}

impl BaseMetric for BaseMetricKind {
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, String> {
        match self {
            Self::Euclidean => Euclidean.distance(left, right),
            Self::MeanAbsoluteError => MeanAbsoluteError.distance(left, right),
            Self::MeanDifference => MeanDifference.distance(left, right),
            Self::DynamicTimeWarping => DynamicTimeWarping.distance(left, right),
        }
    }
}
