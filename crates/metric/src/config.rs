use crate::MetricError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Shift restricted to `[min(c1) - min(c2), max(c1) - max(c2)]`.
    #[default]
    Bounded,
    /// Shift range only seeds a downhill bracket; the optimum may fall outside.
    Unbounded,
}

impl SearchMode {
    pub fn id(self) -> &'static str {
        match self {
            Self::Bounded => "bounded",
            Self::Unbounded => "unbounded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShiftSearchConfig {
    pub mode: SearchMode,
    pub x_tolerance: f64,
    pub max_iterations: usize,
    pub evaluate_endpoints: bool,
    pub require_convergence: bool,
}

impl Default for ShiftSearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Bounded,
            x_tolerance: 1e-8,
            max_iterations: 500,
            evaluate_endpoints: true,
            require_convergence: false,
        }
    }
}

impl ShiftSearchConfig {
    pub fn validate(&self) -> Result<(), MetricError> {
        if !self.x_tolerance.is_finite() || self.x_tolerance <= 0.0 {
            return Err(MetricError::InvalidConfig {
                field: "x_tolerance",
                reason: format!("must be finite and > 0, got {}", self.x_tolerance),
            });
        }
        if self.max_iterations == 0 {
            return Err(MetricError::InvalidConfig {
                field: "max_iterations",
                reason: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

pub fn jcs_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_jcs::to_vec(value)
}

pub fn blake3_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Stable fingerprint of the solver settings, reported alongside results.
pub fn config_hash(config: &ShiftSearchConfig) -> Result<String, serde_json::Error> {
    Ok(blake3_hex(&jcs_bytes(config)?))
}
