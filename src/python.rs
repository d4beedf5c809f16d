#![cfg(feature = "python")]

#[cfg(feature = "numpy-support")]
use numpy::PyReadonlyArray1;
use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::marker::PhantomData;

use crate::{
    invariant_search, translation_search, BaseMetric, BaseMetricKind, MetricError, SearchMode,
    SequenceError, ShiftSearchConfig, ShiftSearchOutcome,
};

enum DataView<'a> {
    Owned(Vec<f64>, PhantomData<&'a ()>),
    #[cfg(feature = "numpy-support")]
    Numpy(PyReadonlyArray1<'a, f64>),
}

impl<'a> DataView<'a> {
    fn as_slice(&self) -> PyResult<&[f64]> {
        match self {
            DataView::Owned(v, _) => Ok(v.as_slice()),
            #[cfg(feature = "numpy-support")]
            DataView::Numpy(array) => array
                .as_slice()
                .map_err(|err| PyValueError::new_err(err.to_string())),
        }
    }
}

fn extract_view<'py>(obj: &Bound<'py, PyAny>) -> PyResult<DataView<'py>> {
    #[cfg(feature = "numpy-support")]
    {
        if let Ok(array) = obj.extract::<PyReadonlyArray1<'py, f64>>() {
            if array.as_slice().is_ok() {
                return Ok(DataView::Numpy(array));
            }
        }
    }

    let owned = obj.extract::<Vec<f64>>()?;
    Ok(DataView::Owned(owned, PhantomData))
}

fn sequence_err(err: SequenceError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn metric_err(err: MetricError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Python callable used as a base metric; called as `base(left, right)`.
struct PyMetric<'a, 'py>(&'a Bound<'py, PyAny>);

impl BaseMetric for PyMetric<'_, '_> {
    fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64, String> {
        self.0
            .call1((left.to_vec(), right.to_vec()))
            .and_then(|value| value.extract::<f64>())
            .map_err(|err| err.to_string())
    }
}

enum BaseChoice<'py> {
    Named(BaseMetricKind),
    Callable(Bound<'py, PyAny>),
}

fn resolve_base<'py>(base: Option<&Bound<'py, PyAny>>) -> PyResult<BaseChoice<'py>> {
    let Some(obj) = base else {
        return Ok(BaseChoice::Named(BaseMetricKind::Euclidean));
    };
    if let Ok(name) = obj.extract::<String>() {
        return BaseMetricKind::from_id(&name)
            .map(BaseChoice::Named)
            .ok_or_else(|| PyValueError::new_err(format!("unknown base metric {:?}", name)));
    }
    if obj.is_callable() {
        return Ok(BaseChoice::Callable(obj.clone()));
    }
    Err(PyTypeError::new_err(
        "base must be a metric name or a callable taking two lists",
    ))
}

fn resolve_config(
    bounded: bool,
    x_tolerance: Option<f64>,
    max_iterations: Option<usize>,
    strict: bool,
) -> ShiftSearchConfig {
    let defaults = ShiftSearchConfig::default();
    ShiftSearchConfig {
        mode: if bounded {
            SearchMode::Bounded
        } else {
            SearchMode::Unbounded
        },
        x_tolerance: x_tolerance.unwrap_or(defaults.x_tolerance),
        max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
        require_convergence: strict,
        ..defaults
    }
}

fn run_search(
    c1: &Bound<'_, PyAny>,
    c2: &Bound<'_, PyAny>,
    base: Option<&Bound<'_, PyAny>>,
    config: ShiftSearchConfig,
    normalize_inputs: bool,
) -> PyResult<ShiftSearchOutcome> {
    let c1_view = extract_view(c1)?;
    let c2_view = extract_view(c2)?;
    let (left, right) = (c1_view.as_slice()?, c2_view.as_slice()?);
    let outcome = match resolve_base(base)? {
        BaseChoice::Named(kind) if normalize_inputs => invariant_search(kind, left, right, config),
        BaseChoice::Named(kind) => translation_search(kind, left, right, config),
        BaseChoice::Callable(obj) if normalize_inputs => {
            invariant_search(PyMetric(&obj), left, right, config)
        }
        BaseChoice::Callable(obj) => translation_search(PyMetric(&obj), left, right, config),
    };
    outcome.map_err(metric_err)
}

fn build_outcome_dict<'py>(
    py: Python<'py>,
    outcome: &ShiftSearchOutcome,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("distance", outcome.distance)?;
    dict.set_item("shift", outcome.shift)?;
    dict.set_item("lower", outcome.range.lower)?;
    dict.set_item("upper", outcome.range.upper)?;
    dict.set_item("evaluations", outcome.evaluations)?;
    dict.set_item("iterations", outcome.iterations)?;
    dict.set_item("converged", outcome.converged)?;
    Ok(dict)
}

#[pyfunction]
#[pyo3(name = "align_unwrap")]
fn align_unwrap_py(c: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    let view = extract_view(c)?;
    crate::align_unwrap(view.as_slice()?).map_err(sequence_err)
}

#[pyfunction]
#[pyo3(name = "normalize_orientation")]
fn normalize_orientation_py(c: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    let view = extract_view(c)?;
    crate::normalize_orientation(view.as_slice()?).map_err(sequence_err)
}

#[pyfunction]
#[pyo3(name = "normalize")]
fn normalize_py(c: &Bound<'_, PyAny>) -> PyResult<Vec<f64>> {
    let view = extract_view(c)?;
    crate::normalize(view.as_slice()?).map_err(sequence_err)
}

/// Shift-minimized base metric on the raw inputs.
#[pyfunction]
#[pyo3(signature = (c1, c2, base=None, bounded=true, x_tolerance=None, max_iterations=None, strict=false))]
fn translation_invariant_distance(
    c1: &Bound<'_, PyAny>,
    c2: &Bound<'_, PyAny>,
    base: Option<&Bound<'_, PyAny>>,
    bounded: bool,
    x_tolerance: Option<f64>,
    max_iterations: Option<usize>,
    strict: bool,
) -> PyResult<f64> {
    let config = resolve_config(bounded, x_tolerance, max_iterations, strict);
    run_search(c1, c2, base, config, false).map(|outcome| outcome.distance)
}

/// Normalize both inputs, then compare with the shift-minimized base metric.
#[pyfunction]
#[pyo3(signature = (c1, c2, base=None, bounded=true, x_tolerance=None, max_iterations=None, strict=false))]
fn invariant_distance(
    c1: &Bound<'_, PyAny>,
    c2: &Bound<'_, PyAny>,
    base: Option<&Bound<'_, PyAny>>,
    bounded: bool,
    x_tolerance: Option<f64>,
    max_iterations: Option<usize>,
    strict: bool,
) -> PyResult<f64> {
    let config = resolve_config(bounded, x_tolerance, max_iterations, strict);
    run_search(c1, c2, base, config, true).map(|outcome| outcome.distance)
}

/// Like `invariant_distance`, returning the full search outcome as a dict.
#[allow(clippy::too_many_arguments)]
#[pyfunction]
#[pyo3(name = "invariant_search")]
#[pyo3(signature = (c1, c2, base=None, bounded=true, x_tolerance=None, max_iterations=None, strict=false))]
fn invariant_search_py<'py>(
    py: Python<'py>,
    c1: &Bound<'py, PyAny>,
    c2: &Bound<'py, PyAny>,
    base: Option<&Bound<'py, PyAny>>,
    bounded: bool,
    x_tolerance: Option<f64>,
    max_iterations: Option<usize>,
    strict: bool,
) -> PyResult<Bound<'py, PyDict>> {
    let config = resolve_config(bounded, x_tolerance, max_iterations, strict);
    let outcome = run_search(c1, c2, base, config, true)?;
    build_outcome_dict(py, &outcome)
}

#[pymodule]
fn circoord_core(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(align_unwrap_py, m)?)?;
    m.add_function(wrap_pyfunction!(normalize_orientation_py, m)?)?;
    m.add_function(wrap_pyfunction!(normalize_py, m)?)?;
    m.add_function(wrap_pyfunction!(translation_invariant_distance, m)?)?;
    m.add_function(wrap_pyfunction!(invariant_distance, m)?)?;
    m.add_function(wrap_pyfunction!(invariant_search_py, m)?)?;
    Ok(())
}
