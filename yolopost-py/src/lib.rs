//! Python bindings for the yolopost post-processor.
//!
//! Heads are passed as contiguous `float32` numpy arrays of any shape; only
//! their flat length is checked. Results come back as `(N, 6)` arrays of
//! `xmin, ymin, xmax, ymax, class_id, score` with normalized coordinates.

use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArrayDyn};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use yolopost::lowlevel::anchor_counts;
use yolopost::{PostProcessor as RustPostProcessor, SessionConfig, YoloPostError, ROW_LEN};

/// Convert a YoloPostError to a Python exception.
fn to_py_err(err: YoloPostError) -> PyErr {
    if err.is_configuration() {
        PyValueError::new_err(err.to_string())
    } else {
        PyRuntimeError::new_err(err.to_string())
    }
}

/// Shape the first `count` rows of `rows` as an `(N, 6)` array.
fn rows_to_array<'py>(
    py: Python<'py>,
    mut rows: Vec<f32>,
    count: usize,
) -> PyResult<Bound<'py, PyArray2<f32>>> {
    rows.truncate(count * ROW_LEN);
    let array = Array2::from_shape_vec((count, ROW_LEN), rows)
        .map_err(|err| PyRuntimeError::new_err(err.to_string()))?;
    Ok(array.into_pyarray(py))
}

/// Reusable post-processing session with its own worker pool.
#[pyclass]
pub struct PostProcessor {
    inner: RustPostProcessor,
}

#[pymethods]
impl PostProcessor {
    /// Create a new PostProcessor.
    ///
    /// Args:
    ///     model_size: Square model input resolution, divisible by 32
    ///     classes_number: Number of class logits per anchor
    ///     score_threshold: Minimum accepted score (default: 0.4)
    ///     nms_threshold: IOU above which same-class boxes are dropped (default: 0.45)
    ///     thread_num: Number of decode workers (default: 8)
    #[new]
    #[pyo3(signature = (model_size, classes_number, score_threshold=0.4, nms_threshold=0.45, thread_num=8))]
    fn new(
        model_size: usize,
        classes_number: usize,
        score_threshold: f32,
        nms_threshold: f32,
        thread_num: usize,
    ) -> PyResult<Self> {
        let inner = RustPostProcessor::new(SessionConfig {
            model_size,
            classes_number,
            score_threshold,
            nms_threshold,
            worker_count: thread_num,
            ..SessionConfig::default()
        })
        .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Decode and suppress one set of heads.
    ///
    /// Args:
    ///     head0, head1, head2: float32 arrays for strides 8, 16 and 32
    ///
    /// Returns:
    ///     (N, 6) float32 array, best score first
    fn process<'py>(
        &mut self,
        py: Python<'py>,
        head0: PyReadonlyArrayDyn<'py, f32>,
        head1: PyReadonlyArrayDyn<'py, f32>,
        head2: PyReadonlyArrayDyn<'py, f32>,
    ) -> PyResult<Bound<'py, PyArray2<f32>>> {
        let count = self
            .inner
            .process(head0.as_slice()?, head1.as_slice()?, head2.as_slice()?)
            .map_err(to_py_err)?;
        let mut rows = vec![0.0f32; count * ROW_LEN];
        let written = self.inner.get_results(&mut rows).map_err(to_py_err)?;
        rows_to_array(py, rows, written)
    }

    /// Number of boxes kept by the last call.
    #[getter]
    fn kept_count(&self) -> usize {
        self.inner.kept_count()
    }

    fn __repr__(&self) -> String {
        let params = self.inner.params();
        format!(
            "PostProcessor(model_size={}, classes_number={}, score_threshold={}, nms_threshold={}, thread_num={})",
            params.model_size(),
            params.classes_number(),
            params.score_threshold(),
            params.nms_threshold(),
            params.worker_count()
        )
    }
}

/// One-shot decode and suppression without a persistent session.
///
/// Args:
///     head0, head1, head2: float32 arrays for strides 8, 16 and 32
///     model_size: Square model input resolution (default: 640)
///     classes_number: Number of class logits per anchor (default: 80)
///     score_threshold: Minimum accepted score (default: 0.4)
///     nms_threshold: IOU threshold (default: 0.45)
///     max_candidates: Detection arena size (default: total anchor count)
///     max_boxes: Maximum rows returned (default: 300)
///
/// Returns:
///     (N, 6) float32 array, best score first
#[pyfunction]
#[pyo3(signature = (
    head0,
    head1,
    head2,
    model_size = 640,
    classes_number = 80,
    score_threshold = 0.4,
    nms_threshold = 0.45,
    max_candidates = None,
    max_boxes = 300
))]
#[allow(clippy::too_many_arguments)]
fn fast_postprocess<'py>(
    py: Python<'py>,
    head0: PyReadonlyArrayDyn<'py, f32>,
    head1: PyReadonlyArrayDyn<'py, f32>,
    head2: PyReadonlyArrayDyn<'py, f32>,
    model_size: usize,
    classes_number: usize,
    score_threshold: f32,
    nms_threshold: f32,
    max_candidates: Option<usize>,
    max_boxes: usize,
) -> PyResult<Bound<'py, PyArray2<f32>>> {
    let max_candidates = max_candidates.unwrap_or_else(|| anchor_counts(model_size).iter().sum());
    let mut rows = vec![0.0f32; max_boxes * ROW_LEN];
    let written = yolopost::fast_postprocess(
        [head0.as_slice()?, head1.as_slice()?, head2.as_slice()?],
        model_size,
        classes_number,
        score_threshold,
        nms_threshold,
        max_candidates,
        &mut rows,
        max_boxes,
    )
    .map_err(to_py_err)?;
    rows_to_array(py, rows, written)
}

/// Python module for yolopost.
#[pymodule]
fn _yolopost(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PostProcessor>()?;
    m.add_function(wrap_pyfunction!(fast_postprocess, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
