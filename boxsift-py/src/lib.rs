//! Python bindings for the boxsift post-processing library.
//!
//! Arrays cross the boundary as numpy `float32` arrays: boxes `(N, 4)`,
//! class scores `(N, C)` and optional objectness `(N,)`. Passing `None` for
//! boxes or scores means the model produced nothing and yields empty output.

use numpy::{
    PyArray1, PyArray2, PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2,
    PyUntypedArrayMethods,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use boxsift::{
    BoxCoords, BoxSiftError, Detection as RustDetection, DetectionSource,
    FallbackMode as RustFallbackMode, FallbackPolicy as RustFallbackPolicy,
    NmsParams as RustNmsParams, PostProcessConfig, PostProcessor as RustPostProcessor,
    PredictionView, Selection, YoloDecodeConfig,
};

/// Convert a BoxSiftError to a Python exception.
fn to_py_err(err: BoxSiftError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Flat contiguous data of a 2D array plus its column count.
fn rows_of<'a>(array: &'a PyReadonlyArray2<'_, f32>) -> PyResult<(&'a [f32], usize)> {
    let cols = array.shape()[1];
    Ok((array.as_slice()?, cols))
}

/// Single detection with normalized box, class id and score.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    /// `[x_min, y_min, x_max, y_max]` in `[0, 1]`.
    #[pyo3(get)]
    pub bbox: [f32; 4],
    /// Class index.
    #[pyo3(get)]
    pub class_id: usize,
    /// Confidence score.
    #[pyo3(get)]
    pub score: f32,
}

#[pymethods]
impl Detection {
    /// Box scaled to pixel coordinates of a `width x height` image.
    fn to_pixels(&self, width: u32, height: u32) -> [f32; 4] {
        boxsift::BBox::from_array(self.bbox).to_pixels(width, height)
    }

    fn __repr__(&self) -> String {
        let [x0, y0, x1, y1] = self.bbox;
        format!(
            "Detection(class_id={}, score={:.4}, bbox=[{:.3}, {:.3}, {:.3}, {:.3}])",
            self.class_id, self.score, x0, y0, x1, y1
        )
    }
}

impl From<RustDetection> for Detection {
    fn from(det: RustDetection) -> Self {
        Self {
            bbox: det.bbox.to_array(),
            class_id: det.class_id,
            score: det.score,
        }
    }
}

/// Class-wise NMS thresholds.
#[pyclass]
#[derive(Clone)]
pub struct NmsParams {
    inner: RustNmsParams,
}

#[pymethods]
impl NmsParams {
    /// Create new NMS parameters.
    ///
    /// Args:
    ///     iou_threshold: Same-class overlap above which boxes are suppressed (default: 0.5)
    ///     score_threshold: Scores at or below this are ignored (default: 0.5)
    ///     max_output_per_class: Cap on kept boxes per class (default: 10)
    #[new]
    #[pyo3(signature = (iou_threshold=0.5, score_threshold=0.5, max_output_per_class=10))]
    fn new(iou_threshold: f32, score_threshold: f32, max_output_per_class: usize) -> PyResult<Self> {
        let inner = RustNmsParams {
            iou_threshold,
            score_threshold,
            max_output_per_class,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn iou_threshold(&self) -> f32 {
        self.inner.iou_threshold
    }

    #[getter]
    fn score_threshold(&self) -> f32 {
        self.inner.score_threshold
    }

    #[getter]
    fn max_output_per_class(&self) -> usize {
        self.inner.max_output_per_class
    }

    fn __repr__(&self) -> String {
        format!(
            "NmsParams(iou_threshold={}, score_threshold={}, max_output_per_class={})",
            self.inner.iou_threshold, self.inner.score_threshold, self.inner.max_output_per_class
        )
    }
}

/// Thresholds of the relaxed fallback used when NMS selects nothing.
#[pyclass]
#[derive(Clone)]
pub struct FallbackPolicy {
    inner: RustFallbackPolicy,
}

#[pymethods]
impl FallbackPolicy {
    /// Create a new FallbackPolicy.
    ///
    /// Args:
    ///     min_relative_score: Floor of the objectness-weighted threshold (default: 0.01)
    ///     relative_score_factor: Fraction of score_threshold used by that stage (default: 0.5)
    ///     min_objectness: Objectness the objectness-only stage must exceed (default: 0.1)
    #[new]
    #[pyo3(signature = (min_relative_score=0.01, relative_score_factor=0.5, min_objectness=0.1))]
    fn new(min_relative_score: f32, relative_score_factor: f32, min_objectness: f32) -> PyResult<Self> {
        let inner = RustFallbackPolicy {
            min_relative_score,
            relative_score_factor,
            min_objectness,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!(
            "FallbackPolicy(min_relative_score={}, relative_score_factor={}, min_objectness={})",
            self.inner.min_relative_score, self.inner.relative_score_factor, self.inner.min_objectness
        )
    }
}

/// Post-processor chaining NMS, fallback and validity filtering.
#[pyclass]
pub struct PostProcessor {
    inner: RustPostProcessor,
}

#[pymethods]
impl PostProcessor {
    /// Create a post-processor.
    ///
    /// Args:
    ///     nms: NmsParams (default: NmsParams())
    ///     fallback: FallbackPolicy, or None with fallback=False to disable it
    ///     use_fallback: Run the relaxed fallback when NMS is empty (default: True)
    #[new]
    #[pyo3(signature = (nms=None, fallback=None, use_fallback=true))]
    fn new(
        nms: Option<NmsParams>,
        fallback: Option<FallbackPolicy>,
        use_fallback: bool,
    ) -> PyResult<Self> {
        let fallback = if use_fallback {
            RustFallbackMode::Enabled(fallback.map(|f| f.inner).unwrap_or_default())
        } else {
            RustFallbackMode::Disabled
        };
        let cfg = PostProcessConfig {
            nms: nms.map(|p| p.inner).unwrap_or_default(),
            fallback,
            parallel: false,
        };
        let inner = RustPostProcessor::new(cfg).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Post-process one image.
    ///
    /// Args:
    ///     boxes: float32 array (N, 4) or None
    ///     class_probs: float32 array (N, S) or None
    ///     objectness: float32 array (N,) or None
    ///     background_slot: Last score column is background (default: False)
    ///
    /// Returns:
    ///     (list of Detection sorted by score, source name)
    #[pyo3(signature = (boxes, class_probs, objectness=None, background_slot=false))]
    fn process(
        &self,
        boxes: Option<PyReadonlyArray2<'_, f32>>,
        class_probs: Option<PyReadonlyArray2<'_, f32>>,
        objectness: Option<PyReadonlyArray1<'_, f32>>,
        background_slot: bool,
    ) -> PyResult<(Vec<Detection>, &'static str)> {
        let (Some(boxes), Some(class_probs)) = (boxes, class_probs) else {
            return Ok((Vec::new(), DetectionSource::Empty.as_str()));
        };
        let (box_data, _) = rows_of(&boxes)?;
        let (prob_data, stride) = rows_of(&class_probs)?;
        let mut view = PredictionView::new(box_data, prob_data, stride).map_err(to_py_err)?;
        if background_slot {
            view = view.with_background_slot().map_err(to_py_err)?;
        }
        let objectness_data = match &objectness {
            Some(array) => Some(array.as_slice()?),
            None => None,
        };
        if let Some(obj) = objectness_data {
            view = view.with_objectness(obj).map_err(to_py_err)?;
        }
        let result = self.inner.process(&view);
        let items = result.items.into_iter().map(Detection::from).collect();
        Ok((items, result.source.as_str()))
    }

    fn __repr__(&self) -> String {
        let nms = self.inner.config().nms;
        let fallback = match self.inner.config().fallback {
            RustFallbackMode::Enabled(_) => "enabled",
            RustFallbackMode::Disabled => "disabled",
        };
        format!(
            "PostProcessor(iou_threshold={}, score_threshold={}, fallback='{}')",
            nms.iou_threshold, nms.score_threshold, fallback
        )
    }
}

type SelectionArrays<'py> = (
    Bound<'py, PyArray2<f32>>,
    Bound<'py, PyArray1<i64>>,
    Bound<'py, PyArray1<f32>>,
);

fn selection_to_numpy(py: Python<'_>, selection: Selection) -> PyResult<SelectionArrays<'_>> {
    let (boxes, labels, scores) = selection.into_parts();
    let k = boxes.len();
    let flat: Vec<f32> = boxes.iter().flat_map(|b| b.to_array()).collect();
    let boxes = PyArray1::from_vec(py, flat).reshape([k, 4])?;
    let labels = PyArray1::from_vec(py, labels.into_iter().map(|l| l as i64).collect());
    let scores = PyArray1::from_vec(py, scores);
    Ok((boxes, labels, scores))
}

/// Class-wise greedy NMS.
///
/// Args:
///     boxes: float32 array (N, 4) of normalized corner boxes, or None
///     class_probs: float32 array (N, C), or None
///     iou_threshold: Suppression overlap (default: 0.5)
///     score_threshold: Minimum exclusive score (default: 0.5)
///     max_output_per_class: Cap per class (default: 10)
///
/// Returns:
///     (boxes (K, 4), labels (K,), scores (K,)) sorted by descending score
#[pyfunction]
#[pyo3(signature = (boxes, class_probs, iou_threshold=0.5, score_threshold=0.5, max_output_per_class=10))]
fn classwise_nms<'py>(
    py: Python<'py>,
    boxes: Option<PyReadonlyArray2<'py, f32>>,
    class_probs: Option<PyReadonlyArray2<'py, f32>>,
    iou_threshold: f32,
    score_threshold: f32,
    max_output_per_class: usize,
) -> PyResult<SelectionArrays<'py>> {
    let params = RustNmsParams {
        iou_threshold,
        score_threshold,
        max_output_per_class,
    };
    let boxes = boxes.as_ref().map(rows_of).transpose()?;
    let class_probs = class_probs.as_ref().map(rows_of).transpose()?;
    let num_classes = class_probs.map_or(0, |(_, cols)| cols);
    let selection = boxsift::classwise_nms_slices(
        boxes.map(|(data, _)| data),
        class_probs.map(|(data, _)| data),
        num_classes,
        &params,
    )
    .map_err(to_py_err)?;
    selection_to_numpy(py, selection)
}

/// Decode a raw YOLO head output.
///
/// Args:
///     output: float32 array (4 + C, anchors) or (anchors, 4 + C)
///     num_classes: Number of classes C
///     input_width: Model input width in pixels (default: 640)
///     input_height: Model input height in pixels (default: 640)
///     coords: "normalized" or "pixels" (default: "normalized")
///     clip: Clamp boxes into [0, 1] (default: True)
///
/// Returns:
///     (boxes (N, 4), class_probs (N, C))
#[pyfunction]
#[pyo3(signature = (output, num_classes, input_width=640, input_height=640, coords="normalized", clip=true))]
fn decode_yolo<'py>(
    py: Python<'py>,
    output: PyReadonlyArray2<'py, f32>,
    num_classes: usize,
    input_width: u32,
    input_height: u32,
    coords: &str,
    clip: bool,
) -> PyResult<(Bound<'py, PyArray2<f32>>, Bound<'py, PyArray2<f32>>)> {
    let coords = match coords.to_lowercase().as_str() {
        "normalized" => BoxCoords::Normalized,
        "pixels" => BoxCoords::Pixels,
        _ => {
            return Err(PyValueError::new_err(
                "coords must be 'normalized' or 'pixels'",
            ))
        }
    };
    let cfg = YoloDecodeConfig {
        input_width,
        input_height,
        coords,
        clip,
    };
    let shape = output.shape();
    let (rows, cols) = (shape[0], shape[1]);
    let owned =
        boxsift::decode_yolo(output.as_slice()?, rows, cols, num_classes, &cfg).map_err(to_py_err)?;

    let view = owned.view();
    let n = view.len();
    let mut boxes = Vec::with_capacity(n * 4);
    let mut probs = Vec::with_capacity(n * num_classes);
    for candidate in view.candidates() {
        boxes.extend_from_slice(&candidate.bbox.to_array());
        probs.extend_from_slice(candidate.class_scores);
    }
    let boxes = PyArray1::from_vec(py, boxes).reshape([n, 4])?;
    let probs = PyArray1::from_vec(py, probs).reshape([n, num_classes])?;
    Ok((boxes, probs))
}

/// Names of the eight waste categories in model output order.
#[pyfunction]
fn waste_classes() -> Vec<String> {
    boxsift::ClassNames::waste().iter().map(str::to_owned).collect()
}

/// Python module for boxsift post-processing.
#[pymodule]
fn _boxsift(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<NmsParams>()?;
    m.add_class::<FallbackPolicy>()?;
    m.add_class::<PostProcessor>()?;
    m.add_function(wrap_pyfunction!(classwise_nms, m)?)?;
    m.add_function(wrap_pyfunction!(decode_yolo, m)?)?;
    m.add_function(wrap_pyfunction!(waste_classes, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
