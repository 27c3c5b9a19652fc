//! Class-wise greedy non-maximum suppression.
//!
//! Every class is processed independently: candidates whose score for the
//! class exceeds `score_threshold` are walked in descending score order and
//! kept unless they overlap an already-kept box of that class by more than
//! `iou_threshold`. The per-class selections are then merged and ordered by
//! score alone, so the same spatial box can appear once per class.

use crate::bbox::BBox;
#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::ScalarOverlap as Overlap;
#[cfg(feature = "simd")]
use crate::kernel::simd::SimdOverlap as Overlap;
use crate::kernel::{KeptBoxes, OverlapKernel};
use crate::predictions::PredictionView;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::math::check_unit_interval;
use crate::util::BoxSiftResult;

pub(crate) mod order;

use order::{sort_detections_desc, sort_indices_desc};

/// One finalized detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Box in normalized image coordinates.
    pub bbox: BBox,
    /// Index into the class list.
    pub class_id: usize,
    /// Confidence associated with `class_id`.
    pub score: f32,
}

/// Tunables for [`classwise_nms`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NmsParams {
    /// Same-class overlap above which a lower-scored box is suppressed.
    pub iou_threshold: f32,
    /// Scores at or below this value are never considered for a class.
    pub score_threshold: f32,
    /// Hard cap on kept boxes per class.
    pub max_output_per_class: usize,
}

impl Default for NmsParams {
    fn default() -> Self {
        Self {
            iou_threshold: 0.5,
            score_threshold: 0.5,
            max_output_per_class: 10,
        }
    }
}

impl NmsParams {
    /// Checks that both thresholds lie in `[0, 1]`.
    pub fn validate(&self) -> BoxSiftResult<()> {
        check_unit_interval("iou_threshold", self.iou_threshold)?;
        check_unit_interval("score_threshold", self.score_threshold)?;
        Ok(())
    }
}

/// Parallel sequences of selected boxes, labels and scores, best score first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    boxes: Vec<BBox>,
    labels: Vec<usize>,
    scores: Vec<f32>,
}

impl Selection {
    /// Builds a selection from detections, preserving their order.
    pub fn from_detections<I>(detections: I) -> Self
    where
        I: IntoIterator<Item = Detection>,
    {
        let mut out = Self::default();
        for det in detections {
            out.boxes.push(det.bbox);
            out.labels.push(det.class_id);
            out.scores.push(det.score);
        }
        out
    }

    /// Number of selected detections `K`.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// True when nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Selected boxes (`K x 4`).
    pub fn boxes(&self) -> &[BBox] {
        &self.boxes
    }

    /// Selected class ids.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Selected scores, non-increasing.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Iterates the selection as detection records.
    pub fn detections(&self) -> impl Iterator<Item = Detection> + '_ {
        self.boxes
            .iter()
            .zip(&self.labels)
            .zip(&self.scores)
            .map(|((&bbox, &class_id), &score)| Detection {
                bbox,
                class_id,
                score,
            })
    }

    /// Splits into `(boxes, labels, scores)`.
    pub fn into_parts(self) -> (Vec<BBox>, Vec<usize>, Vec<f32>) {
        (self.boxes, self.labels, self.scores)
    }
}

/// Runs class-wise NMS over one image.
///
/// Classes are processed in index order and candidates of equal score keep
/// their slot order, so the result is deterministic for a given input.
pub fn classwise_nms(predictions: &PredictionView<'_>, params: &NmsParams) -> Selection {
    let n = predictions.len();
    let num_classes = predictions.num_classes();
    let _span = trace_span!("classwise_nms", candidates = n, classes = num_classes).entered();

    if n == 0 || params.max_output_per_class == 0 {
        return Selection::default();
    }

    let mut selected: Vec<Detection> = Vec::new();
    let mut order: Vec<usize> = Vec::with_capacity(n);
    let mut kept = KeptBoxes::with_capacity(params.max_output_per_class.min(n));

    for class in 0..num_classes {
        order.clear();
        order.extend((0..n).filter(|&idx| predictions.score(idx, class) > params.score_threshold));
        if order.is_empty() {
            continue;
        }
        sort_indices_desc(&mut order, |idx| predictions.score(idx, class));

        kept.clear();
        for &idx in &order {
            if kept.len() >= params.max_output_per_class {
                break;
            }
            let bbox = predictions.bbox_unchecked(idx);
            if Overlap::suppresses(&bbox, &kept, params.iou_threshold) {
                continue;
            }
            kept.push(bbox);
            selected.push(Detection {
                bbox,
                class_id: class,
                score: predictions.score(idx, class),
            });
        }
        trace_debug!("class_selection", class = class, eligible = order.len(), kept = kept.len());
    }

    sort_detections_desc(&mut selected);
    trace_event!("nms_selected", count = selected.len());
    Selection::from_detections(selected)
}

/// Runs class-wise NMS over flat buffers, treating absent tensors as "no detections".
///
/// `None` for either buffer yields an empty selection. Shape mismatches and
/// out-of-range thresholds are reported as errors.
pub fn classwise_nms_slices(
    boxes: Option<&[f32]>,
    class_probs: Option<&[f32]>,
    num_classes: usize,
    params: &NmsParams,
) -> BoxSiftResult<Selection> {
    params.validate()?;
    let (Some(boxes), Some(class_probs)) = (boxes, class_probs) else {
        return Ok(Selection::default());
    };
    let view = PredictionView::new(boxes, class_probs, num_classes)?;
    Ok(classwise_nms(&view, params))
}
