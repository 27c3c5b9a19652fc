//! End-to-end post-processing of raw detector output.
//!
//! `PostProcessor` chains the three stages for one image: class-wise NMS,
//! the relaxed fallback when NMS selected nothing, and the validity filter.
//! It holds only its configuration, so one instance can serve any number of
//! images or threads; batches are independent per-image invocations.

use crate::fallback::{relaxed_fallback, FallbackMode, FallbackStage};
use crate::filter::retain_valid;
use crate::nms::{classwise_nms, Detection, NmsParams, Selection};
use crate::predictions::PredictionView;
use crate::trace::{trace_event, trace_span};
use crate::util::BoxSiftResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Configuration for [`PostProcessor`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PostProcessConfig {
    /// Class-wise NMS thresholds.
    pub nms: NmsParams,
    /// Fallback behaviour when NMS selects nothing.
    pub fallback: FallbackMode,
    /// Process batches on the rayon pool (requires the `rayon` feature;
    /// ignored otherwise).
    pub parallel: bool,
}

impl PostProcessConfig {
    /// Validates NMS and fallback thresholds.
    pub fn validate(&self) -> BoxSiftResult<()> {
        self.nms.validate()?;
        self.fallback.validate()
    }
}

/// Path that produced the final detections of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectionSource {
    /// Strict class-wise NMS.
    Nms,
    /// Objectness-weighted fallback.
    ObjectnessWeighted,
    /// Objectness-only fallback.
    Objectness,
    /// Nothing survived.
    Empty,
}

impl DetectionSource {
    /// Lowercase name used in logs and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nms => "nms",
            Self::ObjectnessWeighted => "objectness_weighted",
            Self::Objectness => "objectness",
            Self::Empty => "empty",
        }
    }
}

impl From<FallbackStage> for DetectionSource {
    fn from(stage: FallbackStage) -> Self {
        match stage {
            FallbackStage::ObjectnessWeighted => Self::ObjectnessWeighted,
            FallbackStage::Objectness => Self::Objectness,
        }
    }
}

/// Final detections of one image, best score first.
#[derive(Clone, Debug, PartialEq)]
pub struct Detections {
    /// Valid detections ordered by descending score.
    pub items: Vec<Detection>,
    /// Path that produced `items`; `Empty` when `items` is empty.
    pub source: DetectionSource,
}

impl Detections {
    /// No detections.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            source: DetectionSource::Empty,
        }
    }

    /// Number of detections.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Highest-scoring detection.
    pub fn best(&self) -> Option<&Detection> {
        self.items.first()
    }

    /// Parallel `(boxes, labels, scores)` view of the detections.
    pub fn to_selection(&self) -> Selection {
        Selection::from_detections(self.items.iter().copied())
    }
}

/// Post-processor for raw multi-box detector output.
#[derive(Clone, Debug)]
pub struct PostProcessor {
    cfg: PostProcessConfig,
}

impl PostProcessor {
    /// Creates a post-processor after validating `cfg`.
    pub fn new(cfg: PostProcessConfig) -> BoxSiftResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &PostProcessConfig {
        &self.cfg
    }

    /// Runs NMS, fallback and validity filtering on one image.
    pub fn process(&self, predictions: &PredictionView<'_>) -> Detections {
        let _span = trace_span!("post_process", candidates = predictions.len()).entered();

        let selection = classwise_nms(predictions, &self.cfg.nms);
        let (mut items, source): (Vec<Detection>, DetectionSource) = if !selection.is_empty() {
            (selection.detections().collect(), DetectionSource::Nms)
        } else {
            match self.cfg.fallback {
                FallbackMode::Disabled => (Vec::new(), DetectionSource::Empty),
                FallbackMode::Enabled(policy) => {
                    match relaxed_fallback(predictions, self.cfg.nms.score_threshold, &policy) {
                        Some(hit) => {
                            trace_event!("fallback", stage = DetectionSource::from(hit.stage).as_str());
                            (vec![hit.detection], hit.stage.into())
                        }
                        None => (Vec::new(), DetectionSource::Empty),
                    }
                }
            }
        };

        let dropped = retain_valid(&mut items);
        if dropped > 0 {
            trace_event!("validity_filter", dropped = dropped, remaining = items.len());
        }
        if items.is_empty() {
            return Detections::empty();
        }
        Detections { items, source }
    }

    /// Runs [`process`](Self::process) on flat buffers.
    ///
    /// Absent box or score buffers mean "no detections" and return an empty
    /// result; mismatched shapes are errors.
    pub fn process_slices(
        &self,
        boxes: Option<&[f32]>,
        class_probs: Option<&[f32]>,
        num_classes: usize,
        objectness: Option<&[f32]>,
    ) -> BoxSiftResult<Detections> {
        let (Some(boxes), Some(class_probs)) = (boxes, class_probs) else {
            return Ok(Detections::empty());
        };
        let mut view = PredictionView::new(boxes, class_probs, num_classes)?;
        if let Some(obj) = objectness {
            view = view.with_objectness(obj)?;
        }
        Ok(self.process(&view))
    }

    /// Processes a batch of images; output order follows input order.
    pub fn process_batch(&self, batch: &[PredictionView<'_>]) -> Vec<Detections> {
        let _span = trace_span!(
            "post_process_batch",
            images = batch.len(),
            parallel = self.cfg.parallel
        )
        .entered();
        self.run_batch(batch)
    }

    #[cfg(feature = "rayon")]
    fn run_batch(&self, batch: &[PredictionView<'_>]) -> Vec<Detections> {
        if self.cfg.parallel {
            batch.par_iter().map(|view| self.process(view)).collect()
        } else {
            batch.iter().map(|view| self.process(view)).collect()
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn run_batch(&self, batch: &[PredictionView<'_>]) -> Vec<Detections> {
        batch.iter().map(|view| self.process(view)).collect()
    }
}
