//! Relaxed single-detection fallback for images where strict NMS finds nothing.
//!
//! Softmax dilution across many slots can leave every class score under the
//! NMS threshold even when the model is confident that some object is
//! present. Two stages try to recover one best-effort detection:
//!
//! 1. objectness-weighted: the slot maximizing `objectness * max class score`
//!    (or the bare max class score without objectness) is emitted when that
//!    product reaches `max(min_relative_score, score_threshold * relative_score_factor)`;
//! 2. objectness only: when stage 1 fails and objectness exists, the slot with
//!    the highest objectness is emitted when it exceeds `min_objectness`.

use crate::nms::Detection;
use crate::predictions::PredictionView;
use crate::util::math::{argmax, check_unit_interval};
use crate::util::BoxSiftResult;

/// Thresholds of the two fallback stages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackPolicy {
    /// Floor for the objectness-weighted threshold.
    pub min_relative_score: f32,
    /// Fraction of the NMS score threshold used by the objectness-weighted stage.
    pub relative_score_factor: f32,
    /// Objectness that must be exceeded by the objectness-only stage.
    pub min_objectness: f32,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            min_relative_score: 0.01,
            relative_score_factor: 0.5,
            min_objectness: 0.1,
        }
    }
}

impl FallbackPolicy {
    /// Checks that all thresholds lie in `[0, 1]`.
    pub fn validate(&self) -> BoxSiftResult<()> {
        check_unit_interval("min_relative_score", self.min_relative_score)?;
        check_unit_interval("relative_score_factor", self.relative_score_factor)?;
        check_unit_interval("min_objectness", self.min_objectness)?;
        Ok(())
    }

    /// Threshold the objectness-weighted stage compares against.
    pub fn relative_threshold(&self, score_threshold: f32) -> f32 {
        self.min_relative_score
            .max(score_threshold * self.relative_score_factor)
    }
}

/// Whether and how to recover a detection when NMS returns nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FallbackMode {
    /// Strict NMS only.
    Disabled,
    /// Run both fallback stages with the given thresholds.
    Enabled(FallbackPolicy),
}

impl Default for FallbackMode {
    fn default() -> Self {
        Self::Enabled(FallbackPolicy::default())
    }
}

impl FallbackMode {
    /// Validates the policy when enabled.
    pub fn validate(&self) -> BoxSiftResult<()> {
        match self {
            Self::Disabled => Ok(()),
            Self::Enabled(policy) => policy.validate(),
        }
    }
}

/// Fallback stage that produced a detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackStage {
    /// `objectness * max class score` cleared the relative threshold.
    ObjectnessWeighted,
    /// Objectness alone exceeded `min_objectness`.
    Objectness,
}

/// Detection recovered by the fallback path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackDetection {
    /// The recovered detection.
    pub detection: Detection,
    /// Stage that fired.
    pub stage: FallbackStage,
}

/// Objectness-weighted stage.
///
/// Ties on the relative score resolve to the lowest slot index.
pub fn objectness_weighted_fallback(
    predictions: &PredictionView<'_>,
    score_threshold: f32,
    policy: &FallbackPolicy,
) -> Option<Detection> {
    let mut best: Option<(usize, f32)> = None;
    for candidate in predictions.candidates() {
        let Some(max_score) = candidate.max_score() else {
            continue;
        };
        let rel_score = match candidate.objectness {
            Some(obj) => obj * max_score,
            None => max_score,
        };
        if rel_score.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if rel_score <= current => {}
            _ => best = Some((candidate.index, rel_score)),
        }
    }

    let (idx, rel_score) = best?;
    if rel_score < policy.relative_threshold(score_threshold) {
        return None;
    }
    let candidate = predictions.candidate(idx)?;
    Some(Detection {
        bbox: candidate.bbox,
        class_id: candidate.best_class()?,
        score: rel_score,
    })
}

/// Objectness-only stage; yields nothing when the model emits no objectness.
pub fn objectness_fallback(
    predictions: &PredictionView<'_>,
    policy: &FallbackPolicy,
) -> Option<Detection> {
    let objectness = predictions.objectness()?;
    let idx = argmax(objectness)?;
    let score = objectness[idx];
    if score <= policy.min_objectness {
        return None;
    }
    let candidate = predictions.candidate(idx)?;
    Some(Detection {
        bbox: candidate.bbox,
        class_id: candidate.best_class()?,
        score,
    })
}

/// Runs the objectness-weighted stage, then the objectness-only stage.
pub fn relaxed_fallback(
    predictions: &PredictionView<'_>,
    score_threshold: f32,
    policy: &FallbackPolicy,
) -> Option<FallbackDetection> {
    if let Some(detection) = objectness_weighted_fallback(predictions, score_threshold, policy) {
        return Some(FallbackDetection {
            detection,
            stage: FallbackStage::ObjectnessWeighted,
        });
    }
    objectness_fallback(predictions, policy).map(|detection| FallbackDetection {
        detection,
        stage: FallbackStage::Objectness,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        objectness_fallback, objectness_weighted_fallback, relaxed_fallback, FallbackPolicy,
        FallbackStage,
    };
    use crate::bbox::BBox;
    use crate::predictions::PredictionView;

    #[test]
    fn relative_threshold_has_a_floor() {
        let policy = FallbackPolicy::default();
        assert!((policy.relative_threshold(0.3) - 0.15).abs() < 1e-6);
        assert!((policy.relative_threshold(0.0) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn weighted_stage_uses_objectness_product() {
        let boxes = [0.1, 0.1, 0.4, 0.4, 0.5, 0.5, 0.9, 0.9];
        let probs = [0.2, 0.25, 0.3, 0.1];
        let objectness = [0.9, 0.5];
        let view = PredictionView::new(&boxes, &probs, 2)
            .unwrap()
            .with_objectness(&objectness)
            .unwrap();
        let det = objectness_weighted_fallback(&view, 0.3, &FallbackPolicy::default()).unwrap();
        // 0.9 * 0.25 = 0.225 beats 0.5 * 0.3 = 0.15
        assert_eq!(det.bbox, BBox::new(0.1, 0.1, 0.4, 0.4));
        assert_eq!(det.class_id, 1);
        assert!((det.score - 0.225).abs() < 1e-6);
    }

    #[test]
    fn weighted_stage_without_objectness_uses_max_score() {
        let boxes = [0.1, 0.1, 0.4, 0.4];
        let probs = [0.2, 0.05];
        let view = PredictionView::new(&boxes, &probs, 2).unwrap();
        let det = objectness_weighted_fallback(&view, 0.3, &FallbackPolicy::default()).unwrap();
        assert_eq!(det.class_id, 0);
        assert!((det.score - 0.2).abs() < 1e-6);
        assert!(objectness_fallback(&view, &FallbackPolicy::default()).is_none());
    }

    #[test]
    fn objectness_stage_fires_after_weighted_stage_fails() {
        let boxes = [0.2, 0.2, 0.6, 0.6];
        let probs = [0.02, 0.01];
        let objectness = [0.9];
        let view = PredictionView::new(&boxes, &probs, 2)
            .unwrap()
            .with_objectness(&objectness)
            .unwrap();
        let hit = relaxed_fallback(&view, 0.3, &FallbackPolicy::default()).unwrap();
        assert_eq!(hit.stage, FallbackStage::Objectness);
        assert_eq!(hit.detection.class_id, 0);
        assert!((hit.detection.score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn objectness_at_threshold_does_not_fire() {
        let boxes = [0.2, 0.2, 0.6, 0.6];
        let probs = [0.001];
        let objectness = [0.1];
        let view = PredictionView::new(&boxes, &probs, 1)
            .unwrap()
            .with_objectness(&objectness)
            .unwrap();
        assert!(relaxed_fallback(&view, 0.5, &FallbackPolicy::default()).is_none());
    }

    #[test]
    fn empty_view_has_no_fallback() {
        let view = PredictionView::empty();
        assert!(relaxed_fallback(&view, 0.5, &FallbackPolicy::default()).is_none());
    }
}
