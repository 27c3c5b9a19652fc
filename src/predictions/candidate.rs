use crate::bbox::BBox;
use crate::util::math::{argmax, max_value};

/// One raw prediction slot of a single image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate<'a> {
    /// Slot index within the image.
    pub index: usize,
    /// Box as emitted by the model; may be inverted or out of range.
    pub bbox: BBox,
    /// Per-class scores, background slot excluded.
    pub class_scores: &'a [f32],
    /// Class-agnostic confidence, when the model emits one.
    pub objectness: Option<f32>,
}

impl Candidate<'_> {
    /// Highest-scoring class id (first on ties).
    pub fn best_class(&self) -> Option<usize> {
        argmax(self.class_scores)
    }

    /// Highest class score of this slot.
    pub fn max_score(&self) -> Option<f32> {
        max_value(self.class_scores)
    }
}
