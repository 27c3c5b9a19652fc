//! Borrowed and owned views over raw per-image model output.
//!
//! A detector emits three flat row-major tensors per image: `N x 4` box
//! coordinates, `N x S` class scores and optionally `N` objectness values.
//! `PredictionView` validates their shapes once so the selection code can
//! index rows without further checks. The score row stride `S` equals the
//! number of classes, or one more when the model appends a background slot;
//! the background column is carried in the buffer but never treated as a class.

use crate::bbox::BBox;
use crate::util::{BoxSiftError, BoxSiftResult};

mod candidate;
mod owned;

pub use candidate::Candidate;
pub use owned::OwnedPredictions;

/// Number of coordinates per box.
pub const BOX_COORDS: usize = 4;

/// Borrowed view over the raw candidates of one image.
#[derive(Copy, Clone, Debug)]
pub struct PredictionView<'a> {
    boxes: &'a [f32],
    class_probs: &'a [f32],
    objectness: Option<&'a [f32]>,
    len: usize,
    num_classes: usize,
    stride: usize,
}

impl<'a> PredictionView<'a> {
    /// Creates a view where every score column is a class.
    ///
    /// `boxes` holds `N * 4` values and `class_probs` holds `N * num_classes`.
    pub fn new(boxes: &'a [f32], class_probs: &'a [f32], num_classes: usize) -> BoxSiftResult<Self> {
        Self::from_parts(boxes, class_probs, None, num_classes, num_classes)
    }

    /// Creates a view with no candidates.
    pub fn empty() -> Self {
        Self {
            boxes: &[],
            class_probs: &[],
            objectness: None,
            len: 0,
            num_classes: 0,
            stride: 0,
        }
    }

    pub(crate) fn from_parts(
        boxes: &'a [f32],
        class_probs: &'a [f32],
        objectness: Option<&'a [f32]>,
        num_classes: usize,
        stride: usize,
    ) -> BoxSiftResult<Self> {
        let len = candidate_count(boxes)?;
        if len > 0 && num_classes == 0 {
            return Err(BoxSiftError::InvalidDimensions {
                num_classes,
                background: stride > num_classes,
            });
        }
        let needed = len
            .checked_mul(stride)
            .ok_or(BoxSiftError::ShapeMismatch {
                what: "class_probs",
                expected: usize::MAX,
                got: class_probs.len(),
            })?;
        if class_probs.len() != needed {
            return Err(BoxSiftError::ShapeMismatch {
                what: "class_probs",
                expected: needed,
                got: class_probs.len(),
            });
        }
        if let Some(obj) = objectness {
            if obj.len() != len {
                return Err(BoxSiftError::ShapeMismatch {
                    what: "objectness",
                    expected: len,
                    got: obj.len(),
                });
            }
        }
        Ok(Self {
            boxes,
            class_probs,
            objectness,
            len,
            num_classes,
            stride,
        })
    }

    /// Attaches per-candidate objectness scores.
    pub fn with_objectness(self, objectness: &'a [f32]) -> BoxSiftResult<Self> {
        Self::from_parts(
            self.boxes,
            self.class_probs,
            Some(objectness),
            self.num_classes,
            self.stride,
        )
    }

    /// Reinterprets the last score column as a background slot.
    pub fn with_background_slot(self) -> BoxSiftResult<Self> {
        if self.has_background() {
            return Err(BoxSiftError::InvalidDimensions {
                num_classes: self.num_classes,
                background: true,
            });
        }
        let num_classes = self.stride.saturating_sub(1);
        Self::from_parts(
            self.boxes,
            self.class_probs,
            self.objectness,
            num_classes,
            self.stride,
        )
    }

    /// Number of candidate slots `N`.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the view holds no candidates.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of semantic classes (background excluded).
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Number of score values per candidate row, background included.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// True when score rows carry a trailing background column.
    pub fn has_background(&self) -> bool {
        self.stride > self.num_classes
    }

    /// Objectness values, if the model provides them.
    pub fn objectness(&self) -> Option<&'a [f32]> {
        self.objectness
    }

    /// Box of candidate `idx`.
    pub fn bbox(&self, idx: usize) -> Option<BBox> {
        if idx >= self.len {
            return None;
        }
        let start = idx * BOX_COORDS;
        BBox::from_slice(&self.boxes[start..start + BOX_COORDS])
    }

    /// Class scores of candidate `idx`, background column excluded.
    pub fn class_scores(&self, idx: usize) -> Option<&'a [f32]> {
        if idx >= self.len {
            return None;
        }
        let start = idx * self.stride;
        self.class_probs.get(start..start + self.num_classes)
    }

    /// Objectness of candidate `idx`, if available.
    pub fn objectness_at(&self, idx: usize) -> Option<f32> {
        self.objectness.and_then(|obj| obj.get(idx).copied())
    }

    /// Typed record for candidate `idx`.
    pub fn candidate(&self, idx: usize) -> Option<Candidate<'a>> {
        Some(Candidate {
            index: idx,
            bbox: self.bbox(idx)?,
            class_scores: self.class_scores(idx)?,
            objectness: self.objectness_at(idx),
        })
    }

    /// Iterates all candidates in slot order.
    pub fn candidates(&self) -> impl Iterator<Item = Candidate<'a>> + 'a {
        let view = *self;
        (0..view.len).filter_map(move |idx| view.candidate(idx))
    }

    /// Score of candidate `idx` for `class`; callers guarantee both are in range.
    #[inline]
    pub(crate) fn score(&self, idx: usize, class: usize) -> f32 {
        self.class_probs[idx * self.stride + class]
    }

    /// Box of candidate `idx`; callers guarantee the index is in range.
    #[inline]
    pub(crate) fn bbox_unchecked(&self, idx: usize) -> BBox {
        let start = idx * BOX_COORDS;
        BBox::new(
            self.boxes[start],
            self.boxes[start + 1],
            self.boxes[start + 2],
            self.boxes[start + 3],
        )
    }
}

fn candidate_count(boxes: &[f32]) -> BoxSiftResult<usize> {
    let rem = boxes.len() % BOX_COORDS;
    if rem != 0 {
        return Err(BoxSiftError::ShapeMismatch {
            what: "box coordinates",
            expected: boxes.len() - rem,
            got: boxes.len(),
        });
    }
    Ok(boxes.len() / BOX_COORDS)
}
