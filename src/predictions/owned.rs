use crate::bbox::BBox;
use crate::predictions::{PredictionView, BOX_COORDS};
use crate::util::{BoxSiftError, BoxSiftResult};

/// Owned prediction buffers with validated shapes.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedPredictions {
    boxes: Vec<f32>,
    class_probs: Vec<f32>,
    objectness: Option<Vec<f32>>,
    num_classes: usize,
    stride: usize,
}

impl OwnedPredictions {
    /// Creates owned predictions from flat row-major buffers.
    pub fn new(boxes: Vec<f32>, class_probs: Vec<f32>, num_classes: usize) -> BoxSiftResult<Self> {
        PredictionView::new(&boxes, &class_probs, num_classes)?;
        Ok(Self {
            boxes,
            class_probs,
            objectness: None,
            num_classes,
            stride: num_classes,
        })
    }

    /// Creates owned predictions from per-candidate rows.
    ///
    /// Every score row must have the same length.
    pub fn from_rows(boxes: &[BBox], class_probs: &[Vec<f32>]) -> BoxSiftResult<Self> {
        if boxes.len() != class_probs.len() {
            return Err(BoxSiftError::ShapeMismatch {
                what: "class_probs rows",
                expected: boxes.len(),
                got: class_probs.len(),
            });
        }
        let num_classes = class_probs.first().map_or(0, Vec::len);
        let mut flat_boxes = Vec::with_capacity(boxes.len() * BOX_COORDS);
        let mut flat_probs = Vec::with_capacity(class_probs.len() * num_classes);
        for (bbox, row) in boxes.iter().zip(class_probs) {
            if row.len() != num_classes {
                return Err(BoxSiftError::ShapeMismatch {
                    what: "class_probs row",
                    expected: num_classes,
                    got: row.len(),
                });
            }
            flat_boxes.extend_from_slice(&bbox.to_array());
            flat_probs.extend_from_slice(row);
        }
        Self::new(flat_boxes, flat_probs, num_classes)
    }

    /// Attaches per-candidate objectness scores.
    pub fn with_objectness(mut self, objectness: Vec<f32>) -> BoxSiftResult<Self> {
        self.view().with_objectness(&objectness)?;
        self.objectness = Some(objectness);
        Ok(self)
    }

    /// Reinterprets the last score column as a background slot.
    pub fn with_background_slot(mut self) -> BoxSiftResult<Self> {
        let view = self.view().with_background_slot()?;
        self.num_classes = view.num_classes();
        Ok(self)
    }

    /// Number of candidate slots.
    pub fn len(&self) -> usize {
        self.boxes.len() / BOX_COORDS
    }

    /// True when there are no candidate slots.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Number of semantic classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Returns a borrowed view of the buffers.
    pub fn view(&self) -> PredictionView<'_> {
        PredictionView::from_parts(
            &self.boxes,
            &self.class_probs,
            self.objectness.as_deref(),
            self.num_classes,
            self.stride,
        )
        .unwrap_or_else(|_| PredictionView::empty())
    }
}
