//! Overlap kernels for greedy suppression.
//!
//! The inner question of class-wise NMS is whether a candidate overlaps any
//! already-kept box of the same class by more than the IoU threshold. Kept
//! boxes are stored as a structure of arrays so the SIMD kernel can test
//! four of them per instruction; both kernels share the exact IoU formula of
//! [`BBox::iou`](crate::bbox::BBox::iou) and reach the same decisions.

use crate::bbox::BBox;

/// Kept boxes of one class in structure-of-arrays layout.
#[derive(Clone, Debug, Default)]
pub struct KeptBoxes {
    pub(crate) x_min: Vec<f32>,
    pub(crate) y_min: Vec<f32>,
    pub(crate) x_max: Vec<f32>,
    pub(crate) y_max: Vec<f32>,
    pub(crate) area: Vec<f32>,
}

impl KeptBoxes {
    /// Creates an empty set with room for `capacity` boxes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x_min: Vec::with_capacity(capacity),
            y_min: Vec::with_capacity(capacity),
            x_max: Vec::with_capacity(capacity),
            y_max: Vec::with_capacity(capacity),
            area: Vec::with_capacity(capacity),
        }
    }

    /// Appends a box.
    pub fn push(&mut self, bbox: BBox) {
        self.x_min.push(bbox.x_min);
        self.y_min.push(bbox.y_min);
        self.x_max.push(bbox.x_max);
        self.y_max.push(bbox.y_max);
        self.area.push(bbox.area());
    }

    /// Number of kept boxes.
    pub fn len(&self) -> usize {
        self.area.len()
    }

    /// True when nothing has been kept yet.
    pub fn is_empty(&self) -> bool {
        self.area.is_empty()
    }

    /// Removes every box, keeping the allocation.
    pub fn clear(&mut self) {
        self.x_min.clear();
        self.y_min.clear();
        self.x_max.clear();
        self.y_max.clear();
        self.area.clear();
    }

    /// Returns kept box `idx`.
    pub fn get(&self, idx: usize) -> Option<BBox> {
        Some(BBox::new(
            *self.x_min.get(idx)?,
            *self.y_min.get(idx)?,
            *self.x_max.get(idx)?,
            *self.y_max.get(idx)?,
        ))
    }
}

/// Kernel trait for the suppression test.
pub trait OverlapKernel {
    /// True when `bbox` has IoU strictly greater than `iou_threshold` with any kept box.
    ///
    /// IoU equal to the threshold does not suppress.
    fn suppresses(bbox: &BBox, kept: &KeptBoxes, iou_threshold: f32) -> bool;
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;
