//! Scalar overlap kernel.

use crate::bbox::{BBox, IOU_EPSILON};
use crate::kernel::{KeptBoxes, OverlapKernel};

/// Box-at-a-time IoU test with early exit.
pub struct ScalarOverlap;

impl OverlapKernel for ScalarOverlap {
    fn suppresses(bbox: &BBox, kept: &KeptBoxes, iou_threshold: f32) -> bool {
        let area = bbox.area();
        for idx in 0..kept.len() {
            let inter_w = (bbox.x_max.min(kept.x_max[idx]) - bbox.x_min.max(kept.x_min[idx])).max(0.0);
            let inter_h = (bbox.y_max.min(kept.y_max[idx]) - bbox.y_min.max(kept.y_min[idx])).max(0.0);
            let inter = inter_w * inter_h;
            let iou = inter / (area + kept.area[idx] - inter + IOU_EPSILON);
            if iou > iou_threshold {
                return true;
            }
        }
        false
    }
}
