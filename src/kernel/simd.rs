//! SIMD overlap kernel using the `wide` crate.
//!
//! Tests four kept boxes per step with `f32x4`; the remainder falls back to
//! scalar arithmetic. Lane operations follow the scalar formula term by term,
//! so decisions are identical to [`ScalarOverlap`](crate::kernel::scalar::ScalarOverlap).

use crate::bbox::{BBox, IOU_EPSILON};
use crate::kernel::{KeptBoxes, OverlapKernel};
use wide::f32x4;

const LANES: usize = 4;

#[inline]
fn load_f32x4(slice: &[f32]) -> f32x4 {
    f32x4::from([slice[0], slice[1], slice[2], slice[3]])
}

/// Four-lane IoU test.
pub struct SimdOverlap;

impl OverlapKernel for SimdOverlap {
    fn suppresses(bbox: &BBox, kept: &KeptBoxes, iou_threshold: f32) -> bool {
        let n = kept.len();
        let simd_end = n / LANES * LANES;
        let area = bbox.area();

        let x_min = f32x4::splat(bbox.x_min);
        let y_min = f32x4::splat(bbox.y_min);
        let x_max = f32x4::splat(bbox.x_max);
        let y_max = f32x4::splat(bbox.y_max);
        let area_v = f32x4::splat(area);
        let eps = f32x4::splat(IOU_EPSILON);
        let zero = f32x4::ZERO;

        let mut idx = 0;
        while idx < simd_end {
            let k_x_min = load_f32x4(&kept.x_min[idx..]);
            let k_y_min = load_f32x4(&kept.y_min[idx..]);
            let k_x_max = load_f32x4(&kept.x_max[idx..]);
            let k_y_max = load_f32x4(&kept.y_max[idx..]);
            let k_area = load_f32x4(&kept.area[idx..]);

            let inter_w = (x_max.min(k_x_max) - x_min.max(k_x_min)).max(zero);
            let inter_h = (y_max.min(k_y_max) - y_min.max(k_y_min)).max(zero);
            let inter = inter_w * inter_h;
            let iou = inter / (area_v + k_area - inter + eps);
            if iou.to_array().iter().any(|&v| v > iou_threshold) {
                return true;
            }
            idx += LANES;
        }

        while idx < n {
            let inter_w = (bbox.x_max.min(kept.x_max[idx]) - bbox.x_min.max(kept.x_min[idx])).max(0.0);
            let inter_h = (bbox.y_max.min(kept.y_max[idx]) - bbox.y_min.max(kept.y_min[idx])).max(0.0);
            let inter = inter_w * inter_h;
            let iou = inter / (area + kept.area[idx] - inter + IOU_EPSILON);
            if iou > iou_threshold {
                return true;
            }
            idx += 1;
        }
        false
    }
}
