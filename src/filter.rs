//! Final geometric validity filter.
//!
//! Runs after NMS and after any fallback substitution. Degenerate or
//! out-of-range boxes are dropped, never clamped.

use crate::nms::{Detection, Selection};

/// Drops detections whose box fails [`BBox::is_valid_normalized`](crate::bbox::BBox::is_valid_normalized).
///
/// Returns the number of dropped detections; relative order is preserved.
pub fn retain_valid(detections: &mut Vec<Detection>) -> usize {
    let before = detections.len();
    detections.retain(|det| det.bbox.is_valid_normalized());
    before - detections.len()
}

/// Selection-level variant of [`retain_valid`].
pub fn filter_selection(selection: &Selection) -> Selection {
    Selection::from_detections(
        selection
            .detections()
            .filter(|det| det.bbox.is_valid_normalized()),
    )
}
