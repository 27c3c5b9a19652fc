//! Descending score orderings with stable tie-breaking.

use crate::nms::Detection;

/// Sorts candidate indices by descending `score(idx)`.
///
/// The sort is stable: equal scores keep their original slot order.
pub(crate) fn sort_indices_desc<F>(indices: &mut [usize], score: F)
where
    F: Fn(usize) -> f32,
{
    indices.sort_by(|&a, &b| score(b).total_cmp(&score(a)));
}

/// Sorts merged detections by descending score; ties keep class-then-slot order.
pub(crate) fn sort_detections_desc(detections: &mut [Detection]) {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));
}
