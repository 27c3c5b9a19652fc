//! Low-level building blocks for custom post-processing pipelines.
//!
//! These expose the overlap kernels and the individual pipeline stages
//! behind [`PostProcessor`](crate::PostProcessor). Most users should prefer
//! the top-level `PostProcessor` and `classwise_nms`.

pub use crate::bbox::IOU_EPSILON;
pub use crate::decode::detect_layout;
pub use crate::fallback::{objectness_fallback, objectness_weighted_fallback, relaxed_fallback};
pub use crate::filter::{filter_selection, retain_valid};
pub use crate::kernel::scalar::ScalarOverlap;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SimdOverlap;
pub use crate::kernel::{KeptBoxes, OverlapKernel};
pub use crate::predictions::BOX_COORDS;
