//! BoxSift post-processes raw multi-box detector output.
//!
//! The pipeline for one image is class-wise greedy NMS, a relaxed
//! single-detection fallback when NMS selects nothing, and a final geometric
//! validity filter. Inputs are flat `f32` buffers wrapped in a validated
//! [`PredictionView`]; outputs are parallel box/label/score sequences or
//! [`Detections`] records ordered by descending score.
//!
//! Optional features: `rayon` for batch parallelism, `simd` for a
//! `wide`-based overlap kernel and `tracing` for spans and events.
//!
//! ```
//! use boxsift::{PostProcessor, PostProcessConfig, PredictionView};
//!
//! let boxes = [0.1, 0.1, 0.5, 0.5, 0.12, 0.12, 0.52, 0.52];
//! let probs = [0.9, 0.8];
//! let view = PredictionView::new(&boxes, &probs, 1)?;
//! let detections = PostProcessor::new(PostProcessConfig::default())?.process(&view);
//! assert_eq!(detections.len(), 1);
//! # Ok::<(), boxsift::BoxSiftError>(())
//! ```

pub mod bbox;
pub mod decode;
pub mod fallback;
pub mod filter;
pub mod kernel;
pub mod labels;
pub mod lowlevel;
pub mod nms;
pub mod postprocess;
pub mod predictions;
mod trace;
pub mod util;

pub use bbox::BBox;
pub use decode::{decode_yolo, BoxCoords, YoloDecodeConfig, YoloLayout};
pub use fallback::{FallbackDetection, FallbackMode, FallbackPolicy, FallbackStage};
pub use labels::ClassNames;
pub use nms::{classwise_nms, classwise_nms_slices, Detection, NmsParams, Selection};
pub use postprocess::{DetectionSource, Detections, PostProcessConfig, PostProcessor};
pub use predictions::{Candidate, OwnedPredictions, PredictionView};
pub use util::{BoxSiftError, BoxSiftResult};
