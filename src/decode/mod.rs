//! Decoders turning raw detector heads into [`OwnedPredictions`](crate::OwnedPredictions).

pub mod yolo;

pub use yolo::{decode_yolo, detect_layout, BoxCoords, YoloDecodeConfig, YoloLayout};
