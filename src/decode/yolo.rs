//! Decoder for anchor-free YOLO detection heads.
//!
//! The exported head emits a `[4 + C, anchors]` matrix (or its transpose):
//! four center-format box values followed by `C` class scores per anchor,
//! with no objectness column. Decoding converts each anchor into a corner
//! box in normalized coordinates and copies its class scores.

use crate::bbox::BBox;
use crate::predictions::{OwnedPredictions, BOX_COORDS};
use crate::trace::{trace_event, trace_span};
use crate::util::{BoxSiftError, BoxSiftResult};

/// Unit of the raw center-format box values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoxCoords {
    /// Already relative to the input size.
    #[default]
    Normalized,
    /// Input-image pixels; divided by the input size while decoding.
    Pixels,
}

/// Memory layout of the raw head output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YoloLayout {
    /// `[4 + C, anchors]`: one row per feature.
    FeaturesFirst,
    /// `[anchors, 4 + C]`: one row per anchor.
    PredictionsFirst,
}

/// Decoder settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloDecodeConfig {
    /// Model input width in pixels.
    pub input_width: u32,
    /// Model input height in pixels.
    pub input_height: u32,
    /// Coordinate system of the raw box values.
    pub coords: BoxCoords,
    /// Clamp decoded boxes into `[0, 1]`.
    pub clip: bool,
}

impl Default for YoloDecodeConfig {
    fn default() -> Self {
        Self {
            input_width: 640,
            input_height: 640,
            coords: BoxCoords::Normalized,
            clip: true,
        }
    }
}

impl YoloDecodeConfig {
    /// Rejects a zero input size.
    pub fn validate(&self) -> BoxSiftResult<()> {
        if self.input_width == 0 {
            return Err(BoxSiftError::InvalidParameter {
                name: "input_width",
                value: 0.0,
                reason: "must be positive",
            });
        }
        if self.input_height == 0 {
            return Err(BoxSiftError::InvalidParameter {
                name: "input_height",
                value: 0.0,
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

/// Infers the layout of a `rows x cols` head output for `num_classes` classes.
///
/// A square-ish ambiguity (both dimensions equal `4 + C`) resolves to
/// [`YoloLayout::FeaturesFirst`], the native export layout.
pub fn detect_layout(rows: usize, cols: usize, num_classes: usize) -> BoxSiftResult<YoloLayout> {
    let features = BOX_COORDS + num_classes;
    if num_classes > 0 && rows == features {
        Ok(YoloLayout::FeaturesFirst)
    } else if num_classes > 0 && cols == features {
        Ok(YoloLayout::PredictionsFirst)
    } else {
        Err(BoxSiftError::UnsupportedLayout {
            rows,
            cols,
            num_classes,
        })
    }
}

/// Decodes a raw YOLO head output into owned predictions.
pub fn decode_yolo(
    output: &[f32],
    rows: usize,
    cols: usize,
    num_classes: usize,
    cfg: &YoloDecodeConfig,
) -> BoxSiftResult<OwnedPredictions> {
    cfg.validate()?;
    let expected = rows.checked_mul(cols).ok_or(BoxSiftError::UnsupportedLayout {
        rows,
        cols,
        num_classes,
    })?;
    if output.len() != expected {
        return Err(BoxSiftError::ShapeMismatch {
            what: "yolo output",
            expected,
            got: output.len(),
        });
    }
    let layout = detect_layout(rows, cols, num_classes)?;
    let (anchors, features) = match layout {
        YoloLayout::FeaturesFirst => (cols, rows),
        YoloLayout::PredictionsFirst => (rows, cols),
    };
    let _span = trace_span!("decode_yolo", anchors = anchors, classes = num_classes).entered();

    let at = |anchor: usize, feature: usize| match layout {
        YoloLayout::FeaturesFirst => output[feature * anchors + anchor],
        YoloLayout::PredictionsFirst => output[anchor * features + feature],
    };
    let (scale_x, scale_y) = match cfg.coords {
        BoxCoords::Normalized => (1.0, 1.0),
        BoxCoords::Pixels => (cfg.input_width as f32, cfg.input_height as f32),
    };

    let mut boxes = Vec::with_capacity(anchors * BOX_COORDS);
    let mut class_probs = Vec::with_capacity(anchors * num_classes);
    for anchor in 0..anchors {
        let mut bbox = BBox::from_cxcywh(
            at(anchor, 0) / scale_x,
            at(anchor, 1) / scale_y,
            at(anchor, 2) / scale_x,
            at(anchor, 3) / scale_y,
        );
        if cfg.clip {
            bbox = bbox.clamp_unit();
        }
        boxes.extend_from_slice(&bbox.to_array());
        class_probs.extend((0..num_classes).map(|class| at(anchor, BOX_COORDS + class)));
    }

    trace_event!("yolo_decoded", anchors = anchors);
    OwnedPredictions::new(boxes, class_probs, num_classes)
}
