//! Error types for boxsift.

use thiserror::Error;

/// Result alias for boxsift operations.
pub type BoxSiftResult<T> = std::result::Result<T, BoxSiftError>;

/// Errors raised at the input boundary of the post-processing pipeline.
///
/// The algorithms themselves never fail; these variants only describe
/// malformed tensors, configuration values, or raw output layouts.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BoxSiftError {
    /// The class dimension cannot hold any semantic class.
    #[error("invalid dimensions: {num_classes} classes (background slot: {background})")]
    InvalidDimensions { num_classes: usize, background: bool },
    /// Two tensors disagree on a length that must match.
    #[error("shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// A tunable parameter is outside its permitted range.
    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },
    /// A raw model output whose shape cannot be interpreted.
    #[error("unsupported output layout {rows}x{cols} for {num_classes} classes")]
    UnsupportedLayout {
        rows: usize,
        cols: usize,
        num_classes: usize,
    },
}
