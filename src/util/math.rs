//! Numeric helpers shared by selection and fallback.

use crate::util::{BoxSiftError, BoxSiftResult};

/// Index of the largest value, first occurrence on ties. NaN entries are skipped.
pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Largest non-NaN value, if any.
pub(crate) fn max_value(values: &[f32]) -> Option<f32> {
    argmax(values).map(|idx| values[idx])
}

/// Rejects values outside `[0, 1]` (NaN included).
pub(crate) fn check_unit_interval(name: &'static str, value: f32) -> BoxSiftResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BoxSiftError::InvalidParameter {
            name,
            value,
            reason: "must lie in [0, 1]",
        })
    }
}
