//! Sampling grid generation.
//!
//! Fitted curves are drawn by sampling the model on an evenly spaced grid
//! over the data's x-range. Grid generation is deterministic given the same
//! inputs.

use crate::error::{FitError, Result};

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(FitError::InvalidInput(format!(
            "invalid sample range: min={min}, max={max} (must be finite and max>min)"
        )));
    }
    if steps < 2 {
        return Err(FitError::InvalidInput(
            "sample steps must be >= 2".to_string(),
        ));
    }

    let step = (max - min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push(min + step * i as f64);
    }
    Ok(out)
}
