//! Error types for curve fitting.
//!
//! Everything here fails fast: errors are raised at the point of detection
//! and never recovered internally. A failed operation leaves prior state
//! untouched.

use thiserror::Error;

/// Result type alias for fitting operations.
pub type Result<T> = std::result::Result<T, FitError>;

/// Errors that can occur while building datasets or fitting models.
#[derive(Debug, Error)]
pub enum FitError {
    /// An input array disagrees in length with the rest of the dataset.
    #[error("shape mismatch: `{name}` has length {actual}, expected {expected}")]
    ShapeMismatch {
        /// Name of the offending array (`y`, `yerr`, `xerr`, `mask`, ...).
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A fit-dependent operation was called before `fit()`.
    #[error("model has not been fitted yet; call fit() first")]
    NotFitted,

    /// The solver exhausted its iteration/damping budget.
    #[error("solver failed to converge: {0}")]
    Convergence(String),

    /// The initial guess does not match the model's parameter count.
    #[error("initial guess has {actual} parameters, model expects {expected}")]
    ParameterCount { expected: usize, actual: usize },

    /// More parameters than selected data points: no degrees of freedom.
    #[error("degenerate fit: {n} data points with {k} parameters leaves dof <= 0")]
    DegenerateFit { n: usize, k: usize },

    /// Invalid input data (empty, non-finite, or non-positive uncertainties).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A plotting backend failed to draw or save.
    #[error("plotting error: {0}")]
    Plot(String),
}
