//! Fit evaluation.
//!
//! Responsibilities:
//!
//! - drive the weighted nonlinear solver over a dataset's masked view
//! - freeze the fit-time outputs (parameters, covariance, fitted values)
//! - derive residuals and chi-squared goodness-of-fit statistics

pub mod fitter;

pub use fitter::*;
