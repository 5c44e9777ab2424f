//! `chifit` library crate.
//!
//! Weighted nonlinear curve fitting for measurement data with uncertainties:
//!
//! - [`data::Dataset`] holds aligned x/y samples with per-point errors and a
//!   reversible boolean mask
//! - [`fit::Fitter`] fits a [`model::ParametricCurve`] to the masked data and
//!   derives residuals and chi-squared goodness-of-fit statistics
//! - [`plot::Plotter`] is the injected drawing capability (ASCII, SVG, or a
//!   recording backend for tests)

pub mod data;
pub mod error;
pub mod fit;
pub mod math;
pub mod model;
pub mod plot;
pub mod report;
