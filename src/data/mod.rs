//! Measurement data containers.
//!
//! This module defines:
//!
//! - [`Dataset`]: aligned x/y samples with per-point uncertainties and a
//!   reversible boolean mask
//! - [`Sigma`]: uncertainty input that is either a scalar (broadcast) or a
//!   per-point vector
//! - deterministic synthetic data generation for validation and tests

pub mod dataset;
pub mod synthetic;

pub use dataset::*;
pub use synthetic::*;
