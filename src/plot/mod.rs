//! Plotting capability and backends.
//!
//! The core never draws anything itself: it hands already-computed arrays to
//! a [`Plotter`] passed in by the caller. Backends are swappable per call
//! site; there is no process-wide default instance.

pub mod ascii;
pub mod record;
pub mod svg;

pub use ascii::*;
pub use record::*;
pub use svg::*;

use crate::error::Result;

/// The drawing capability consumed by datasets and fitters.
///
/// Implementations decide rendering, windowing, and persistence. The three
/// operations receive fully computed arrays; `xerr` is `None` when the
/// dataset carries no x-uncertainty.
pub trait Plotter {
    /// Draw a line series (e.g., a sampled model curve).
    fn make_plot(&mut self, x: &[f64], y: &[f64], label: &str) -> Result<()>;

    /// Draw data points with error bars.
    fn make_errorbar(
        &mut self,
        x: &[f64],
        y: &[f64],
        yerr: &[f64],
        xerr: Option<&[f64]>,
        label: &str,
    ) -> Result<()>;

    /// Draw residuals with error bars around a zero baseline.
    fn make_residual(
        &mut self,
        x: &[f64],
        y: &[f64],
        yerr: &[f64],
        xerr: Option<&[f64]>,
    ) -> Result<()>;
}
