//! Recording backend for headless tests.
//!
//! Captures every draw call verbatim so tests can assert on what the core
//! handed off without rendering anything.

use crate::error::Result;
use crate::plot::Plotter;

/// One captured draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotCall {
    Plot {
        x: Vec<f64>,
        y: Vec<f64>,
        label: String,
    },
    Errorbar {
        x: Vec<f64>,
        y: Vec<f64>,
        yerr: Vec<f64>,
        xerr: Option<Vec<f64>>,
        label: String,
    },
    Residual {
        x: Vec<f64>,
        y: Vec<f64>,
        yerr: Vec<f64>,
        xerr: Option<Vec<f64>>,
    },
}

/// A [`Plotter`] that appends every call to a public list.
#[derive(Debug, Default)]
pub struct RecordingPlot {
    pub calls: Vec<PlotCall>,
}

impl RecordingPlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plotter for RecordingPlot {
    fn make_plot(&mut self, x: &[f64], y: &[f64], label: &str) -> Result<()> {
        self.calls.push(PlotCall::Plot {
            x: x.to_vec(),
            y: y.to_vec(),
            label: label.to_string(),
        });
        Ok(())
    }

    fn make_errorbar(
        &mut self,
        x: &[f64],
        y: &[f64],
        yerr: &[f64],
        xerr: Option<&[f64]>,
        label: &str,
    ) -> Result<()> {
        self.calls.push(PlotCall::Errorbar {
            x: x.to_vec(),
            y: y.to_vec(),
            yerr: yerr.to_vec(),
            xerr: xerr.map(|v| v.to_vec()),
            label: label.to_string(),
        });
        Ok(())
    }

    fn make_residual(
        &mut self,
        x: &[f64],
        y: &[f64],
        yerr: &[f64],
        xerr: Option<&[f64]>,
    ) -> Result<()> {
        self.calls.push(PlotCall::Residual {
            x: x.to_vec(),
            y: y.to_vec(),
            yerr: yerr.to_vec(),
            xerr: xerr.map(|v| v.to_vec()),
        });
        Ok(())
    }
}
