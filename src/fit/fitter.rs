//! Fitting a parametric model to a dataset and evaluating the result.
//!
//! A [`Fitter`] borrows one [`Dataset`] (shared, never copied) and owns one
//! model. `fit` runs the weighted solver on the *currently masked* data and
//! freezes its outputs; `residuals`/`stats` derive everything else from that
//! frozen snapshot.
//!
//! The mask is the one shared mutable resource: if it changes between `fit`
//! and a later `residuals`/`stats` call, the frozen fit no longer lines up
//! with the dataset view. That case is detected and fails with a shape
//! mismatch instead of silently misaligning arrays — re-fit after changing
//! the mask.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::data::Dataset;
use crate::error::{FitError, Result};
use crate::math::{LmOptions, curve_fit, lin_space};
use crate::model::ParametricCurve;
use crate::plot::Plotter;

/// Frozen outputs of one `fit` call.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Best-fit parameters.
    pub popt: Vec<f64>,
    /// Covariance matrix of `popt`.
    pub pcov: DMatrix<f64>,
    /// Standard errors: `perr[i] = sqrt(pcov[i][i])`.
    pub perr: Vec<f64>,
    /// Model evaluated on the fit-time masked x-values.
    pub yfit: Vec<f64>,
}

/// Chi-squared goodness-of-fit summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GofStats {
    /// `Σ (residual_i / yerr_i)²`.
    pub chi2: f64,
    /// Degrees of freedom: selected points minus fitted parameters.
    pub dof: usize,
    /// `chi2 / dof`; near 1 means uncertainties are well calibrated.
    pub reduced_chi2: f64,
    /// Survival probability of `chi2` under the null hypothesis that the
    /// model is correct.
    pub p_value: f64,
}

/// Weighted nonlinear fit of a model over one dataset.
pub struct Fitter<'a, M: ParametricCurve> {
    model: M,
    data: &'a Dataset,
    options: LmOptions,
    outcome: Option<FitOutcome>,
}

impl<'a, M: ParametricCurve> Fitter<'a, M> {
    /// Wrap a model and a dataset; no fitting happens yet.
    pub fn new(model: M, data: &'a Dataset) -> Self {
        Self::with_options(model, data, LmOptions::default())
    }

    /// As [`new`](Self::new), with explicit solver options.
    pub fn with_options(model: M, data: &'a Dataset, options: LmOptions) -> Self {
        Self {
            model,
            data,
            options,
            outcome: None,
        }
    }

    /// Whether a successful `fit` has run.
    pub fn is_fitted(&self) -> bool {
        self.outcome.is_some()
    }

    /// The frozen fit outputs, or `NotFitted`.
    pub fn outcome(&self) -> Result<&FitOutcome> {
        self.outcome.as_ref().ok_or(FitError::NotFitted)
    }

    /// Best-fit parameters, or `NotFitted`.
    pub fn popt(&self) -> Result<&[f64]> {
        Ok(&self.outcome()?.popt)
    }

    /// Parameter standard errors, or `NotFitted`.
    pub fn perr(&self) -> Result<&[f64]> {
        Ok(&self.outcome()?.perr)
    }

    /// Fit the model to the currently masked data, starting from `p0`.
    ///
    /// Minimizes `Σ ((y_i - f(x_i, p)) / yerr_i)²` with `yerr` as absolute
    /// sigma weights; x-uncertainty is carried for reporting/plotting only.
    /// Re-fitting is allowed and overwrites the previous outcome. A failed
    /// fit leaves the previous outcome untouched.
    pub fn fit(&mut self, p0: &[f64]) -> Result<&FitOutcome> {
        let (x, y, yerr, _xerr) = self.data.unpack();
        let (popt, pcov) = curve_fit(&self.model, &x, &y, &yerr, p0, &self.options)?;

        let perr: Vec<f64> = (0..popt.len()).map(|i| pcov[(i, i)].sqrt()).collect();
        let yfit = self.model.sample(&x, &popt);

        Ok(self.outcome.insert(FitOutcome {
            popt,
            pcov,
            perr,
            yfit,
        }))
    }

    /// `ydata - yfit` over the fit-time selection.
    ///
    /// Fails with `NotFitted` before a fit, and with a shape mismatch if the
    /// mask changed since the fit.
    pub fn residuals(&self) -> Result<Vec<f64>> {
        let outcome = self.outcome()?;
        let y = self.data.ydata();
        if y.len() != outcome.yfit.len() {
            return Err(FitError::ShapeMismatch {
                name: "ydata",
                expected: outcome.yfit.len(),
                actual: y.len(),
            });
        }
        Ok(y.iter()
            .zip(outcome.yfit.iter())
            .map(|(yi, fi)| yi - fi)
            .collect())
    }

    /// Chi-squared, reduced chi-squared, and the chi-squared survival
    /// probability for the current fit.
    pub fn stats(&self) -> Result<GofStats> {
        let outcome = self.outcome()?;
        let residuals = self.residuals()?;
        let yerr = self.data.yerr();
        if yerr.len() != residuals.len() {
            return Err(FitError::ShapeMismatch {
                name: "yerr",
                expected: residuals.len(),
                actual: yerr.len(),
            });
        }

        let chi2: f64 = residuals
            .iter()
            .zip(yerr.iter())
            .map(|(r, s)| (r / s).powi(2))
            .sum();

        let n = residuals.len();
        let k = outcome.popt.len();
        if n <= k {
            return Err(FitError::DegenerateFit { n, k });
        }
        let dof = n - k;
        let reduced_chi2 = chi2 / dof as f64;

        let dist = ChiSquared::new(dof as f64).expect("dof >= 1");
        let p_value = 1.0 - dist.cdf(chi2);

        Ok(GofStats {
            chi2,
            dof,
            reduced_chi2,
            p_value,
        })
    }

    /// Draw the fitted curve (and optionally the data) on the given backend.
    ///
    /// The curve is sampled on `samples` evenly spaced points spanning the
    /// currently masked x-range.
    pub fn plot_model(
        &self,
        plotter: &mut dyn Plotter,
        samples: usize,
        label: &str,
        plot_data: bool,
    ) -> Result<()> {
        let outcome = self.outcome()?;
        if plot_data {
            self.data.plot_data(plotter, "Data")?;
        }

        let x = self.data.xdata();
        let (min, max) = x_extent(&x)?;
        let xs = lin_space(min, max, samples.max(2))?;
        let ys = self.model.sample(&xs, &outcome.popt);
        plotter.make_plot(&xs, &ys, label)
    }

    /// Draw the residuals with error bars on the given backend.
    pub fn plot_residuals(&self, plotter: &mut dyn Plotter) -> Result<()> {
        let residuals = self.residuals()?;
        let (x, _, yerr, xerr) = self.data.unpack();
        plotter.make_residual(&x, &residuals, &yerr, xerr.as_deref())
    }
}

fn x_extent(x: &[f64]) -> Result<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in x {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Ok((min, max))
    } else {
        Err(FitError::InvalidInput(
            "cannot sample a curve over an empty or degenerate x-range".to_string(),
        ))
    }
}
