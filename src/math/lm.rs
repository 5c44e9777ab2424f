//! Weighted nonlinear least-squares solver (Levenberg–Marquardt).
//!
//! Given a parametric model, observations `y_i` with uncertainties `σ_i`, and
//! an initial guess, we minimize:
//!
//! ```text
//! minimize Σ ((y_i - f(x_i, p)) / σ_i)²
//! ```
//!
//! Implementation choices:
//! - Residuals and the forward-difference Jacobian are scaled by `1/σ_i`, so
//!   the damped step reduces to an ordinary least-squares problem solved via
//!   the SVD kernel in [`crate::math::lsq`].
//! - Damping uses Marquardt scaling (rows proportional to the column norms of
//!   `JᵀJ`), which keeps steps sensible when parameters have very different
//!   magnitudes.
//! - `σ_i` are absolute uncertainties: the covariance of the fitted
//!   parameters is `(JᵀJ)⁻¹` of the scaled Jacobian at the optimum, with no
//!   residual-variance rescaling.

use nalgebra::{DMatrix, DVector};

use crate::error::{FitError, Result};
use crate::math::solve_least_squares;
use crate::model::ParametricCurve;

/// Tuning knobs for the Levenberg–Marquardt loop.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Maximum number of outer iterations (one Jacobian evaluation each).
    pub max_iters: usize,
    /// Relative cost-improvement threshold for convergence.
    pub cost_tol: f64,
    /// Relative step-size threshold for convergence.
    pub step_tol: f64,
    /// Initial damping factor.
    pub damping_init: f64,
    /// Damping ceiling; exceeding it means no acceptable step exists.
    pub damping_max: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            cost_tol: 1e-10,
            step_tol: 1e-12,
            damping_init: 1e-3,
            damping_max: 1e12,
        }
    }
}

/// Fit `model` to `(x, y)` with per-point uncertainties `sigma`.
///
/// Returns the best-fit parameters and their covariance matrix.
pub fn curve_fit<M: ParametricCurve>(
    model: &M,
    x: &[f64],
    y: &[f64],
    sigma: &[f64],
    p0: &[f64],
    opts: &LmOptions,
) -> Result<(Vec<f64>, DMatrix<f64>)> {
    if p0.len() != model.param_len() {
        return Err(FitError::ParameterCount {
            expected: model.param_len(),
            actual: p0.len(),
        });
    }
    validate_inputs(x, y, sigma, p0)?;

    let n = x.len();
    let k = p0.len();

    let mut params = DVector::from_column_slice(p0);
    let mut resid = weighted_residuals(model, x, y, sigma, params.as_slice()).ok_or_else(|| {
        FitError::Convergence("model returned non-finite values at the initial guess".to_string())
    })?;
    let mut cost = resid.norm_squared();
    let mut lambda = opts.damping_init;
    let mut converged = false;

    for _ in 0..opts.max_iters {
        let jac = weighted_jacobian(model, x, sigma, params.as_slice()).ok_or_else(|| {
            FitError::Convergence("Jacobian evaluation produced non-finite values".to_string())
        })?;

        // Marquardt scaling: damp each parameter proportionally to its
        // column norm in JᵀJ, falling back to 1 for flat directions.
        let mut scale = Vec::with_capacity(k);
        for j in 0..k {
            let s = jac.column(j).norm();
            scale.push(if s > 0.0 { s } else { 1.0 });
        }

        // Retry with increasing damping until a step lowers the cost.
        loop {
            let delta = match damped_step(&jac, &resid, &scale, lambda, n, k) {
                Some(d) => d,
                None => {
                    lambda *= 10.0;
                    if lambda > opts.damping_max {
                        return Err(FitError::Convergence(
                            "linear subproblem is too ill-conditioned to solve".to_string(),
                        ));
                    }
                    continue;
                }
            };

            let trial = &params + &delta;
            let trial_resid = weighted_residuals(model, x, y, sigma, trial.as_slice());
            let trial_cost = trial_resid.as_ref().map(|r| r.norm_squared());

            match (trial_resid, trial_cost) {
                (Some(r), Some(c)) if c < cost => {
                    let improvement = cost - c;
                    let small_step =
                        delta.norm() <= opts.step_tol * (params.norm() + opts.step_tol);
                    params = trial;
                    resid = r;
                    cost = c;
                    lambda = (lambda * 0.1).max(1e-12);
                    if improvement <= opts.cost_tol * (cost + 1e-30) || small_step {
                        converged = true;
                    }
                    break;
                }
                _ => {
                    // Step rejected (cost increase or non-finite model output).
                    lambda *= 10.0;
                    if lambda > opts.damping_max {
                        // No direction improves the cost: we are at a (local)
                        // minimum up to numerical precision.
                        converged = true;
                        break;
                    }
                }
            }
        }

        if converged {
            break;
        }
    }

    if !converged {
        return Err(FitError::Convergence(format!(
            "no convergence after {} iterations (cost {cost:.6e})",
            opts.max_iters
        )));
    }

    let pcov = covariance(model, x, sigma, params.as_slice())?;
    Ok((params.iter().copied().collect(), pcov))
}

fn validate_inputs(x: &[f64], y: &[f64], sigma: &[f64], p0: &[f64]) -> Result<()> {
    if x.is_empty() {
        return Err(FitError::InvalidInput("no data points to fit".to_string()));
    }
    if y.len() != x.len() {
        return Err(FitError::ShapeMismatch {
            name: "y",
            expected: x.len(),
            actual: y.len(),
        });
    }
    if sigma.len() != x.len() {
        return Err(FitError::ShapeMismatch {
            name: "sigma",
            expected: x.len(),
            actual: sigma.len(),
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::InvalidInput(
            "data contains non-finite values".to_string(),
        ));
    }
    if sigma.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(FitError::InvalidInput(
            "uncertainties must be finite and > 0".to_string(),
        ));
    }
    if p0.iter().any(|v| !v.is_finite()) {
        return Err(FitError::InvalidInput(
            "initial guess contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Residual vector `r_i = (y_i - f(x_i, p)) / σ_i`, or `None` if the model
/// produced non-finite output.
fn weighted_residuals<M: ParametricCurve>(
    model: &M,
    x: &[f64],
    y: &[f64],
    sigma: &[f64],
    params: &[f64],
) -> Option<DVector<f64>> {
    let mut out = DVector::zeros(x.len());
    for i in 0..x.len() {
        let f = model.value(x[i], params);
        if !f.is_finite() {
            return None;
        }
        out[i] = (y[i] - f) / sigma[i];
    }
    Some(out)
}

/// Forward-difference Jacobian of the weighted model:
/// `J_ij = (∂f(x_i)/∂p_j) / σ_i`.
fn weighted_jacobian<M: ParametricCurve>(
    model: &M,
    x: &[f64],
    sigma: &[f64],
    params: &[f64],
) -> Option<DMatrix<f64>> {
    let n = x.len();
    let k = params.len();

    let mut base = Vec::with_capacity(n);
    for &xi in x {
        let f = model.value(xi, params);
        if !f.is_finite() {
            return None;
        }
        base.push(f);
    }

    let mut jac = DMatrix::zeros(n, k);
    let mut bumped = params.to_vec();
    for j in 0..k {
        let h = f64::EPSILON.sqrt() * params[j].abs().max(1.0);
        bumped[j] = params[j] + h;
        for i in 0..n {
            let f = model.value(x[i], &bumped);
            if !f.is_finite() {
                return None;
            }
            jac[(i, j)] = (f - base[i]) / (h * sigma[i]);
        }
        bumped[j] = params[j];
    }
    Some(jac)
}

/// Solve the damped normal equations as an augmented least-squares problem:
///
/// ```text
/// [      J      ]       [ r ]
/// [ √λ diag(D)  ] δ  =  [ 0 ]
/// ```
fn damped_step(
    jac: &DMatrix<f64>,
    resid: &DVector<f64>,
    scale: &[f64],
    lambda: f64,
    n: usize,
    k: usize,
) -> Option<DVector<f64>> {
    let mut a = DMatrix::zeros(n + k, k);
    let mut b = DVector::zeros(n + k);

    a.view_mut((0, 0), (n, k)).copy_from(jac);
    b.rows_mut(0, n).copy_from(resid);

    let sqrt_lambda = lambda.sqrt();
    for j in 0..k {
        a[(n + j, j)] = sqrt_lambda * scale[j];
    }

    solve_least_squares(&a, &b)
}

/// Covariance of the fitted parameters: `(JᵀJ)⁻¹` of the weighted Jacobian.
///
/// Uses the SVD pseudo-inverse so weakly constrained directions produce large
/// (but finite) variances instead of a hard failure.
fn covariance<M: ParametricCurve>(
    model: &M,
    x: &[f64],
    sigma: &[f64],
    params: &[f64],
) -> Result<DMatrix<f64>> {
    let jac = weighted_jacobian(model, x, sigma, params).ok_or_else(|| {
        FitError::Convergence("Jacobian evaluation produced non-finite values".to_string())
    })?;
    let jtj = jac.tr_mul(&jac);
    jtj.pseudo_inverse(1e-12)
        .map_err(|e| FitError::Convergence(format!("failed to compute covariance: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FnCurve;

    #[test]
    fn recovers_linear_parameters_exactly() {
        let line = FnCurve::new(2, |x, p: &[f64]| p[0] + p[1] * x);
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 2.0 + 3.0 * xi).collect();
        let sigma = vec![0.1; x.len()];

        let (popt, pcov) =
            curve_fit(&line, &x, &y, &sigma, &[0.0, 0.0], &LmOptions::default()).unwrap();

        assert!((popt[0] - 2.0).abs() < 1e-6, "intercept: {}", popt[0]);
        assert!((popt[1] - 3.0).abs() < 1e-6, "slope: {}", popt[1]);
        assert!(pcov[(0, 0)] > 0.0 && pcov[(1, 1)] > 0.0);
    }

    #[test]
    fn recovers_exponential_decay() {
        let decay = FnCurve::new(2, |x, p: &[f64]| p[0] * (-x / p[1]).exp());
        let x: Vec<f64> = (0..20).map(|i| 0.25 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 5.0 * (-xi / 2.0).exp()).collect();
        let sigma = vec![0.01; x.len()];

        let (popt, _) =
            curve_fit(&decay, &x, &y, &sigma, &[1.0, 1.0], &LmOptions::default()).unwrap();

        assert!((popt[0] - 5.0).abs() < 1e-4, "amplitude: {}", popt[0]);
        assert!((popt[1] - 2.0).abs() < 1e-4, "lifetime: {}", popt[1]);
    }

    #[test]
    fn covariance_scales_with_sigma() {
        // Doubling every uncertainty must quadruple the parameter variances.
        let line = FnCurve::new(2, |x, p: &[f64]| p[0] + p[1] * x);
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 1.0 + 0.5 * xi).collect();

        let (_, pcov1) = curve_fit(
            &line,
            &x,
            &y,
            &vec![0.1; x.len()],
            &[0.0, 0.0],
            &LmOptions::default(),
        )
        .unwrap();
        let (_, pcov2) = curve_fit(
            &line,
            &x,
            &y,
            &vec![0.2; x.len()],
            &[0.0, 0.0],
            &LmOptions::default(),
        )
        .unwrap();

        let ratio = pcov2[(0, 0)] / pcov1[(0, 0)];
        assert!((ratio - 4.0).abs() < 1e-6, "variance ratio: {ratio}");
    }

    #[test]
    fn rejects_wrong_parameter_count() {
        let line = FnCurve::new(2, |x, p: &[f64]| p[0] + p[1] * x);
        let err = curve_fit(
            &line,
            &[0.0, 1.0],
            &[0.0, 1.0],
            &[1.0, 1.0],
            &[0.0],
            &LmOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FitError::ParameterCount {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn rejects_empty_data_and_bad_sigma() {
        let line = FnCurve::new(1, |_x, p: &[f64]| p[0]);
        assert!(matches!(
            curve_fit(&line, &[], &[], &[], &[0.0], &LmOptions::default()),
            Err(FitError::InvalidInput(_))
        ));
        assert!(matches!(
            curve_fit(
                &line,
                &[1.0, 2.0],
                &[1.0, 2.0],
                &[1.0, 0.0],
                &[0.0],
                &LmOptions::default()
            ),
            Err(FitError::InvalidInput(_))
        ));
    }
}
