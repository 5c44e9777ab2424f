//! Linear least-squares kernel.
//!
//! The Levenberg–Marquardt loop repeatedly solves small linear problems of
//! the form:
//!
//! ```text
//! minimize ||A δ - b||²
//! ```
//!
//! where `A` stacks the sigma-scaled Jacobian on top of the damping rows.
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly even when the
//!   matrix is tall (more rows than columns). (Nalgebra's `QR::solve` is
//!   intended for square systems and will panic for non-square matrices.)
//! - Parameter counts are tiny (a handful of columns), so SVD performance is
//!   a non-issue.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    // Near-singular systems show up when the model's parameters are nearly
    // redundant over the sampled x-range, so we retry with progressively
    // looser tolerances before giving up.
    let svd = a.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(delta) = svd.solve(b, tol) {
            if delta.iter().all(|v| v.is_finite()) {
                return Some(delta);
            }
        }
    }

    None
}
