//! Formatted terminal summaries.
//!
//! We keep formatting code in one place so:
//! - the data/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::data::Dataset;
use crate::fit::{FitOutcome, GofStats};

/// Summarize a dataset: sizes, extents, and whether x-uncertainty is carried.
pub fn format_dataset_summary(ds: &Dataset) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Dataset: n={} ({} selected)",
        ds.len(),
        ds.selected_len()
    ));

    let x = ds.xdata();
    let y = ds.ydata();
    if let (Some((x_min, x_max)), Some((y_min, y_max))) = (extent(&x), extent(&y)) {
        out.push_str(&format!(
            " | x=[{x_min:.4}, {x_max:.4}] | y=[{y_min:.4}, {y_max:.4}]"
        ));
    }
    if ds.has_xerr() {
        out.push_str(" | with x-uncertainty");
    }

    out
}

/// Summarize a fit: parameters with standard errors plus goodness-of-fit.
pub fn format_fit_summary(outcome: &FitOutcome, stats: &GofStats) -> String {
    let mut out = String::new();

    out.push_str("Fit parameters:\n");
    for (i, (p, e)) in outcome.popt.iter().zip(outcome.perr.iter()).enumerate() {
        out.push_str(&format!("  p[{i}] = {p:.6} +/- {e:.6}\n"));
    }

    out.push_str(&format!(
        "chi2={:.4} | dof={} | reduced chi2={:.4} | p={:.4}\n",
        stats.chi2, stats.dof, stats.reduced_chi2, stats.p_value
    ));

    out
}

fn extent(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    (min.is_finite() && max.is_finite()).then_some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    #[test]
    fn dataset_summary_reflects_mask() {
        let mut ds = Dataset::new(vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], 0.1).unwrap();
        assert_eq!(
            format_dataset_summary(&ds),
            "Dataset: n=3 (3 selected) | x=[1.0000, 3.0000] | y=[4.0000, 6.0000]"
        );

        ds.set_mask(&[true, false, false]).unwrap();
        assert_eq!(
            format_dataset_summary(&ds),
            "Dataset: n=3 (1 selected) | x=[1.0000, 1.0000] | y=[4.0000, 4.0000]"
        );
    }

    #[test]
    fn fit_summary_lists_parameters_and_stats() {
        let outcome = FitOutcome {
            popt: vec![1.0, 2.0],
            pcov: DMatrix::identity(2, 2),
            perr: vec![1.0, 1.0],
            yfit: vec![],
        };
        let stats = GofStats {
            chi2: 4.0,
            dof: 8,
            reduced_chi2: 0.5,
            p_value: 0.8571,
        };

        let txt = format_fit_summary(&outcome, &stats);
        assert!(txt.contains("p[0] = 1.000000 +/- 1.000000"));
        assert!(txt.contains("p[1] = 2.000000 +/- 1.000000"));
        assert!(txt.contains("chi2=4.0000 | dof=8 | reduced chi2=0.5000 | p=0.8571"));
    }
}
