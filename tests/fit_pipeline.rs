//! End-to-end tests: dataset construction, masking, fitting, statistics,
//! and plot handoff through the recording backend.

use chifit::data::{Dataset, NoiseSpec, noisy_dataset};
use chifit::error::FitError;
use chifit::fit::{Fitter, GofStats};
use chifit::model::FnCurve;
use chifit::plot::{PlotCall, RecordingPlot};

fn sine() -> FnCurve<impl Fn(f64, &[f64]) -> f64> {
    FnCurve::new(1, |x: f64, p: &[f64]| p[0] * x.sin())
}

#[test]
fn recovers_sine_amplitude_from_noisy_data() {
    // y = sin(x) + noise, sigma well below the signal amplitude.
    let noise = NoiseSpec {
        sigma_y: 0.05,
        sigma_x: None,
        seed: 42,
    };
    let data = noisy_dataset(&sine(), &[1.0], 0.1, 6.2, 100, &noise).unwrap();

    let mut fitter = Fitter::new(sine(), &data);
    fitter.fit(&[0.5]).unwrap();

    let popt = fitter.popt().unwrap();
    let perr = fitter.perr().unwrap();
    assert!(perr[0] > 0.0);
    assert!(
        (popt[0] - 1.0).abs() < 5.0 * perr[0],
        "amplitude {} not within 5 standard errors ({}) of 1.0",
        popt[0],
        perr[0]
    );

    // Matching noise and uncertainty: reduced chi-squared should sit near 1
    // and the p-value should be unremarkable.
    let stats = fitter.stats().unwrap();
    assert_eq!(stats.dof, 99);
    assert!(
        stats.reduced_chi2 > 0.5 && stats.reduced_chi2 < 2.0,
        "reduced chi2: {}",
        stats.reduced_chi2
    );
    assert!(stats.p_value > 0.0 && stats.p_value < 1.0);
}

#[test]
fn scenario_linear_data_with_both_uncertainties() {
    let x: Vec<f64> = (1..=10).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| v + 10.0).collect();
    let yerr: Vec<f64> = x.iter().map(|v| v / 10.0).collect();
    let xerr: Vec<f64> = x.iter().map(|v| v / 10.0).collect();

    let data = Dataset::with_xerr(x, y, yerr, xerr).unwrap();

    let (xd, yd, ye, xe) = data.unpack();
    assert_eq!(xd.len(), 10);
    assert_eq!(yd.len(), 10);
    assert_eq!(ye.len(), 10);
    assert_eq!(xe.as_ref().map(Vec::len), Some(10));
    assert_eq!(yd[0], 11.0);
}

#[test]
fn masking_restricts_the_fit_and_refitting_recovers() {
    // A clean line plus two wild outliers at the end.
    let x: Vec<f64> = (0..12).map(|i| i as f64).collect();
    let mut y: Vec<f64> = x.iter().map(|&xi| 3.0 + 0.5 * xi).collect();
    y[10] = 100.0;
    y[11] = -50.0;

    let mut data = Dataset::new(x, y, 0.2).unwrap();
    let mut mask = vec![true; 12];
    mask[10] = false;
    mask[11] = false;
    data.set_mask(&mask).unwrap();

    let line = FnCurve::new(2, |x: f64, p: &[f64]| p[0] + p[1] * x);
    let mut fitter = Fitter::new(line, &data);
    fitter.fit(&[0.0, 0.0]).unwrap();

    let outcome = fitter.outcome().unwrap();
    assert_eq!(outcome.yfit.len(), 10);
    assert!((outcome.popt[0] - 3.0).abs() < 1e-6);
    assert!((outcome.popt[1] - 0.5).abs() < 1e-6);

    // With the outliers masked away the fit is essentially perfect.
    let stats = fitter.stats().unwrap();
    assert_eq!(stats.dof, 8);
    assert!(stats.chi2 < 1e-9);
}

#[test]
fn refitting_with_a_different_start_overwrites_results() {
    let noise = NoiseSpec {
        sigma_y: 0.05,
        sigma_x: None,
        seed: 7,
    };
    let data = noisy_dataset(&sine(), &[1.0], 0.1, 6.2, 50, &noise).unwrap();

    let mut fitter = Fitter::new(sine(), &data);
    fitter.fit(&[0.2]).unwrap();
    let first = fitter.outcome().unwrap().clone();

    fitter.fit(&[4.0]).unwrap();
    let second = fitter.outcome().unwrap();

    // Both starts reach the same optimum; the stored outcome is the second
    // fit's, not a leftover of the first.
    assert!((first.popt[0] - second.popt[0]).abs() < 1e-6);
    assert_eq!(second.yfit.len(), 50);
}

#[test]
fn full_plot_handoff_is_observable_headlessly() {
    let x: Vec<f64> = (0..20).map(|i| 0.5 + i as f64).collect();
    let y: Vec<f64> = x.iter().map(|&xi| 2.0 * xi).collect();
    let data = Dataset::with_xerr(x, y, 0.5, 0.1).unwrap();

    let line = FnCurve::new(1, |x: f64, p: &[f64]| p[0] * x);
    let mut fitter = Fitter::new(line, &data);
    fitter.fit(&[1.0]).unwrap();

    let mut rec = RecordingPlot::new();
    fitter.plot_model(&mut rec, 80, "Fit", true).unwrap();
    fitter.plot_residuals(&mut rec).unwrap();

    assert_eq!(rec.calls.len(), 3);
    assert!(matches!(
        &rec.calls[0],
        PlotCall::Errorbar { x, xerr: Some(xe), label, .. }
            if x.len() == 20 && xe.len() == 20 && label == "Data"
    ));
    assert!(matches!(
        &rec.calls[1],
        PlotCall::Plot { x, label, .. } if x.len() == 80 && label == "Fit"
    ));
    assert!(matches!(
        &rec.calls[2],
        PlotCall::Residual { x, y, xerr: Some(_), .. }
            if x.len() == 20 && y.iter().all(|r| r.abs() < 1e-6)
    ));
}

#[test]
fn refit_after_mask_change_realigns_the_snapshot() {
    // The borrow checker already prevents mutating a dataset's mask while a
    // fitter borrows it, so the workflow is: fit, drop the fitter, adjust the
    // mask, fit again on the new selection.
    let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|&xi| 1.0 + xi).collect();
    let mut data = Dataset::new(x, y, 0.1).unwrap();
    data.set_mask(&[true; 10]).unwrap();

    let frozen = {
        let line = FnCurve::new(2, |x: f64, p: &[f64]| p[0] + p[1] * x);
        let mut fitter = Fitter::new(line, &data);
        fitter.fit(&[0.0, 0.0]).unwrap();
        fitter.outcome().unwrap().yfit.len()
    };
    assert_eq!(frozen, 10);

    let mut mask = vec![true; 10];
    mask[3] = false;
    data.set_mask(&mask).unwrap();

    let line = FnCurve::new(2, |x: f64, p: &[f64]| p[0] + p[1] * x);
    let mut fitter = Fitter::new(line, &data);
    fitter.fit(&[0.0, 0.0]).unwrap();
    assert_eq!(fitter.outcome().unwrap().yfit.len(), 9);
    assert!(fitter.stats().is_ok());
}

#[test]
fn gof_stats_serialize_round_trip() {
    let stats = GofStats {
        chi2: 12.5,
        dof: 9,
        reduced_chi2: 12.5 / 9.0,
        p_value: 0.19,
    };

    let json = serde_json::to_string(&stats).unwrap();
    let back: GofStats = serde_json::from_str(&json).unwrap();
    assert_eq!(stats, back);
}

#[test]
fn solver_failures_surface_as_errors() {
    let data = Dataset::new(vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0], 0.1).unwrap();
    let line = FnCurve::new(2, |x: f64, p: &[f64]| p[0] + p[1] * x);
    let mut fitter = Fitter::new(line, &data);

    assert!(matches!(
        fitter.fit(&[1.0]),
        Err(FitError::ParameterCount {
            expected: 2,
            actual: 1
        })
    ));
    assert!(!fitter.is_fitted());
}
