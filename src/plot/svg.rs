//! Plotters-powered SVG backend.
//!
//! Series accumulate through the [`Plotter`] calls; [`SvgPlot::save`] draws
//! everything into one chart and writes the file. The SVG backend keeps the
//! dependency footprint small (no native font rasterization needed).

use std::path::PathBuf;

use plotters::prelude::*;

use crate::error::{FitError, Result};
use crate::plot::Plotter;

#[derive(Debug, Clone)]
enum Series {
    Curve {
        points: Vec<(f64, f64)>,
        label: String,
    },
    ErrorBars {
        x: Vec<f64>,
        y: Vec<f64>,
        yerr: Vec<f64>,
        xerr: Option<Vec<f64>>,
        label: String,
    },
    ZeroLine,
}

/// A [`Plotter`] writing an SVG chart to disk on [`save`](SvgPlot::save).
pub struct SvgPlot {
    path: PathBuf,
    width: u32,
    height: u32,
    series: Vec<Series>,
}

impl SvgPlot {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width: width.max(100),
            height: height.max(100),
            series: Vec::new(),
        }
    }

    /// Render every accumulated series and write the SVG file.
    pub fn save(&self) -> Result<()> {
        let ((x0, x1), (y0, y1)) = self.ranges()?;

        let root = SVGBackend::new(&self.path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 30)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(plot_err)?;

        chart.configure_mesh().draw().map_err(plot_err)?;

        let palette = [BLUE, RED, GREEN, MAGENTA, CYAN];
        let mut color_idx = 0usize;

        for s in &self.series {
            match s {
                Series::ZeroLine => {
                    chart
                        .draw_series(std::iter::once(PathElement::new(
                            vec![(x0, 0.0), (x1, 0.0)],
                            BLACK.stroke_width(1),
                        )))
                        .map_err(plot_err)?;
                }
                Series::Curve { points, label } => {
                    let color = palette[color_idx % palette.len()];
                    color_idx += 1;
                    let anno = chart
                        .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                        .map_err(plot_err)?;
                    if !label.is_empty() {
                        anno.label(label.clone()).legend(move |(lx, ly)| {
                            PathElement::new(vec![(lx, ly), (lx + 16, ly)], color.stroke_width(2))
                        });
                    }
                }
                Series::ErrorBars {
                    x,
                    y,
                    yerr,
                    xerr,
                    label,
                } => {
                    let color = palette[color_idx % palette.len()];
                    color_idx += 1;

                    let mut whiskers = Vec::new();
                    for i in 0..x.len() {
                        whiskers.push(PathElement::new(
                            vec![(x[i], y[i] - yerr[i]), (x[i], y[i] + yerr[i])],
                            color.stroke_width(1),
                        ));
                        if let Some(xe) = xerr {
                            whiskers.push(PathElement::new(
                                vec![(x[i] - xe[i], y[i]), (x[i] + xe[i], y[i])],
                                color.stroke_width(1),
                            ));
                        }
                    }
                    chart.draw_series(whiskers).map_err(plot_err)?;

                    let anno = chart
                        .draw_series(
                            x.iter()
                                .zip(y.iter())
                                .map(|(&xi, &yi)| Circle::new((xi, yi), 3, color.filled())),
                        )
                        .map_err(plot_err)?;
                    if !label.is_empty() {
                        anno.label(label.clone()).legend(move |(lx, ly)| {
                            Circle::new((lx + 8, ly), 3, color.filled())
                        });
                    }
                }
            }
        }

        if self.has_labels() {
            chart
                .configure_series_labels()
                .border_style(BLACK)
                .background_style(WHITE.mix(0.8))
                .draw()
                .map_err(plot_err)?;
        }

        root.present().map_err(plot_err)
    }

    fn has_labels(&self) -> bool {
        self.series.iter().any(|s| match s {
            Series::Curve { label, .. } | Series::ErrorBars { label, .. } => !label.is_empty(),
            Series::ZeroLine => false,
        })
    }

    /// Data extents over every series, error bars included.
    fn ranges(&self) -> Result<((f64, f64), (f64, f64))> {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;

        for s in &self.series {
            match s {
                Series::Curve { points, .. } => {
                    for &(x, y) in points {
                        x_min = x_min.min(x);
                        x_max = x_max.max(x);
                        y_min = y_min.min(y);
                        y_max = y_max.max(y);
                    }
                }
                Series::ErrorBars { x, y, yerr, xerr, .. } => {
                    for i in 0..x.len() {
                        let xe = xerr.as_ref().map(|v| v[i]).unwrap_or(0.0);
                        x_min = x_min.min(x[i] - xe);
                        x_max = x_max.max(x[i] + xe);
                        y_min = y_min.min(y[i] - yerr[i]);
                        y_max = y_max.max(y[i] + yerr[i]);
                    }
                }
                Series::ZeroLine => {
                    y_min = y_min.min(0.0);
                    y_max = y_max.max(0.0);
                }
            }
        }

        if !(x_min.is_finite() && x_max.is_finite() && y_min.is_finite() && y_max.is_finite())
            || x_max <= x_min
        {
            return Err(FitError::Plot(
                "nothing to draw: no finite series extents".to_string(),
            ));
        }
        if y_max <= y_min {
            y_max = y_min + 1.0;
        }

        let x_pad = (x_max - x_min) * 0.05;
        let y_pad = (y_max - y_min) * 0.05;
        Ok((
            (x_min - x_pad, x_max + x_pad),
            (y_min - y_pad, y_max + y_pad),
        ))
    }
}

impl Plotter for SvgPlot {
    fn make_plot(&mut self, x: &[f64], y: &[f64], label: &str) -> Result<()> {
        self.series.push(Series::Curve {
            points: x.iter().copied().zip(y.iter().copied()).collect(),
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
        self.series.push(Series::ErrorBars {
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
        self.series.push(Series::ZeroLine);
        self.make_errorbar(x, y, yerr, xerr, "")
    }
}

fn plot_err(e: impl std::fmt::Display) -> FitError {
    FitError::Plot(e.to_string())
}
