//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - data points: `o`
//! - fitted curve: `-` line
//! - residual zero baseline: dashed `-`
//!
//! Series accumulate through the [`Plotter`] calls; [`AsciiPlot::render`]
//! produces the final string.

use crate::error::Result;
use crate::plot::Plotter;

#[derive(Debug, Clone)]
enum Series {
    Curve { points: Vec<(f64, f64)>, label: String },
    Points { points: Vec<(f64, f64)>, label: String },
    ZeroLine,
}

/// A [`Plotter`] rendering into a fixed-size character grid.
#[derive(Debug)]
pub struct AsciiPlot {
    width: usize,
    height: usize,
    series: Vec<Series>,
}

impl AsciiPlot {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(10),
            height: height.max(5),
            series: Vec::new(),
        }
    }

    /// Render everything accumulated so far.
    pub fn render(&self) -> String {
        let (x_min, x_max) = self.x_range().unwrap_or((0.0, 1.0));
        let (y_min, y_max) = self.y_range().unwrap_or((0.0, 1.0));
        let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

        let mut grid = vec![vec![' '; self.width]; self.height];

        // Curves and baselines first, so points can overlay them.
        for s in &self.series {
            match s {
                Series::ZeroLine => {
                    if y_min <= 0.0 && 0.0 <= y_max {
                        let row = map_y(0.0, y_min, y_max, self.height);
                        for (col, cell) in grid[row].iter_mut().enumerate() {
                            if col % 2 == 0 && *cell == ' ' {
                                *cell = '-';
                            }
                        }
                    }
                }
                Series::Curve { points, .. } => {
                    draw_curve(&mut grid, points, x_min, x_max, y_min, y_max);
                }
                Series::Points { .. } => {}
            }
        }
        for s in &self.series {
            if let Series::Points { points, .. } = s {
                for &(x, y) in points {
                    let col = map_x(x, x_min, x_max, self.width);
                    let row = map_y(y, y_min, y_max, self.height);
                    grid[row][col] = 'o';
                }
            }
        }

        // Header with ranges plus a small legend of labeled series.
        let mut out = String::new();
        out.push_str(&format!(
            "Plot: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.3}, {y_max:.3}]\n"
        ));
        let legend = self.legend();
        if !legend.is_empty() {
            out.push_str(&legend);
            out.push('\n');
        }

        for row in grid {
            out.push_str(&row.into_iter().collect::<String>());
            out.push('\n');
        }

        out
    }

    fn legend(&self) -> String {
        let mut parts = Vec::new();
        for s in &self.series {
            match s {
                Series::Curve { label, .. } if !label.is_empty() => {
                    parts.push(format!("- {label}"));
                }
                Series::Points { label, .. } if !label.is_empty() => {
                    parts.push(format!("o {label}"));
                }
                _ => {}
            }
        }
        parts.join(" | ")
    }

    fn x_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for s in &self.series {
            if let Series::Curve { points, .. } | Series::Points { points, .. } = s {
                for &(x, _) in points {
                    min = min.min(x);
                    max = max.max(x);
                }
            }
        }
        (min.is_finite() && max.is_finite() && max > min).then_some((min, max))
    }

    fn y_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for s in &self.series {
            if let Series::Curve { points, .. } | Series::Points { points, .. } = s {
                for &(_, y) in points {
                    min = min.min(y);
                    max = max.max(y);
                }
            }
        }
        (min.is_finite() && max.is_finite() && max > min).then_some((min, max))
    }
}

impl Plotter for AsciiPlot {
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
        _yerr: &[f64],
        _xerr: Option<&[f64]>,
        label: &str,
    ) -> Result<()> {
        // Error bars are below the resolution of a character grid; points
        // carry the information that matters here.
        self.series.push(Series::Points {
            points: x.iter().copied().zip(y.iter().copied()).collect(),
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

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, '-');
        } else {
            grid[row][col] = '-';
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
