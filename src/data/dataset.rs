//! Masked, uncertainty-aware dataset container.
//!
//! A [`Dataset`] owns four aligned rows (`x`, `y`, `yerr`, optional `xerr`)
//! plus an optional boolean mask. Shape invariants are validated eagerly at
//! construction; after that only the mask is mutable. Masking is a reversible
//! filter on the read accessors, never a destructive edit of the backing
//! arrays.

use std::fmt;

use crate::error::{FitError, Result};
use crate::plot::Plotter;
use crate::report::format_dataset_summary;

/// An uncertainty input: a scalar broadcast to every point, or one value per
/// point.
#[derive(Debug, Clone)]
pub enum Sigma {
    Scalar(f64),
    PerPoint(Vec<f64>),
}

impl From<f64> for Sigma {
    fn from(value: f64) -> Self {
        Sigma::Scalar(value)
    }
}

impl From<Vec<f64>> for Sigma {
    fn from(value: Vec<f64>) -> Self {
        Sigma::PerPoint(value)
    }
}

impl From<&[f64]> for Sigma {
    fn from(value: &[f64]) -> Self {
        Sigma::PerPoint(value.to_vec())
    }
}

impl Sigma {
    /// Resolve to a length-`n` row, broadcasting scalars.
    fn broadcast(self, n: usize, name: &'static str) -> Result<Vec<f64>> {
        match self {
            Sigma::Scalar(s) => Ok(vec![s; n]),
            Sigma::PerPoint(v) if v.len() == n => Ok(v),
            Sigma::PerPoint(v) => Err(FitError::ShapeMismatch {
                name,
                expected: n,
                actual: v.len(),
            }),
        }
    }
}

/// Paired x/y measurements with uncertainties and an optional mask.
///
/// The dataset exclusively owns its backing rows; constructors take owned
/// vectors, so callers cannot mutate the data behind its back.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Vec<f64>,
    y: Vec<f64>,
    yerr: Vec<f64>,
    xerr: Option<Vec<f64>>,
    mask: Option<Vec<bool>>,
}

impl Dataset {
    /// Build a dataset without x-uncertainties.
    ///
    /// `yerr` accepts a scalar (broadcast to every point) or a per-point
    /// vector. All rows must match `x`'s length.
    pub fn new(x: Vec<f64>, y: Vec<f64>, yerr: impl Into<Sigma>) -> Result<Self> {
        Self::build(x, y, yerr.into(), None)
    }

    /// Build a dataset carrying x-uncertainties as well.
    ///
    /// Whether a dataset has x-uncertainty is fixed at construction.
    pub fn with_xerr(
        x: Vec<f64>,
        y: Vec<f64>,
        yerr: impl Into<Sigma>,
        xerr: impl Into<Sigma>,
    ) -> Result<Self> {
        Self::build(x, y, yerr.into(), Some(xerr.into()))
    }

    fn build(x: Vec<f64>, y: Vec<f64>, yerr: Sigma, xerr: Option<Sigma>) -> Result<Self> {
        let n = x.len();
        if y.len() != n {
            return Err(FitError::ShapeMismatch {
                name: "y",
                expected: n,
                actual: y.len(),
            });
        }
        let yerr = yerr.broadcast(n, "yerr")?;
        let xerr = match xerr {
            Some(s) => Some(s.broadcast(n, "xerr")?),
            None => None,
        };

        Ok(Self {
            x,
            y,
            yerr,
            xerr,
            mask: None,
        })
    }

    /// Total number of points (ignoring the mask).
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of points currently selected by the mask (all of them if no
    /// mask is set).
    pub fn selected_len(&self) -> usize {
        match &self.mask {
            Some(mask) => mask.iter().filter(|&&keep| keep).count(),
            None => self.x.len(),
        }
    }

    /// Whether the dataset was constructed with x-uncertainties.
    pub fn has_xerr(&self) -> bool {
        self.xerr.is_some()
    }

    /// The current mask, if any.
    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    /// Replace the mask.
    ///
    /// The mask is a per-point boolean selector; its length must equal the
    /// dataset length. Setting a mask never copies or destroys the backing
    /// rows, it only changes what the read accessors return.
    pub fn set_mask(&mut self, mask: &[bool]) -> Result<()> {
        if mask.len() != self.x.len() {
            return Err(FitError::ShapeMismatch {
                name: "mask",
                expected: self.x.len(),
                actual: mask.len(),
            });
        }
        self.mask = Some(mask.to_vec());
        Ok(())
    }

    /// Remove the mask, restoring the full rows.
    pub fn clear_mask(&mut self) {
        self.mask = None;
    }

    /// Boolean selection preserving the original order.
    fn select(&self, row: &[f64]) -> Vec<f64> {
        match &self.mask {
            Some(mask) => row
                .iter()
                .zip(mask.iter())
                .filter_map(|(&v, &keep)| keep.then_some(v))
                .collect(),
            None => row.to_vec(),
        }
    }

    /// The masked x-row.
    pub fn xdata(&self) -> Vec<f64> {
        self.select(&self.x)
    }

    /// The masked y-row.
    pub fn ydata(&self) -> Vec<f64> {
        self.select(&self.y)
    }

    /// The masked y-uncertainty row.
    pub fn yerr(&self) -> Vec<f64> {
        self.select(&self.yerr)
    }

    /// The masked x-uncertainty row, or `None` if the dataset was built
    /// without x-uncertainties.
    ///
    /// Absence is explicit: callers must handle `None` rather than assume a
    /// zero-filled row.
    pub fn xerr(&self) -> Option<Vec<f64>> {
        self.xerr.as_deref().map(|row| self.select(row))
    }

    /// The four masked rows in fixed order: `(x, y, yerr, xerr)`.
    ///
    /// This is the single blessed read path for consumers (the fitter reads
    /// data only through here), so masking logic is not duplicated anywhere
    /// else.
    pub fn unpack(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>, Option<Vec<f64>>) {
        (self.xdata(), self.ydata(), self.yerr(), self.xerr())
    }

    /// Draw the masked data as an errorbar series on the given backend.
    pub fn plot_data(&self, plotter: &mut dyn Plotter, label: &str) -> Result<()> {
        let (x, y, yerr, xerr) = self.unpack();
        plotter.make_errorbar(&x, &y, &yerr, xerr.as_deref(), label)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_dataset_summary(self))
    }
}
