//! Mathematical utilities: sampling grids and the weighted least-squares solver.

pub mod grid;
pub mod lm;
pub mod lsq;

pub use grid::*;
pub use lm::*;
pub use lsq::*;
