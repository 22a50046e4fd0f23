//! Mathematical utilities: least squares and line fitting.

pub mod ols;

pub use ols::*;
