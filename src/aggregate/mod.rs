//! Aggregation of the dataset into views.
//!
//! Responsibilities:
//!
//! - resolve key/value columns by name
//! - group rows and reduce them (sum, mean, identity)
//! - fit the regression line for scatter views

pub mod group;
pub mod view;

pub use group::*;
pub use view::*;
