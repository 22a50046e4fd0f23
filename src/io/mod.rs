//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - view tables, JSON bundle and SVG charts (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
