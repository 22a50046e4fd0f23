//! Core domain types (records, columns, views).
//!
//! This module is intentionally free of I/O and drawing logic.

pub mod types;
pub mod views;

pub use types::*;
pub use views::*;
