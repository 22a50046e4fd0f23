//! `bike-dashboard` library crate.
//!
//! The binary (`bike`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the load -> aggregate -> render pipeline is shared by the TUI and the
//!   batch commands

pub mod aggregate;
pub mod app;
pub mod chart;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod report;
pub mod tui;
