//! Text reports for the batch commands.

mod format;

pub use format::*;
