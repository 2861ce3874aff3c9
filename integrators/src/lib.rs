//! Integrators

#[macro_use]
extern crate log;

mod common;
mod prb_reparam;
mod reparam;

// Re-export.
pub use common::*;
pub use prb_reparam::*;
pub use reparam::*;
