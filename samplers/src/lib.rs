//! Samplers

mod independent;

// Re-export.
pub use independent::*;
