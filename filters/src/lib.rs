//! Filters

mod boxf; // box is reserved keyword
mod gaussian;
mod triangle;

// Re-export.
pub use boxf::*;
pub use gaussian::*;
pub use triangle::*;
