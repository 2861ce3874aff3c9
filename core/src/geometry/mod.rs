//! Geometry

mod frame;
mod point2;
mod ray;
mod vector3;

// Re-export.
pub use frame::*;
pub use point2::*;
pub use ray::*;
pub use vector3::*;
