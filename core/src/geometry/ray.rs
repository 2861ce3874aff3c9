//! Rays

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::*;

/// A ray with an origin, a unit direction and a maximum extent. A ray is
/// immutable per bounce; each bounce spawns a replacement.
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction (unit length).
    pub d: Vector3f,

    /// Maximum extent of the ray.
    pub t_max: Float,
}

impl Ray {
    /// Creates a new `Ray`.
    ///
    /// * `o`     - Origin.
    /// * `d`     - Direction (unit length).
    /// * `t_max` - Maximum extent of the ray.
    pub fn new(o: Point3f, d: Vector3f, t_max: Float) -> Self {
        Self { o, d, t_max }
    }

    /// Returns the point at the given parametric distance along the ray.
    ///
    /// * `t` - Parametric distance.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

impl Default for Ray {
    /// Returns a degenerate ray along +z with unbounded extent.
    fn default() -> Self {
        Self::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), INFINITY)
    }
}
