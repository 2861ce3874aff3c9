//! Shading Frames

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::*;

/// An orthonormal shading frame with the surface normal along the local
/// z-axis.
#[derive(Copy, Clone, Debug)]
pub struct Frame {
    /// First tangent.
    pub s: Vector3f,

    /// Second tangent.
    pub t: Vector3f,

    /// Normal.
    pub n: Vector3f,
}

impl Frame {
    /// Construct a frame from a unit normal.
    ///
    /// * `n` - The normal.
    pub fn from_normal(n: &Vector3f) -> Self {
        let (s, t) = coordinate_system(n);
        Self { s, t, n: *n }
    }

    /// Convert a world-space direction to the local frame.
    ///
    /// * `v` - The direction.
    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.s), v.dot(&self.t), v.dot(&self.n))
    }

    /// Convert a local direction to world space.
    ///
    /// * `v` - The direction.
    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.s * v.x + self.t * v.y + self.n * v.z
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::from_normal(&Vector3f::new(0.0, 0.0, 1.0))
    }
}

/// Cosine of the angle between a local direction and the frame normal.
///
/// * `w` - Direction in the local frame.
#[inline(always)]
pub fn cos_theta(w: &Vector3f) -> Float {
    w.z
}
