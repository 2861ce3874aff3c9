//! Surface Interaction

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::*;

/// Information about a ray/surface intersection: the hit position, the
/// shading frame, the incident direction in that frame, and back-references
/// into the scene. Invalid interactions represent rays that escaped.
#[derive(Copy, Clone, Debug)]
pub struct SurfaceInteraction {
    /// Hit point.
    pub p: Point3f,

    /// Geometric normal (unit length, outward facing).
    pub n: Vector3f,

    /// Shading frame with `n` along the local z-axis.
    pub frame: Frame,

    /// Incident direction in the shading frame, pointing away from the
    /// surface toward the ray origin.
    pub wi: Vector3f,

    /// Parametric distance along the ray.
    pub t: Float,

    /// Index of the hit shape in the scene.
    pub shape: usize,

    /// Whether this interaction is a real hit.
    pub valid: bool,
}

impl SurfaceInteraction {
    /// Create an interaction for a hit.
    ///
    /// * `p`     - Hit point.
    /// * `n`     - Geometric normal.
    /// * `t`     - Parametric distance along the ray.
    /// * `shape` - Index of the hit shape.
    /// * `ray_d` - World-space ray direction.
    pub fn new(p: Point3f, n: Vector3f, t: Float, shape: usize, ray_d: &Vector3f) -> Self {
        let frame = Frame::from_normal(&n);
        let wi = frame.to_local(&-*ray_d);
        Self {
            p,
            n,
            frame,
            wi,
            t,
            shape,
            valid: true,
        }
    }

    /// Spawn a ray from the hit point in the given world-space direction,
    /// offset along the normal to avoid self-intersection.
    ///
    /// * `d` - World-space direction (unit length).
    pub fn spawn_ray(&self, d: &Vector3f) -> Ray {
        let offset = if d.dot(&self.n) >= 0.0 {
            self.n * SHADOW_EPSILON
        } else {
            -self.n * SHADOW_EPSILON
        };
        Ray::new(self.p + offset, *d, INFINITY)
    }

    /// Spawn a ray toward a target point, clipped just before it so a
    /// visibility test does not hit the target itself.
    ///
    /// * `target` - Target point.
    pub fn spawn_ray_to(&self, target: &Point3f) -> Ray {
        let to = *target - self.p;
        let dist = to.length();
        let d = to / dist;
        let mut ray = self.spawn_ray(&d);
        ray.t_max = dist * (1.0 - SHADOW_EPSILON * 10.0);
        ray
    }
}

impl Default for SurfaceInteraction {
    /// An invalid interaction (ray escaped).
    fn default() -> Self {
        Self {
            p: Point3f::zero(),
            n: Vector3f::new(0.0, 0.0, 1.0),
            frame: Frame::default(),
            wi: Vector3f::zero(),
            t: INFINITY,
            shape: usize::MAX,
            valid: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wi_points_back_along_ray() {
        let d = Vector3f::new(0.0, 0.0, -1.0);
        let si = SurfaceInteraction::new(
            Point3f::zero(),
            Vector3f::new(0.0, 0.0, 1.0),
            1.0,
            0,
            &d,
        );
        // Incident direction is up the normal in local coordinates.
        assert!(si.wi.z > 0.99);
    }

    #[test]
    fn spawn_ray_offsets_origin() {
        let d = Vector3f::new(0.0, 0.0, -1.0);
        let si = SurfaceInteraction::new(
            Point3f::zero(),
            Vector3f::new(0.0, 0.0, 1.0),
            1.0,
            0,
            &d,
        );
        let r = si.spawn_ray(&Vector3f::new(0.0, 0.0, 1.0));
        assert!(r.o.z > 0.0);
    }
}
