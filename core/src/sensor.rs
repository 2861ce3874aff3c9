//! Sensor

#![allow(dead_code)]

use crate::autodiff::*;
use crate::base::*;
use crate::film::*;
use crate::geometry::*;
use crate::spectrum::*;

/// Pinhole perspective sensor. Generates primary rays from raster
/// positions and, for the splatting passes, projects world points back to
/// differentiable raster positions.
pub struct Sensor {
    /// Camera position.
    origin: Point3f,

    /// Camera-space right axis.
    right: Vector3f,

    /// Camera-space up axis.
    up: Vector3f,

    /// Camera-space forward axis (view direction).
    forward: Vector3f,

    /// Tangent of half the vertical field of view.
    tan_half_fov: Float,

    /// Film aspect ratio (width over height).
    aspect: Float,

    /// The film.
    film: Film,
}

impl Sensor {
    /// Create a perspective sensor looking from `origin` toward `target`.
    ///
    /// * `origin` - Camera position.
    /// * `target` - Point the camera looks at.
    /// * `up`     - Up vector hint.
    /// * `fov_y`  - Vertical field of view in degrees.
    /// * `film`   - The film.
    pub fn new(origin: Point3f, target: Point3f, up: Vector3f, fov_y: Float, film: Film) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward);
        let res = film.resolution();
        Self {
            origin,
            right,
            up,
            forward,
            tan_half_fov: (fov_y.to_radians() * 0.5).tan(),
            aspect: res.x as Float / res.y as Float,
            film,
        }
    }

    /// The film.
    pub fn film(&self) -> &Film {
        &self.film
    }

    /// Camera position.
    pub fn origin(&self) -> Point3f {
        self.origin
    }

    /// Generate the primary ray through a raster position. Positions in
    /// the film's sample border fall outside `[0, resolution)` and still
    /// produce valid rays.
    ///
    /// * `pos` - Raster position (pixel centers at half-integers).
    pub fn sample_ray(&self, pos: &Point2f) -> (Ray, Spectrum) {
        let res = self.film.resolution();
        let x_ndc = 2.0 * (pos.x / res.x as Float) - 1.0;
        let y_ndc = 1.0 - 2.0 * (pos.y / res.y as Float);
        let d = self.right * (x_ndc * self.tan_half_fov * self.aspect)
            + self.up * (y_ndc * self.tan_half_fov)
            + self.forward;
        (Ray::new(self.origin, d.normalize(), INFINITY), Spectrum::ONE)
    }

    /// Project a world point to its raster position, keeping the result
    /// differentiable in the point. The weight is 0 for points behind the
    /// camera and 1 otherwise.
    ///
    /// * `p` - World point (attached).
    pub fn sample_direction<'t>(&self, p: &AdVector3<'t>) -> (AdPoint2<'t>, AdFloat<'t>) {
        let d = *p - AdVector3::constant(self.origin);
        let x_cam = d.dot_v(&self.right);
        let y_cam = d.dot_v(&self.up);
        let z_cam = d.dot_v(&self.forward);
        if z_cam.value() <= DENOM_EPSILON {
            return (AdPoint2::constant(Point2f::zero()), AdFloat::constant(0.0));
        }

        let res = self.film.resolution();
        let inv_span_x = 1.0 / (self.tan_half_fov * self.aspect);
        let inv_span_y = 1.0 / self.tan_half_fov;
        let x_ndc = (x_cam / z_cam) * inv_span_x;
        let y_ndc = (y_cam / z_cam) * inv_span_y;
        let pos_x = (x_ndc + 1.0) * (0.5 * res.x as Float);
        let pos_y = (-y_ndc + 1.0) * (0.5 * res.y as Float);
        (AdPoint2::new(pos_x, pos_y), AdFloat::constant(1.0))
    }
}
