//! Sampling

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::*;

/// Map a unit-square sample to a cosine-weighted direction on the local
/// hemisphere (z up). The associated pdf is `cos_theta / π`.
///
/// * `u` - Unit-square sample.
pub fn square_to_cosine_hemisphere(u: &Point2f) -> Vector3f {
    let r = u.x.sqrt();
    let phi = TWO_PI * u.y;
    let z = (1.0 - u.x).max(0.0).sqrt();
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Pdf of `square_to_cosine_hemisphere` for a local direction.
///
/// * `w` - Local direction.
pub fn cosine_hemisphere_pdf(w: &Vector3f) -> Float {
    if w.z > 0.0 {
        w.z * INV_PI
    } else {
        0.0
    }
}

/// Map a unit-square sample to a uniform direction on the sphere.
///
/// * `u` - Unit-square sample.
pub fn square_to_uniform_sphere(u: &Point2f) -> Vector3f {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = TWO_PI * u.y;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Map a unit-square sample to a von Mises-Fisher direction around the
/// given axis. Larger `kappa` concentrates samples toward the axis.
///
/// * `u`     - Unit-square sample.
/// * `axis`  - Mean direction (unit length).
/// * `kappa` - Concentration.
pub fn square_to_vmf(u: &Point2f, axis: &Vector3f, kappa: Float) -> Vector3f {
    // Inversion of the vMF CDF in cos(theta), stable for large kappa. The
    // log argument is floored: u.x can be exactly 0 while exp(-2 kappa)
    // underflows, and ln(0) would poison the direction.
    let cos_theta = if kappa < 1e-3 {
        1.0 - 2.0 * u.x
    } else {
        let arg = max(u.x + (1.0 - u.x) * (-2.0 * kappa).exp(), Float::MIN_POSITIVE);
        1.0 + arg.ln() / kappa
    };
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = TWO_PI * u.y;
    let local = Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

    let frame = Frame::from_normal(axis);
    frame.to_world(&local).normalize()
}
