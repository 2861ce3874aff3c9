//! Dual vectors and spectra

#![allow(dead_code)]

use super::AdFloat;
use crate::base::*;
use crate::geometry::*;
use crate::spectrum::*;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A 3-D vector of differentiable scalars.
#[derive(Copy, Clone)]
pub struct AdVector3<'t> {
    /// X-coordinate.
    pub x: AdFloat<'t>,

    /// Y-coordinate.
    pub y: AdFloat<'t>,

    /// Z-coordinate.
    pub z: AdFloat<'t>,
}

impl<'t> AdVector3<'t> {
    /// Creates a new dual vector from components.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: AdFloat<'t>, y: AdFloat<'t>, z: AdFloat<'t>) -> Self {
        Self { x, y, z }
    }

    /// A detached copy of a plain vector.
    ///
    /// * `v` - The vector.
    pub fn constant(v: Vector3f) -> Self {
        Self::new(
            AdFloat::constant(v.x),
            AdFloat::constant(v.y),
            AdFloat::constant(v.z),
        )
    }

    /// The primal value.
    pub fn value(&self) -> Vector3f {
        Vector3f::new(self.x.value(), self.y.value(), self.z.value())
    }

    /// A value-only copy.
    pub fn detach(&self) -> Self {
        Self::constant(self.value())
    }

    /// Dot product with another dual vector.
    ///
    /// * `other` - The other vector.
    pub fn dot(&self, other: &Self) -> AdFloat<'t> {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Dot product with a plain (detached) vector.
    ///
    /// * `other` - The other vector.
    pub fn dot_v(&self, other: &Vector3f) -> AdFloat<'t> {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length of the vector.
    pub fn length(&self) -> AdFloat<'t> {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction.
    pub fn normalize(&self) -> Self {
        let inv_len = AdFloat::constant(1.0) / self.length();
        *self * inv_len
    }

    /// Express this world-space direction in a (detached) shading frame.
    ///
    /// * `frame` - The shading frame.
    pub fn to_local(&self, frame: &Frame) -> Self {
        Self::new(
            self.dot_v(&frame.s),
            self.dot_v(&frame.t),
            self.dot_v(&frame.n),
        )
    }
}

impl<'t> Add for AdVector3<'t> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl<'t> Sub for AdVector3<'t> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<'t> Mul<AdFloat<'t>> for AdVector3<'t> {
    type Output = Self;

    fn mul(self, f: AdFloat<'t>) -> Self {
        Self::new(self.x * f, self.y * f, self.z * f)
    }
}

impl<'t> Mul<Float> for AdVector3<'t> {
    type Output = Self;

    fn mul(self, f: Float) -> Self {
        Self::new(self.x * f, self.y * f, self.z * f)
    }
}

impl<'t> Neg for AdVector3<'t> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// A 2-D point of differentiable scalars (image-plane positions).
#[derive(Copy, Clone)]
pub struct AdPoint2<'t> {
    /// X-coordinate.
    pub x: AdFloat<'t>,

    /// Y-coordinate.
    pub y: AdFloat<'t>,
}

impl<'t> AdPoint2<'t> {
    /// Creates a new dual point from components.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    pub fn new(x: AdFloat<'t>, y: AdFloat<'t>) -> Self {
        Self { x, y }
    }

    /// A detached copy of a plain point.
    ///
    /// * `p` - The point.
    pub fn constant(p: Point2f) -> Self {
        Self::new(AdFloat::constant(p.x), AdFloat::constant(p.y))
    }

    /// The primal value.
    pub fn value(&self) -> Point2f {
        Point2f::new(self.x.value(), self.y.value())
    }
}

/// A spectrum of differentiable scalars.
#[derive(Copy, Clone)]
pub struct AdSpectrum<'t> {
    /// The sampled spectral values.
    pub c: [AdFloat<'t>; SPECTRUM_SAMPLES],
}

impl<'t> AdSpectrum<'t> {
    /// A detached zero spectrum.
    pub fn zero() -> Self {
        Self::constant(Spectrum::ZERO)
    }

    /// A detached copy of a plain spectrum.
    ///
    /// * `s` - The spectrum.
    pub fn constant(s: Spectrum) -> Self {
        Self {
            c: [
                AdFloat::constant(s.c[0]),
                AdFloat::constant(s.c[1]),
                AdFloat::constant(s.c[2]),
            ],
        }
    }

    /// Creates a new dual spectrum from channels.
    ///
    /// * `c` - The channels.
    pub fn new(c: [AdFloat<'t>; SPECTRUM_SAMPLES]) -> Self {
        Self { c }
    }

    /// The primal value.
    pub fn value(&self) -> Spectrum {
        Spectrum::from_rgb(self.c[0].value(), self.c[1].value(), self.c[2].value())
    }

    /// A value-only copy.
    pub fn detach(&self) -> Self {
        Self::constant(self.value())
    }

    /// True if the primal value is 0 in every channel.
    pub fn is_black(&self) -> bool {
        self.value().is_black()
    }

    /// Per-channel lower clamp against a constant floor.
    ///
    /// * `floor` - The floor.
    pub fn max(&self, floor: Float) -> Self {
        Self::new([
            self.c[0].max(floor),
            self.c[1].max(floor),
            self.c[2].max(floor),
        ])
    }

    /// Scale every channel by a differentiable scalar.
    ///
    /// * `f` - The scalar.
    pub fn scale(&self, f: AdFloat<'t>) -> Self {
        Self::new([self.c[0] * f, self.c[1] * f, self.c[2] * f])
    }
}

impl<'t> Add for AdSpectrum<'t> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new([
            self.c[0] + other.c[0],
            self.c[1] + other.c[1],
            self.c[2] + other.c[2],
        ])
    }
}

impl<'t> AddAssign for AdSpectrum<'t> {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<'t> Sub for AdSpectrum<'t> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new([
            self.c[0] - other.c[0],
            self.c[1] - other.c[1],
            self.c[2] - other.c[2],
        ])
    }
}

impl<'t> SubAssign for AdSpectrum<'t> {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl<'t> Mul for AdSpectrum<'t> {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self::new([
            self.c[0] * other.c[0],
            self.c[1] * other.c[1],
            self.c[2] * other.c[2],
        ])
    }
}

impl<'t> Mul<Spectrum> for AdSpectrum<'t> {
    type Output = Self;

    fn mul(self, other: Spectrum) -> Self {
        Self::new([
            self.c[0] * other.c[0],
            self.c[1] * other.c[1],
            self.c[2] * other.c[2],
        ])
    }
}

impl<'t> Mul<Float> for AdSpectrum<'t> {
    type Output = Self;

    fn mul(self, f: Float) -> Self {
        Self::new([self.c[0] * f, self.c[1] * f, self.c[2] * f])
    }
}

impl<'t> Div for AdSpectrum<'t> {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        Self::new([
            self.c[0] / other.c[0],
            self.c[1] / other.c[1],
            self.c[2] / other.c[2],
        ])
    }
}

impl<'t> From<Spectrum> for AdSpectrum<'t> {
    fn from(s: Spectrum) -> Self {
        Self::constant(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::Tape;
    use float_cmp::approx_eq;

    #[test]
    fn normalize_is_unit_length() {
        let v = AdVector3::constant(Vector3f::new(1.0, -2.0, 0.5));
        assert!(approx_eq!(Float, v.normalize().length().value(), 1.0, epsilon = 1e-6));
    }

    #[test]
    fn attached_direction_derivative() {
        // d/dt |(1 + t, 0, 0)| at t = 0 is 1.
        let tape = Tape::new();
        let t = tape.input(0.0);
        let v = AdVector3::new(t + 1.0, AdFloat::constant(0.0), AdFloat::constant(0.0));
        let len = v.length();
        let mut grads = vec![0.0; 1];
        tape.backward(&[(len.node_id().unwrap(), 1.0)], &mut grads);
        assert!(approx_eq!(Float, grads[0], 1.0, epsilon = 1e-5));
    }

    #[test]
    fn spectrum_ratio_score() {
        // f = a / max(eps, detach(a)) has value 1 and derivative 1/a.
        let tape = Tape::new();
        let a = tape.input(0.25);
        let s = AdSpectrum::new([a, a, a]);
        let ratio = s / s.detach().max(1e-8);
        assert!(approx_eq!(Float, ratio.value().c[0], 1.0, epsilon = 1e-6));
        let mut grads = vec![0.0; 1];
        tape.backward(&[(ratio.c[0].node_id().unwrap(), 1.0)], &mut grads);
        assert!(approx_eq!(Float, grads[0], 4.0, epsilon = 1e-4));
    }
}
