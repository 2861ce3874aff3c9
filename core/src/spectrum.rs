//! Spectrum

#![allow(dead_code)]

use crate::base::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Neg, Sub, SubAssign};

/// Number of samples used in `Spectrum`.
pub const SPECTRUM_SAMPLES: usize = 3;

/// RGB spectrum with 3 samples.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RGBSpectrum {
    /// The sampled spectral values.
    pub c: [Float; SPECTRUM_SAMPLES],
}

/// Default to using `RGBSpectrum` for rendering.
pub type Spectrum = RGBSpectrum;

impl RGBSpectrum {
    /// Spectrum with all samples 0.
    pub const ZERO: Self = Self { c: [0.0; SPECTRUM_SAMPLES] };

    /// Spectrum with all samples 1.
    pub const ONE: Self = Self { c: [1.0; SPECTRUM_SAMPLES] };

    /// Creates a new `RGBSpectrum` with a constant value across all samples.
    ///
    /// * `v` - Constant sample value.
    pub fn new(v: Float) -> Self {
        Self { c: [v; SPECTRUM_SAMPLES] }
    }

    /// Creates a new `RGBSpectrum` from RGB values.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Returns true if all samples are 0.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|v| *v == 0.0)
    }

    /// Returns true if any sample is NaN.
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    /// Returns the maximum sample value.
    pub fn max_component_value(&self) -> Float {
        self.c.iter().fold(-INFINITY, |m, v| max(m, *v))
    }

    /// Returns the luminance of the spectrum.
    pub fn y(&self) -> Float {
        0.212671 * self.c[0] + 0.715160 * self.c[1] + 0.072169 * self.c[2]
    }

    /// Returns the sum of all samples.
    pub fn sum(&self) -> Float {
        self.c.iter().sum()
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            c: [
                self.c[0] + other.c[0],
                self.c[1] + other.c[1],
                self.c[2] + other.c[2],
            ],
        }
    }
}

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for RGBSpectrum {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            c: [
                self.c[0] - other.c[0],
                self.c[1] - other.c[1],
                self.c[2] - other.c[2],
            ],
        }
    }
}

impl SubAssign for RGBSpectrum {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Mul for RGBSpectrum {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self {
            c: [
                self.c[0] * other.c[0],
                self.c[1] * other.c[1],
                self.c[2] * other.c[2],
            ],
        }
    }
}

impl MulAssign for RGBSpectrum {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    fn mul(self, f: Float) -> Self {
        Self {
            c: [self.c[0] * f, self.c[1] * f, self.c[2] * f],
        }
    }
}

impl Mul<RGBSpectrum> for Float {
    type Output = RGBSpectrum;

    fn mul(self, s: RGBSpectrum) -> RGBSpectrum {
        s * self
    }
}

impl MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, f: Float) {
        *self = *self * f;
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    fn div(self, f: Float) -> Self {
        debug_assert!(f != 0.0);
        Self {
            c: [self.c[0] / f, self.c[1] / f, self.c[2] / f],
        }
    }
}

impl DivAssign<Float> for RGBSpectrum {
    fn div_assign(&mut self, f: Float) {
        *self = *self / f;
    }
}

impl Neg for RGBSpectrum {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            c: [-self.c[0], -self.c[1], -self.c[2]],
        }
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

impl fmt::Display for RGBSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.c[0], self.c[1], self.c[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black() {
        assert!(Spectrum::ZERO.is_black());
        assert!(!Spectrum::new(0.1).is_black());
    }

    #[test]
    fn arithmetic() {
        let a = Spectrum::from_rgb(1.0, 2.0, 3.0);
        let b = Spectrum::from_rgb(0.5, 0.5, 0.5);
        assert_eq!(a * b, Spectrum::from_rgb(0.5, 1.0, 1.5));
        assert_eq!(a + b, Spectrum::from_rgb(1.5, 2.5, 3.5));
        assert_eq!((a - b).c, [0.5, 1.5, 2.5]);
        assert_eq!((a / 2.0).c, [0.5, 1.0, 1.5]);
        assert_eq!(a.max_component_value(), 3.0);
    }
}
