//! Common stuff

#![allow(dead_code)]

use num_traits::Num;
use std::ops::Neg;

/// Use 32-bit precision for floating point numbers.
pub type Float = f32;

/// Default signed integer to 32-bit.
pub type Int = i32;

/// Infinty (∞)
pub const INFINITY: Float = Float::INFINITY;

/// PI (π)
pub const PI: Float = std::f32::consts::PI;

/// 1/PI (1/π)
pub const INV_PI: Float = 1.0 / PI;

/// 2*PI (2π)
pub const TWO_PI: Float = PI * 2.0;

/// 1/2*PI (1/2π)
pub const INV_TWO_PI: Float = 1.0 / TWO_PI;

/// 4*PI (4π)
pub const FOUR_PI: Float = PI * 4.0;

/// Shadow Epsilon
pub const SHADOW_EPSILON: Float = 0.0001;

/// Epsilon floor for score-function denominators and weight normalization.
pub const DENOM_EPSILON: Float = 1e-8;

/// Returns the absolute value of a number.
///
/// * `n` - The number.
#[inline(always)]
pub fn abs<T>(n: T) -> T
where
    T: Num + Neg<Output = T> + PartialOrd + Copy,
{
    if n < T::zero() {
        -n
    } else {
        n
    }
}

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Clamps a value between a minimum and maximum value.
///
/// * `value` - The value to clamp.
/// * `low`   - Minimum value.
/// * `high`  - Maximum value.
#[inline(always)]
pub fn clamp<T>(value: T, low: T, high: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}

/// Linearly interpolate between two values.
///
/// * `t` - Interpolation parameter.
/// * `a` - Value at `t = 0`.
/// * `b` - Value at `t = 1`.
#[inline(always)]
pub fn lerp(t: Float, a: Float, b: Float) -> Float {
    (1.0 - t) * a + t * b
}

/// Solve the quadratic equation `a*t^2 + b*t + c = 0` and return the two
/// real roots in ascending order.
///
/// * `a` - Coefficient of the quadratic term.
/// * `b` - Coefficient of the linear term.
/// * `c` - Constant term.
pub fn quadratic(a: Float, b: Float, c: Float) -> Option<(Float, Float)> {
    let discrim = (b as f64) * (b as f64) - 4.0 * (a as f64) * (c as f64);
    if discrim < 0.0 {
        return None;
    }
    let root_discrim = discrim.sqrt();

    // Stable form from Numerical Recipes.
    let q = if (b as f64) < 0.0 {
        -0.5 * (b as f64 - root_discrim)
    } else {
        -0.5 * (b as f64 + root_discrim)
    };
    let t0 = (q / a as f64) as Float;
    let t1 = (c as f64 / q) as Float;
    if t0 <= t1 {
        Some((t0, t1))
    } else {
        Some((t1, t0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5, 0, 3), 3);
        assert_eq!(clamp(-1.0, 0.0, 3.0), 0.0);
        assert_eq!(clamp(2.0, 0.0, 3.0), 2.0);
    }

    #[test]
    fn quadratic_roots() {
        let (t0, t1) = quadratic(1.0, -3.0, 2.0).unwrap();
        assert!((t0 - 1.0).abs() < 1e-6);
        assert!((t1 - 2.0).abs() < 1e-6);
        assert!(quadratic(1.0, 0.0, 1.0).is_none());
    }
}
