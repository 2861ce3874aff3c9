//! Dual scalars

#![allow(dead_code)]

use super::{Tape, NO_PARENT};
use crate::base::*;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A differentiable scalar: a primal value plus an optional handle into a
/// recording tape. Detached values (no handle) behave exactly like plain
/// floats and record nothing.
#[derive(Copy, Clone)]
pub struct AdFloat<'t> {
    value: Float,
    node: u32,
    tape: Option<&'t Tape>,
}

impl<'t> AdFloat<'t> {
    /// A detached constant.
    ///
    /// * `value` - The value.
    pub fn constant(value: Float) -> Self {
        Self {
            value,
            node: NO_PARENT,
            tape: None,
        }
    }

    pub(crate) fn attached(tape: &'t Tape, node: u32, value: Float) -> Self {
        Self {
            value,
            node,
            tape: Some(tape),
        }
    }

    /// The primal value.
    pub fn value(&self) -> Float {
        self.value
    }

    /// The recorded node, if attached.
    pub fn node_id(&self) -> Option<u32> {
        self.tape.map(|_| self.node)
    }

    /// True if this value participates in differentiation.
    pub fn is_attached(&self) -> bool {
        self.tape.is_some()
    }

    /// A value-only copy that records nothing.
    pub fn detach(&self) -> Self {
        Self::constant(self.value)
    }

    fn unary(&self, value: Float, d: Float) -> Self {
        match self.tape {
            Some(tape) => Self::attached(tape, tape.push_unary(self.node, d), value),
            None => Self::constant(value),
        }
    }

    fn binary(&self, other: &Self, value: Float, d_self: Float, d_other: Float) -> Self {
        match (self.tape, other.tape) {
            (Some(tape), Some(other_tape)) => {
                debug_assert!(std::ptr::eq(tape, other_tape), "mixed tapes");
                Self::attached(
                    tape,
                    tape.push_binary(self.node, d_self, other.node, d_other),
                    value,
                )
            }
            (Some(_), None) => self.unary(value, d_self),
            (None, Some(_)) => other.unary(value, d_other),
            (None, None) => Self::constant(value),
        }
    }

    /// Square root; the derivative is 0 at the origin to avoid infinities.
    pub fn sqrt(&self) -> Self {
        let v = self.value.sqrt();
        let d = if v > 0.0 { 0.5 / v } else { 0.0 };
        self.unary(v, d)
    }

    /// Natural exponential.
    pub fn exp(&self) -> Self {
        let v = self.value.exp();
        self.unary(v, v)
    }

    /// Raise to a constant power.
    ///
    /// * `p` - The exponent.
    pub fn powf(&self, p: Float) -> Self {
        let v = self.value.powf(p);
        self.unary(v, p * self.value.powf(p - 1.0))
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        if self.value < 0.0 {
            -*self
        } else {
            *self
        }
    }

    /// Lower clamp against a constant floor. Where the floor wins the result
    /// is detached (zero derivative), as with a true max.
    ///
    /// * `floor` - The floor.
    pub fn max(&self, floor: Float) -> Self {
        if self.value >= floor {
            *self
        } else {
            Self::constant(floor)
        }
    }
}

/// Branchless-style select mirroring a per-lane mask: the untaken side still
/// exists but contributes neither value nor derivative.
///
/// * `cond` - The lane condition.
/// * `a`    - Value where the condition holds.
/// * `b`    - Value otherwise.
pub fn select<'t>(cond: bool, a: AdFloat<'t>, b: AdFloat<'t>) -> AdFloat<'t> {
    if cond {
        a
    } else {
        b
    }
}

impl<'t> Add for AdFloat<'t> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.binary(&other, self.value + other.value, 1.0, 1.0)
    }
}

impl<'t> Add<Float> for AdFloat<'t> {
    type Output = Self;

    fn add(self, other: Float) -> Self {
        self.unary(self.value + other, 1.0)
    }
}

impl<'t> AddAssign for AdFloat<'t> {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<'t> Sub for AdFloat<'t> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.binary(&other, self.value - other.value, 1.0, -1.0)
    }
}

impl<'t> Sub<Float> for AdFloat<'t> {
    type Output = Self;

    fn sub(self, other: Float) -> Self {
        self.unary(self.value - other, 1.0)
    }
}

impl<'t> SubAssign for AdFloat<'t> {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl<'t> Mul for AdFloat<'t> {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        self.binary(&other, self.value * other.value, other.value, self.value)
    }
}

impl<'t> Mul<Float> for AdFloat<'t> {
    type Output = Self;

    fn mul(self, other: Float) -> Self {
        self.unary(self.value * other, other)
    }
}

impl<'t> Mul<AdFloat<'t>> for Float {
    type Output = AdFloat<'t>;

    fn mul(self, other: AdFloat<'t>) -> AdFloat<'t> {
        other * self
    }
}

impl<'t> Div for AdFloat<'t> {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        let inv = 1.0 / other.value;
        self.binary(
            &other,
            self.value * inv,
            inv,
            -self.value * inv * inv,
        )
    }
}

impl<'t> Div<Float> for AdFloat<'t> {
    type Output = Self;

    fn div(self, other: Float) -> Self {
        self.unary(self.value / other, 1.0 / other)
    }
}

impl<'t> Neg for AdFloat<'t> {
    type Output = Self;

    fn neg(self) -> Self {
        self.unary(-self.value, -1.0)
    }
}

impl<'t> From<Float> for AdFloat<'t> {
    fn from(value: Float) -> Self {
        Self::constant(value)
    }
}
