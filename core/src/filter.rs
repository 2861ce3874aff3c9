//! Reconstruction Filters

#![allow(dead_code)]

use crate::autodiff::*;
use crate::base::*;
use crate::geometry::*;

/// Common state for reconstruction filters.
#[derive(Copy, Clone, Debug)]
pub struct FilterData {
    /// Filter radius in pixels (identical in x and y).
    pub radius: Float,
}

impl FilterData {
    /// Create common filter state.
    ///
    /// * `radius` - Filter radius in pixels.
    pub fn new(radius: Float) -> Self {
        Self { radius }
    }
}

/// Reconstruction filter interface. The differentiable evaluation is used
/// when splatting attached sample positions, so a moving sample position
/// propagates gradients through the filter profile.
pub trait Filter {
    /// Returns the common filter state.
    fn get_data(&self) -> &FilterData;

    /// Filter radius in pixels.
    fn radius(&self) -> Float {
        self.get_data().radius
    }

    /// Evaluate the filter at an offset from its center.
    ///
    /// * `p` - Offset from the filter center.
    fn evaluate(&self, p: &Point2f) -> Float;

    /// Evaluate the filter at a differentiable offset from its center.
    ///
    /// * `p` - Offset from the filter center.
    fn evaluate_ad<'t>(&self, p: &AdPoint2<'t>) -> AdFloat<'t>;

    /// True for the box filter, whose weight is constant in the sample
    /// position and therefore carries no position gradient.
    fn is_box(&self) -> bool {
        false
    }
}
