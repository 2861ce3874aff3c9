//! Box Filter

use core::autodiff::*;
use core::base::*;
use core::filter::*;
use core::geometry::*;

/// Implements the box filter which equally weights all samples within its
/// extent. Its weight does not depend on the sample position, so it carries
/// no position gradient and is rejected by the differentiable integrator.
pub struct BoxFilter {
    /// Filter data.
    pub data: FilterData,
}

impl BoxFilter {
    /// Returns a new instance of `BoxFilter`.
    ///
    /// * `radius` - Radius of the filter; beyond this the filter is 0.
    pub fn new(radius: Float) -> Self {
        Self {
            data: FilterData::new(radius),
        }
    }
}

impl Filter for BoxFilter {
    /// Return the filter parameters.
    fn get_data(&self) -> &FilterData {
        &self.data
    }

    /// Returns value of the filter at a given point.
    ///
    /// * `p` - The position of the sample point relative to the center of the
    ///         filter.
    fn evaluate(&self, p: &Point2f) -> Float {
        if abs(p.x) <= self.data.radius && abs(p.y) <= self.data.radius {
            1.0
        } else {
            0.0
        }
    }

    /// Returns the differentiable value of the filter at a given point. The
    /// box profile is piecewise constant, so the result is detached.
    ///
    /// * `p` - The position of the sample point relative to the center of the
    ///         filter (attached).
    fn evaluate_ad<'t>(&self, p: &AdPoint2<'t>) -> AdFloat<'t> {
        AdFloat::constant(self.evaluate(&p.value()))
    }

    fn is_box(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_inside_extent() {
        let filter = BoxFilter::new(0.5);
        assert_eq!(filter.evaluate(&Point2f::new(0.4, -0.4)), 1.0);
        assert_eq!(filter.evaluate(&Point2f::new(0.6, 0.0)), 0.0);
        assert!(filter.is_box());
    }
}
