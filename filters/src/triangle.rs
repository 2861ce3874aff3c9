//! Triangle Filter

use core::autodiff::*;
use core::base::*;
use core::filter::*;
use core::geometry::*;

/// Implements the triangle filter in which the weight falls off linearly from
/// the filter center over the square extent of the filter.
pub struct TriangleFilter {
    /// Filter data.
    pub data: FilterData,
}

impl TriangleFilter {
    /// Returns a new instance of `TriangleFilter`.
    ///
    /// * `radius` - Radius of the filter; beyond this the filter is 0.
    pub fn new(radius: Float) -> Self {
        Self {
            data: FilterData::new(radius),
        }
    }
}

impl Filter for TriangleFilter {
    /// Return the filter parameters.
    fn get_data(&self) -> &FilterData {
        &self.data
    }

    /// Returns value of the filter at a given point.
    ///
    /// * `p` - The position of the sample point relative to the center of the
    ///         filter.
    fn evaluate(&self, p: &Point2f) -> Float {
        max(0.0, self.data.radius - abs(p.x)) * max(0.0, self.data.radius - abs(p.y))
    }

    /// Returns the differentiable value of the filter at a given point.
    ///
    /// * `p` - The position of the sample point relative to the center of the
    ///         filter (attached).
    fn evaluate_ad<'t>(&self, p: &AdPoint2<'t>) -> AdFloat<'t> {
        let fx = (-p.x.abs() + self.data.radius).max(0.0);
        let fy = (-p.y.abs() + self.data.radius).max(0.0);
        fx * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn peak_at_center_zero_at_radius() {
        let filter = TriangleFilter::new(1.5);
        assert!(approx_eq!(
            Float,
            filter.evaluate(&Point2f::zero()),
            1.5 * 1.5,
            epsilon = 1e-6
        ));
        assert_eq!(filter.evaluate(&Point2f::new(1.5, 0.0)), 0.0);
    }

    #[test]
    fn attached_evaluation_matches_primal() {
        let filter = TriangleFilter::new(2.0);
        let p = Point2f::new(0.7, -0.4);
        let ad = filter.evaluate_ad(&AdPoint2::constant(p));
        assert!(approx_eq!(Float, ad.value(), filter.evaluate(&p), epsilon = 1e-6));
    }
}
