//! Gaussian Filter

use core::autodiff::*;
use core::base::*;
use core::filter::*;
use core::geometry::*;

/// Implements a separable Gaussian filter with the tails offset to zero at
/// the filter radius.
pub struct GaussianFilter {
    /// Filter data.
    pub data: FilterData,

    /// Falloff rate of the Gaussian.
    pub alpha: Float,

    /// Constant term `e^(-alpha * radius^2)` subtracted so the filter
    /// reaches zero at the radius.
    exp_r: Float,
}

impl GaussianFilter {
    /// Returns a new instance of `GaussianFilter`.
    ///
    /// * `radius` - Radius of the filter; beyond this the filter is 0.
    /// * `alpha`  - Falloff rate of the Gaussian.
    pub fn new(radius: Float, alpha: Float) -> Self {
        Self {
            data: FilterData::new(radius),
            alpha,
            exp_r: (-alpha * radius * radius).exp(),
        }
    }

    fn gaussian(&self, d: Float) -> Float {
        max(0.0, (-self.alpha * d * d).exp() - self.exp_r)
    }

    fn gaussian_ad<'t>(&self, d: AdFloat<'t>) -> AdFloat<'t> {
        ((d * d * -self.alpha).exp() - self.exp_r).max(0.0)
    }
}

impl Filter for GaussianFilter {
    /// Return the filter parameters.
    fn get_data(&self) -> &FilterData {
        &self.data
    }

    /// Returns value of the filter at a given point.
    ///
    /// * `p` - The position of the sample point relative to the center of the
    ///         filter.
    fn evaluate(&self, p: &Point2f) -> Float {
        self.gaussian(p.x) * self.gaussian(p.y)
    }

    /// Returns the differentiable value of the filter at a given point.
    ///
    /// * `p` - The position of the sample point relative to the center of the
    ///         filter (attached).
    fn evaluate_ad<'t>(&self, p: &AdPoint2<'t>) -> AdFloat<'t> {
        self.gaussian_ad(p.x) * self.gaussian_ad(p.y)
    }
}
