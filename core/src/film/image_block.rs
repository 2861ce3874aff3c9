//! Image Block

#![allow(dead_code)]

use crate::autodiff::*;
use crate::base::*;
use crate::filter::*;
use crate::geometry::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Accumulation buffer for filter-weighted sample splats. Five channels
/// per pixel: three radiance components, the accumulated filter weight and
/// the raw sample count. Values and filter weights stay differentiable so
/// an attached sample position propagates gradients through the filter
/// profile and the final normalization.
///
/// The block carries a border of `ceil(radius - 0.5)` pixels on each side;
/// samples placed in the border still contribute to interior pixels.
pub struct ImageBlock<'t> {
    /// Interior size in pixels.
    size: Point2i,

    /// Border width in pixels.
    border: Int,

    /// Reconstruction filter.
    filter: Arc<dyn Filter>,

    /// Accumulated radiance per pixel (including the border).
    pixels: Vec<AdSpectrum<'t>>,

    /// Accumulated filter weight per pixel (including the border).
    weights: Vec<AdFloat<'t>>,

    /// Raw sample count per pixel (including the border).
    counts: Vec<u32>,
}

impl<'t> ImageBlock<'t> {
    /// Create a cleared block.
    ///
    /// * `size`   - Interior size in pixels.
    /// * `filter` - Reconstruction filter.
    pub fn new(size: Point2i, filter: Arc<dyn Filter>) -> Self {
        let border = (filter.radius() - 0.5).ceil().max(0.0) as Int;
        let w = size.x + 2 * border;
        let h = size.y + 2 * border;
        let n = (w * h) as usize;
        Self {
            size,
            border,
            filter,
            pixels: vec![AdSpectrum::zero(); n],
            weights: vec![AdFloat::constant(0.0); n],
            counts: vec![0; n],
        }
    }

    /// Interior size in pixels.
    pub fn size(&self) -> Point2i {
        self.size
    }

    /// Border width in pixels.
    pub fn border(&self) -> Int {
        self.border
    }

    /// Reset all channels to zero.
    pub fn clear(&mut self) {
        for p in self.pixels.iter_mut() {
            *p = AdSpectrum::zero();
        }
        for w in self.weights.iter_mut() {
            *w = AdFloat::constant(0.0);
        }
        for c in self.counts.iter_mut() {
            *c = 0;
        }
    }

    /// Flat index of a pixel, or None outside the bordered region.
    fn index(&self, x: Int, y: Int) -> Option<usize> {
        if x < -self.border
            || y < -self.border
            || x >= self.size.x + self.border
            || y >= self.size.y + self.border
        {
            return None;
        }
        let w = self.size.x + 2 * self.border;
        Some(((y + self.border) * w + x + self.border) as usize)
    }

    /// Splat a sample at a differentiable raster position. Each pixel
    /// within the filter radius accumulates the filter-weighted value and
    /// weight. Non-finite samples are dropped with a warning; negative
    /// values are accepted, since the drivers splat signed gradients
    /// through this path.
    ///
    /// * `pos`    - Raster position (pixel centers at half-integers).
    /// * `value`  - Sample radiance (or a signed gradient).
    /// * `weight` - Sample weight entering the weight channel.
    pub fn put(&mut self, pos: &AdPoint2<'t>, value: &AdSpectrum<'t>, weight: AdFloat<'t>) {
        let p = pos.value();
        let v = value.value();
        if !p.x.is_finite() || !p.y.is_finite() || v.has_nans() {
            warn!("dropping non-finite sample splat at {:?}", p);
            return;
        }

        let radius = self.filter.radius();
        let x0 = (p.x - radius - 0.5).ceil() as Int;
        let x1 = (p.x + radius - 0.5).floor() as Int;
        let y0 = (p.y - radius - 0.5).ceil() as Int;
        let y1 = (p.y + radius - 0.5).floor() as Int;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let idx = match self.index(x, y) {
                    Some(idx) => idx,
                    None => continue,
                };
                let offset = AdPoint2::new(
                    pos.x - (x as Float + 0.5),
                    pos.y - (y as Float + 0.5),
                );
                let fw = self.filter.evaluate_ad(&offset);
                if fw.value() == 0.0 && !fw.is_attached() {
                    continue;
                }
                self.pixels[idx] += value.scale(fw * weight);
                self.weights[idx] = self.weights[idx] + fw * weight;
                self.counts[idx] += 1;
            }
        }
    }

    /// Normalize the interior pixels by their accumulated filter weight.
    /// Pixels with (near) zero weight develop to black. The result stays
    /// differentiable through both the value and weight channels.
    pub fn develop(&self) -> Vec<AdSpectrum<'t>> {
        let mut out = Vec::with_capacity((self.size.x * self.size.y) as usize);
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let idx = match self.index(x, y) {
                    Some(idx) => idx,
                    None => continue,
                };
                let w = self.weights[idx];
                if w.value() <= DENOM_EPSILON {
                    out.push(AdSpectrum::zero());
                } else {
                    out.push(self.pixels[idx].scale(AdFloat::constant(1.0) / w));
                }
            }
        }
        out
    }

    /// Raw sample count of an interior pixel.
    ///
    /// * `x` - Pixel column.
    /// * `y` - Pixel row.
    pub fn count(&self, x: Int, y: Int) -> u32 {
        self.index(x, y).map_or(0, |idx| self.counts[idx])
    }
}

/// Filter-weighted gather from a plain image, the adjoint counterpart of
/// the splat in `ImageBlock::put`. Returns the normalized filter-weighted
/// average of the pixels under the filter footprint at `pos`.
///
/// * `image`  - Pixel data, row-major, `size.x * size.y` entries.
/// * `size`   - Image size in pixels.
/// * `filter` - Reconstruction filter.
/// * `pos`    - Raster position.
pub fn read_filtered(
    image: &[Spectrum],
    size: Point2i,
    filter: &dyn Filter,
    pos: &Point2f,
) -> Spectrum {
    let radius = filter.radius();
    let x0 = max((pos.x - radius - 0.5).ceil() as Int, 0);
    let x1 = min((pos.x + radius - 0.5).floor() as Int, size.x - 1);
    let y0 = max((pos.y - radius - 0.5).ceil() as Int, 0);
    let y1 = min((pos.y + radius - 0.5).floor() as Int, size.y - 1);

    let mut sum = Spectrum::ZERO;
    let mut weight = 0.0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let offset = Point2f::new(pos.x - (x as Float + 0.5), pos.y - (y as Float + 0.5));
            let fw = filter.evaluate(&offset);
            if fw == 0.0 {
                continue;
            }
            sum += image[(y * size.x + x) as usize] * fw;
            weight += fw;
        }
    }
    if weight <= DENOM_EPSILON {
        Spectrum::ZERO
    } else {
        sum / weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    struct TentFilter(FilterData);

    impl Filter for TentFilter {
        fn get_data(&self) -> &FilterData {
            &self.0
        }

        fn evaluate(&self, p: &Point2f) -> Float {
            max(0.0, self.0.radius - p.x.abs()) * max(0.0, self.0.radius - p.y.abs())
        }

        fn evaluate_ad<'t>(&self, p: &AdPoint2<'t>) -> AdFloat<'t> {
            (-p.x.abs() + self.0.radius).max(0.0) * (-p.y.abs() + self.0.radius).max(0.0)
        }
    }

    fn test_block<'t>() -> ImageBlock<'t> {
        ImageBlock::new(
            Point2i::new(2, 2),
            Arc::new(TentFilter(FilterData::new(1.0))),
        )
    }

    // The drivers splat signed gradients; a negative channel must land in
    // the pixel unchanged.
    #[test]
    fn signed_splats_are_accumulated() {
        let mut block = test_block();
        block.put(
            &AdPoint2::constant(Point2f::new(0.5, 0.5)),
            &AdSpectrum::constant(Spectrum::from_rgb(-1.0, 2.0, -0.5)),
            AdFloat::constant(1.0),
        );
        let img = block.develop();
        let px = img[0].value();
        assert!(approx_eq!(Float, px.c[0], -1.0, epsilon = 1e-5));
        assert!(approx_eq!(Float, px.c[1], 2.0, epsilon = 1e-5));
        assert!(approx_eq!(Float, px.c[2], -0.5, epsilon = 1e-5));
        assert_eq!(block.count(0, 0), 1);
    }

    #[test]
    fn non_finite_splats_are_dropped() {
        let mut block = test_block();
        block.put(
            &AdPoint2::constant(Point2f::new(0.5, 0.5)),
            &AdSpectrum::constant(Spectrum::from_rgb(Float::NAN, 1.0, 1.0)),
            AdFloat::constant(1.0),
        );
        assert_eq!(block.count(0, 0), 0);
        assert!(block.develop()[0].value().is_black());
    }
}
