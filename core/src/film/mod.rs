//! Film

#![allow(dead_code)]

use crate::autodiff::*;
use crate::base::*;
use crate::filter::*;
use crate::geometry::*;
use crate::spectrum::*;
use std::sync::Arc;

mod image_block;

pub use image_block::*;

/// The film: the pixel grid rendered images are reconstructed on, plus
/// the filter used for splatting and the border-sampling policy.
pub struct Film {
    /// Image resolution in pixels.
    resolution: Point2i,

    /// Reconstruction filter shared with image blocks.
    filter: Arc<dyn Filter>,

    /// Whether samples are also generated in a border region around the
    /// image so edge pixels receive full filter support. Differentiable
    /// rendering requires this; otherwise edge pixels see a truncated
    /// filter whose normalization is not reproduced by the splatting pass.
    sample_border: bool,
}

impl Film {
    /// Create a new film.
    ///
    /// * `resolution`    - Image resolution in pixels.
    /// * `filter`        - Reconstruction filter.
    /// * `sample_border` - Generate samples in the filter border.
    pub fn new(resolution: Point2i, filter: Arc<dyn Filter>, sample_border: bool) -> Self {
        Self {
            resolution,
            filter,
            sample_border,
        }
    }

    /// Image resolution in pixels.
    pub fn resolution(&self) -> Point2i {
        self.resolution
    }

    /// Number of interior pixels.
    pub fn num_pixels(&self) -> usize {
        (self.resolution.x * self.resolution.y) as usize
    }

    /// Reconstruction filter.
    pub fn filter(&self) -> &Arc<dyn Filter> {
        &self.filter
    }

    /// Whether border sampling is enabled.
    pub fn sample_border(&self) -> bool {
        self.sample_border
    }

    /// Border width sampled around the image (0 without border sampling).
    pub fn border_size(&self) -> Int {
        if self.sample_border {
            (self.filter.radius() - 0.5).ceil().max(0.0) as Int
        } else {
            0
        }
    }

    /// Origin of the sampled region in raster coordinates.
    pub fn sample_offset(&self) -> Point2i {
        let b = self.border_size();
        Point2i::new(-b, -b)
    }

    /// Size of the sampled region in pixels.
    pub fn sample_extent(&self) -> Point2i {
        let b = self.border_size();
        Point2i::new(self.resolution.x + 2 * b, self.resolution.y + 2 * b)
    }

    /// Create a cleared accumulation block covering the film.
    pub fn create_block<'t>(&self) -> ImageBlock<'t> {
        ImageBlock::new(self.resolution, Arc::clone(&self.filter))
    }

    /// Filter-weighted read from an image at a raster position; the
    /// adjoint counterpart of splatting into a block.
    ///
    /// * `image` - Pixel data, row-major, `num_pixels()` entries.
    /// * `pos`   - Raster position.
    pub fn read(&self, image: &[Spectrum], pos: &Point2f) -> Spectrum {
        read_filtered(image, self.resolution, self.filter.as_ref(), pos)
    }

    /// Develop a block into a plain image, discarding gradient tracking.
    ///
    /// * `block` - The accumulation block.
    pub fn develop_primal(&self, block: &ImageBlock) -> Vec<Spectrum> {
        block.develop().iter().map(AdSpectrum::value).collect()
    }
}
