//! Common Integrator Functions

#![allow(dead_code)]

use core::base::*;
use core::geometry::*;
use core::sampler::*;
use core::sensor::*;
use core::spectrum::*;
use itertools::iproduct;
use std::error::Error;
use std::fmt;

/// Configuration errors detected when constructing an integrator.
#[derive(Clone, Debug, PartialEq)]
pub enum IntegratorError {
    /// The path tracer needs at least one bounce.
    InvalidMaxDepth(usize),

    /// The reparameterization kernel needs at least one auxiliary ray.
    InvalidAuxRayCount(usize),

    /// The discontinuity sharpness must be positive and finite.
    InvalidKappa(Float),

    /// The kernel falloff exponent must be non-negative and finite.
    InvalidPower(Float),
}

impl fmt::Display for IntegratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMaxDepth(n) => {
                write!(f, "invalid maximum depth {n}; need at least 1")
            }
            Self::InvalidAuxRayCount(n) => {
                write!(f, "invalid auxiliary ray count {n}; need at least 1")
            }
            Self::InvalidKappa(kappa) => {
                write!(f, "invalid kappa {kappa}; need a positive finite value")
            }
            Self::InvalidPower(power) => {
                write!(f, "invalid power {power}; need a non-negative finite value")
            }
        }
    }
}

impl Error for IntegratorError {}

/// Power-heuristic MIS weight for the first of two sampling strategies.
/// Always in `[0, 1]`; a zero first pdf gets weight 0 without dividing.
///
/// * `pdf_a` - Pdf of the strategy that produced the sample.
/// * `pdf_b` - Pdf of the competing strategy for the same sample.
pub fn mis_weight(pdf_a: Float, pdf_b: Float) -> Float {
    if pdf_a > 0.0 {
        let a2 = pdf_a * pdf_a;
        a2 / (a2 + pdf_b * pdf_b)
    } else {
        0.0
    }
}

/// Seed the sampler with one lane per (sample-region pixel, sample) pair
/// and return the resolved sample count.
///
/// * `sensor`  - The sensor being rendered.
/// * `sampler` - The sampler to seed.
/// * `seed`    - Base seed.
/// * `spp`     - Samples per pixel; 0 keeps the sampler's own count.
pub fn prepare_sampler(
    sensor: &Sensor,
    sampler: &mut dyn Sampler,
    seed: u64,
    spp: usize,
) -> usize {
    let spp = if spp == 0 {
        sampler.get_data().samples_per_pixel
    } else {
        spp
    };
    sampler.get_data_mut().samples_per_pixel = spp;

    let extent = sensor.film().sample_extent();
    let lanes = (extent.x * extent.y) as usize * spp;
    sampler.seed(seed, lanes);
    spp
}

/// Generate one jittered primary ray per lane, covering the film's sample
/// region (including the filter border) with `spp` samples per pixel.
/// Returns the rays, their sensor weights and their raster positions.
///
/// * `sensor`  - The sensor.
/// * `sampler` - The seeded sampler; one 2-D draw is consumed per lane.
pub fn sample_sensor_rays(
    sensor: &Sensor,
    sampler: &mut dyn Sampler,
) -> (Vec<Ray>, Vec<Spectrum>, Vec<Point2f>) {
    let film = sensor.film();
    let offset = film.sample_offset();
    let extent = film.sample_extent();
    let spp = sampler.get_data().samples_per_pixel;
    let lanes = (extent.x * extent.y) as usize * spp;

    let mut rays = Vec::with_capacity(lanes);
    let mut weights = Vec::with_capacity(lanes);
    let mut positions = Vec::with_capacity(lanes);

    let mut lane = 0;
    for (y, x, _) in iproduct!(0..extent.y, 0..extent.x, 0..spp) {
        let jitter = sampler.get_2d(lane);
        let pos = Point2f::new(
            (offset.x + x) as Float + jitter.x,
            (offset.y + y) as Float + jitter.y,
        );
        let (ray, weight) = sensor.sample_ray(&pos);
        rays.push(ray);
        weights.push(weight);
        positions.push(pos);
        lane += 1;
    }
    (rays, weights, positions)
}
