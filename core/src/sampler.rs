//! Sampler

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::*;

/// Data common to all samplers.
#[derive(Clone)]
pub struct SamplerData {
    /// Number of samples per pixel.
    pub samples_per_pixel: usize,

    /// Seed the current streams were derived from.
    pub base_seed: u64,
}

impl SamplerData {
    /// Create a new `SamplerData`.
    ///
    /// * `samples_per_pixel` - Number of samples per pixel.
    pub fn new(samples_per_pixel: usize) -> Self {
        Self {
            samples_per_pixel,
            base_seed: 0,
        }
    }
}

/// Random-number source for wavefront rendering. Every lane owns an
/// independent stream so that one lane's termination never perturbs the
/// sequence another lane sees, and so a forked sampler replays the exact
/// per-lane sequence of the original (the replay passes depend on this).
pub trait Sampler {
    /// Returns a shared reference to the underlying `SamplerData`.
    fn get_data(&self) -> &SamplerData;

    /// Returns a mutable reference to the underlying `SamplerData`.
    fn get_data_mut(&mut self) -> &mut SamplerData;

    /// Re-seed the sampler with one stream per lane.
    ///
    /// * `seed`  - Base seed.
    /// * `lanes` - Number of lanes.
    fn seed(&mut self, seed: u64, lanes: usize);

    /// Next 1-D sample on the given lane's stream.
    ///
    /// * `lane` - The lane.
    fn get_1d(&mut self, lane: usize) -> Float;

    /// Next 2-D sample on the given lane's stream.
    ///
    /// * `lane` - The lane.
    fn get_2d(&mut self, lane: usize) -> Point2f;

    /// Clone the sampler with its exact current per-lane state, so the
    /// clone produces the same sequences this sampler will.
    fn fork(&self) -> Box<dyn Sampler>;

    /// Number of samples drawn on a lane since seeding.
    ///
    /// * `lane` - The lane.
    fn draw_count(&self, lane: usize) -> u64;

    /// Fingerprint of a lane's stream state; equal fingerprints imply
    /// identical future sequences.
    ///
    /// * `lane` - The lane.
    fn state_fingerprint(&self, lane: usize) -> u64;
}
