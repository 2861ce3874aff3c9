//! Core

#[macro_use]
extern crate log;

pub mod autodiff;
pub mod base;
pub mod film;
pub mod filter;
pub mod geometry;
pub mod interaction;
pub mod light;
pub mod params;
pub mod reflection;
pub mod rng;
pub mod sampler;
pub mod sampling;
pub mod scene;
pub mod sensor;
pub mod spectrum;
pub mod wavefront;
