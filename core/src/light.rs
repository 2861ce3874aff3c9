//! Emitters

#![allow(dead_code)]

use crate::autodiff::*;
use crate::base::*;
use crate::geometry::*;
use crate::interaction::*;
use crate::params::*;

/// A sampled direction toward an emitter.
#[derive(Copy, Clone, Debug)]
pub struct DirectionSample {
    /// Unit direction from the reference point toward the emitter.
    pub d: Vector3f,

    /// Distance to the sampled point.
    pub dist: Float,

    /// Solid-angle probability density (0 marks a failed sample).
    pub pdf: Float,

    /// True for Dirac-delta emitters, which bypass MIS.
    pub delta: bool,

    /// Index of the sampled emitter in the scene.
    pub emitter: usize,
}

impl Default for DirectionSample {
    fn default() -> Self {
        Self {
            d: Vector3f::new(0.0, 0.0, 1.0),
            dist: INFINITY,
            pdf: 0.0,
            delta: false,
            emitter: usize::MAX,
        }
    }
}

/// Emitter interface. Emission values are differentiable through the
/// emitter's radiance/intensity parameter; sampled directions are detached.
pub trait Emitter {
    /// True for Dirac-delta emitters (cannot be hit by rays).
    fn is_delta(&self) -> bool;

    /// Emitted radiance toward a surface interaction on the emitter.
    ///
    /// * `ctx` - Evaluation context.
    /// * `si`  - Interaction on the emitter's surface.
    fn eval<'t>(&self, ctx: &AdContext<'_, 't>, si: &SurfaceInteraction) -> AdSpectrum<'t>;

    /// Sample a direction from a reference point toward this emitter.
    /// Returns the sample and the emitted radiance (not yet divided by the
    /// pdf).
    ///
    /// * `ctx`   - Evaluation context.
    /// * `ref_p` - Reference point being illuminated.
    /// * `u`     - Unit-square sample.
    fn sample_direction<'t>(
        &self,
        ctx: &AdContext<'_, 't>,
        ref_p: &Point3f,
        u: &Point2f,
    ) -> (DirectionSample, AdSpectrum<'t>);

    /// Solid-angle pdf of sampling the given direction from the reference
    /// point (0 for delta emitters).
    ///
    /// * `ref_p` - Reference point.
    /// * `d`     - Direction from the reference point.
    fn pdf_direction(&self, ref_p: &Point3f, d: &Vector3f) -> Float;
}

/// Isotropic point light with a differentiable intensity parameter.
pub struct PointEmitter {
    /// Light position.
    pub p: Point3f,

    /// Name of the intensity parameter (3 components).
    pub intensity: String,
}

impl PointEmitter {
    /// Create a point emitter.
    ///
    /// * `p`         - Light position.
    /// * `intensity` - Intensity parameter identifier.
    pub fn new(p: Point3f, intensity: &str) -> Self {
        Self {
            p,
            intensity: intensity.to_owned(),
        }
    }
}

impl Emitter for PointEmitter {
    fn is_delta(&self) -> bool {
        true
    }

    /// A point light is never hit by a ray.
    fn eval<'t>(&self, _ctx: &AdContext<'_, 't>, _si: &SurfaceInteraction) -> AdSpectrum<'t> {
        AdSpectrum::zero()
    }

    fn sample_direction<'t>(
        &self,
        ctx: &AdContext<'_, 't>,
        ref_p: &Point3f,
        _u: &Point2f,
    ) -> (DirectionSample, AdSpectrum<'t>) {
        let to = self.p - *ref_p;
        let dist2 = to.length_squared();
        if dist2 <= 0.0 {
            return (DirectionSample::default(), AdSpectrum::zero());
        }
        let dist = dist2.sqrt();
        let ds = DirectionSample {
            d: to / dist,
            dist,
            pdf: 1.0,
            delta: true,
            emitter: usize::MAX, // Patched by the scene.
        };
        let value = ctx.spectrum(&self.intensity) * (1.0 / dist2);
        (ds, value)
    }

    fn pdf_direction(&self, _ref_p: &Point3f, _d: &Vector3f) -> Float {
        0.0
    }
}

/// Uniform spherical area light with a differentiable radiance parameter.
/// The emitting sphere is also registered as a scene shape; the emitter
/// keeps its own copy of the geometry for sampling and pdf evaluation.
pub struct SphereEmitter {
    /// Sphere center.
    pub center: Point3f,

    /// Sphere radius.
    pub radius: Float,

    /// Name of the radiance parameter (3 components).
    pub radiance: String,
}

impl SphereEmitter {
    /// Create a spherical area emitter.
    ///
    /// * `center`   - Sphere center.
    /// * `radius`   - Sphere radius.
    /// * `radiance` - Radiance parameter identifier.
    pub fn new(center: Point3f, radius: Float, radiance: &str) -> Self {
        Self {
            center,
            radius,
            radiance: radiance.to_owned(),
        }
    }

    /// Area pdf of the uniform sphere parameterization.
    fn area_pdf(&self) -> Float {
        1.0 / (FOUR_PI * self.radius * self.radius)
    }
}

impl Emitter for SphereEmitter {
    fn is_delta(&self) -> bool {
        false
    }

    fn eval<'t>(&self, ctx: &AdContext<'_, 't>, si: &SurfaceInteraction) -> AdSpectrum<'t> {
        // Emission only from the front side.
        if si.wi.z > 0.0 {
            ctx.spectrum(&self.radiance)
        } else {
            AdSpectrum::zero()
        }
    }

    fn sample_direction<'t>(
        &self,
        ctx: &AdContext<'_, 't>,
        ref_p: &Point3f,
        u: &Point2f,
    ) -> (DirectionSample, AdSpectrum<'t>) {
        use crate::sampling::square_to_uniform_sphere;

        let n_l = square_to_uniform_sphere(u);
        let q = self.center + n_l * self.radius;
        let to = q - *ref_p;
        let dist2 = to.length_squared();
        if dist2 <= 0.0 {
            return (DirectionSample::default(), AdSpectrum::zero());
        }
        let dist = dist2.sqrt();
        let d = to / dist;

        // Back side of the sphere subtends zero density.
        let cos_l = n_l.dot(&-d);
        if cos_l <= 0.0 {
            return (DirectionSample::default(), AdSpectrum::zero());
        }

        let pdf = self.area_pdf() * dist2 / cos_l;
        let ds = DirectionSample {
            d,
            dist,
            pdf,
            delta: false,
            emitter: usize::MAX, // Patched by the scene.
        };
        (ds, ctx.spectrum(&self.radiance))
    }

    fn pdf_direction(&self, ref_p: &Point3f, d: &Vector3f) -> Float {
        // Intersect the emitter sphere to find the visible point.
        let oc = *ref_p - self.center;
        let b = 2.0 * oc.dot(d);
        let c = oc.length_squared() - self.radius * self.radius;
        let (t0, t1) = match quadratic(1.0, b, c) {
            Some(roots) => roots,
            None => return 0.0,
        };
        let t = if t0 > SHADOW_EPSILON {
            t0
        } else if t1 > SHADOW_EPSILON {
            t1
        } else {
            return 0.0;
        };

        let q = *ref_p + *d * t;
        let n_l = (q - self.center) / self.radius;
        let cos_l = n_l.dot(&-*d);
        if cos_l <= 0.0 {
            return 0.0;
        }
        self.area_pdf() * t * t / cos_l
    }
}
