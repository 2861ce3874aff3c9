//! Reflection Models

#![allow(dead_code)]

use crate::autodiff::*;
use crate::base::*;
use crate::geometry::*;
use crate::interaction::*;
use crate::params::*;
use crate::sampling::*;
use crate::spectrum::*;
use bitflags::bitflags;

bitflags! {
    /// BSDF lobe flags.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct BsdfFlags: u32 {
        /// No lobes.
        const NONE = 0;

        /// Diffuse reflection.
        const DIFFUSE = 1 << 0;

        /// Dirac-delta (perfectly specular) distribution.
        const DELTA = 1 << 1;

        /// Non-delta lobes; eligible for next-event estimation.
        const SMOOTH = 1 << 2;
    }
}

/// Result of sampling a BSDF: a continuation direction in the shading
/// frame, its pdf, and the sampling weight `f * cos / pdf`.
#[derive(Copy, Clone, Debug)]
pub struct BsdfSample {
    /// Sampled direction in the shading frame.
    pub wo: Vector3f,

    /// Probability density of the sample (0 marks a failed sample).
    pub pdf: Float,

    /// Sampling weight: BSDF value times cosine foreshortening over pdf.
    pub weight: Spectrum,

    /// Flags of the sampled lobe.
    pub flags: BsdfFlags,
}

impl Default for BsdfSample {
    fn default() -> Self {
        Self {
            wo: Vector3f::new(0.0, 0.0, 1.0),
            pdf: 0.0,
            weight: Spectrum::ZERO,
            flags: BsdfFlags::NONE,
        }
    }
}

/// BSDF interface. Directions are expressed in the shading frame with the
/// normal along +z; `eval` includes the cosine foreshortening factor and is
/// differentiable through the outgoing direction and any reflectance
/// parameters. `sample` is a discrete stochastic decision and is never
/// differentiated.
pub trait Bsdf {
    /// Lobe flags.
    fn flags(&self) -> BsdfFlags;

    /// Evaluate the BSDF times cosine for a pair of local directions.
    ///
    /// * `ctx` - Evaluation context (parameters, optional recording).
    /// * `wi`  - Incident direction (toward the viewer).
    /// * `wo`  - Outgoing direction (toward the light).
    fn eval<'t>(&self, ctx: &AdContext<'_, 't>, wi: &AdVector3<'t>, wo: &AdVector3<'t>)
        -> AdSpectrum<'t>;

    /// Pdf of sampling `wo` given `wi`.
    ///
    /// * `wi` - Incident direction.
    /// * `wo` - Outgoing direction.
    fn pdf(&self, wi: &Vector3f, wo: &Vector3f) -> Float;

    /// Evaluate value and pdf together.
    ///
    /// * `ctx` - Evaluation context.
    /// * `wi`  - Incident direction.
    /// * `wo`  - Outgoing direction.
    fn eval_pdf<'t>(
        &self,
        ctx: &AdContext<'_, 't>,
        wi: &AdVector3<'t>,
        wo: &AdVector3<'t>,
    ) -> (AdSpectrum<'t>, Float) {
        let value = self.eval(ctx, wi, wo);
        let pdf = self.pdf(&wi.value(), &wo.value());
        (value, pdf)
    }

    /// Sample a continuation direction. Runs outside differentiation.
    ///
    /// * `params` - Scene parameters (primal values only).
    /// * `si`     - The interaction at the sampling point.
    /// * `u1`     - 1-D sample (lobe selection).
    /// * `u2`     - 2-D sample (direction).
    fn sample(
        &self,
        params: &SceneParameters,
        si: &SurfaceInteraction,
        u1: Float,
        u2: &Point2f,
    ) -> BsdfSample;
}

/// Lambertian reflection with a differentiable reflectance parameter.
pub struct DiffuseBsdf {
    /// Name of the reflectance parameter (3 components).
    pub reflectance: String,
}

impl DiffuseBsdf {
    /// Create a diffuse BSDF backed by a named reflectance parameter.
    ///
    /// * `reflectance` - Parameter identifier.
    pub fn new(reflectance: &str) -> Self {
        Self {
            reflectance: reflectance.to_owned(),
        }
    }
}

impl Bsdf for DiffuseBsdf {
    fn flags(&self) -> BsdfFlags {
        BsdfFlags::DIFFUSE | BsdfFlags::SMOOTH
    }

    fn eval<'t>(
        &self,
        ctx: &AdContext<'_, 't>,
        wi: &AdVector3<'t>,
        wo: &AdVector3<'t>,
    ) -> AdSpectrum<'t> {
        if wi.z.value() <= 0.0 || wo.z.value() <= 0.0 {
            return AdSpectrum::zero();
        }
        ctx.spectrum(&self.reflectance).scale(wo.z * INV_PI)
    }

    fn pdf(&self, wi: &Vector3f, wo: &Vector3f) -> Float {
        if wi.z <= 0.0 {
            return 0.0;
        }
        cosine_hemisphere_pdf(wo)
    }

    fn sample(
        &self,
        params: &SceneParameters,
        si: &SurfaceInteraction,
        _u1: Float,
        u2: &Point2f,
    ) -> BsdfSample {
        if si.wi.z <= 0.0 {
            return BsdfSample::default();
        }
        let wo = square_to_cosine_hemisphere(u2);
        let pdf = cosine_hemisphere_pdf(&wo);
        if pdf <= 0.0 {
            return BsdfSample::default();
        }
        // f * cos / pdf collapses to the reflectance for a cosine sample.
        BsdfSample {
            wo,
            pdf,
            weight: params.spectrum(&self.reflectance),
            flags: self.flags(),
        }
    }
}

/// Perfect mirror reflection (delta distribution).
pub struct MirrorBsdf {
    /// Name of the specular reflectance parameter (3 components).
    pub reflectance: String,
}

impl MirrorBsdf {
    /// Create a mirror BSDF backed by a named reflectance parameter.
    ///
    /// * `reflectance` - Parameter identifier.
    pub fn new(reflectance: &str) -> Self {
        Self {
            reflectance: reflectance.to_owned(),
        }
    }
}

impl Bsdf for MirrorBsdf {
    fn flags(&self) -> BsdfFlags {
        BsdfFlags::DELTA
    }

    /// A delta lobe has zero value for any sampled direction pair.
    fn eval<'t>(
        &self,
        _ctx: &AdContext<'_, 't>,
        _wi: &AdVector3<'t>,
        _wo: &AdVector3<'t>,
    ) -> AdSpectrum<'t> {
        AdSpectrum::zero()
    }

    fn pdf(&self, _wi: &Vector3f, _wo: &Vector3f) -> Float {
        0.0
    }

    fn sample(
        &self,
        params: &SceneParameters,
        si: &SurfaceInteraction,
        _u1: Float,
        _u2: &Point2f,
    ) -> BsdfSample {
        if si.wi.z <= 0.0 {
            return BsdfSample::default();
        }
        BsdfSample {
            wo: Vector3f::new(-si.wi.x, -si.wi.y, si.wi.z),
            pdf: 1.0,
            weight: params.spectrum(&self.reflectance),
            flags: self.flags(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn diffuse_setup() -> (SceneParameters, DiffuseBsdf) {
        let mut params = SceneParameters::new();
        params.insert("mat.reflectance", vec![0.8, 0.6, 0.4]);
        (params, DiffuseBsdf::new("mat.reflectance"))
    }

    #[test]
    fn diffuse_eval_includes_cosine() {
        let (params, bsdf) = diffuse_setup();
        let ctx = AdContext::detached(&params);
        let wi = AdVector3::constant(Vector3f::new(0.0, 0.0, 1.0));
        let wo = AdVector3::constant(Vector3f::new(0.0, 0.6, 0.8).normalize());
        let f = bsdf.eval(&ctx, &wi, &wo);
        assert!(approx_eq!(Float, f.value().c[0], 0.8 * INV_PI * 0.8, epsilon = 1e-5));
    }

    #[test]
    fn diffuse_rejects_lower_hemisphere() {
        let (params, bsdf) = diffuse_setup();
        let ctx = AdContext::detached(&params);
        let wi = AdVector3::constant(Vector3f::new(0.0, 0.0, 1.0));
        let wo = AdVector3::constant(Vector3f::new(0.0, 0.0, -1.0));
        assert!(bsdf.eval(&ctx, &wi, &wo).is_black());
        assert_eq!(bsdf.pdf(&wi.value(), &wo.value()), 0.0);
    }

    #[test]
    fn diffuse_sample_weight_is_reflectance() {
        let (params, bsdf) = diffuse_setup();
        let si = SurfaceInteraction::new(
            Point3f::zero(),
            Vector3f::new(0.0, 0.0, 1.0),
            1.0,
            0,
            &Vector3f::new(0.0, 0.0, -1.0),
        );
        let bs = bsdf.sample(&params, &si, 0.5, &Point2f::new(0.3, 0.7));
        assert!(bs.pdf > 0.0);
        assert_eq!(bs.weight, params.spectrum("mat.reflectance"));
    }

    #[test]
    fn mirror_is_delta() {
        let mut params = SceneParameters::new();
        params.insert("mat.specular", vec![1.0, 1.0, 1.0]);
        let bsdf = MirrorBsdf::new("mat.specular");
        assert!(bsdf.flags().contains(BsdfFlags::DELTA));
        assert!(!bsdf.flags().contains(BsdfFlags::SMOOTH));

        let si = SurfaceInteraction::new(
            Point3f::zero(),
            Vector3f::new(0.0, 0.0, 1.0),
            1.0,
            0,
            &Vector3f::new(0.6, 0.0, -0.8),
        );
        let bs = bsdf.sample(&params, &si, 0.0, &Point2f::zero());
        assert_eq!(bs.pdf, 1.0);
        // Mirror reflection about the normal.
        assert!(approx_eq!(Float, bs.wo.x, -si.wi.x, epsilon = 1e-6));
        assert!(approx_eq!(Float, bs.wo.z, si.wi.z, epsilon = 1e-6));
    }
}
