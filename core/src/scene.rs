//! Scene

#![allow(dead_code)]

use crate::autodiff::*;
use crate::base::*;
use crate::geometry::*;
use crate::interaction::*;
use crate::light::*;
use crate::params::*;
use crate::reflection::*;

/// Analytic sphere shape. An optional translation parameter makes the
/// sphere's placement a differentiable function of the scene parameters;
/// its primal value offsets the base center at intersection time.
pub struct Sphere {
    /// Base center position.
    pub center: Point3f,

    /// Radius.
    pub radius: Float,

    /// Index of the BSDF in the scene.
    pub bsdf: usize,

    /// Index of the attached area emitter, if the sphere emits.
    pub emitter: Option<usize>,

    /// Name of the translation parameter (3 components), if differentiable.
    pub translation: Option<String>,
}

impl Sphere {
    /// Create a non-emissive sphere.
    ///
    /// * `center` - Base center position.
    /// * `radius` - Radius.
    /// * `bsdf`   - Index of the BSDF in the scene.
    pub fn new(center: Point3f, radius: Float, bsdf: usize) -> Self {
        Self {
            center,
            radius,
            bsdf,
            emitter: None,
            translation: None,
        }
    }

    /// Attach a translation parameter.
    ///
    /// * `name` - Parameter identifier (3 components).
    pub fn with_translation(mut self, name: &str) -> Self {
        self.translation = Some(name.to_owned());
        self
    }

    /// Attach an area emitter.
    ///
    /// * `emitter` - Index of the emitter in the scene.
    pub fn with_emitter(mut self, emitter: usize) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Center with the current translation applied.
    ///
    /// * `params` - Scene parameters.
    pub fn center_now(&self, params: &SceneParameters) -> Point3f {
        match self.translation.as_ref() {
            Some(name) => self.center + params.vector3(name),
            None => self.center,
        }
    }

    /// Intersect a ray with the sphere. Returns the parametric distance of
    /// the nearest hit in `(SHADOW_EPSILON, t_max)`.
    ///
    /// * `ray`    - The ray.
    /// * `params` - Scene parameters.
    fn intersect_t(&self, ray: &Ray, params: &SceneParameters) -> Option<Float> {
        let oc = ray.o - self.center_now(params);
        let b = 2.0 * oc.dot(&ray.d);
        let c = oc.length_squared() - self.radius * self.radius;
        let (t0, t1) = quadratic(ray.d.length_squared(), b, c)?;
        let t = if t0 > SHADOW_EPSILON {
            t0
        } else if t1 > SHADOW_EPSILON {
            t1
        } else {
            return None;
        };
        (t < ray.t_max).then_some(t)
    }
}

/// The scene: shapes, their reflection models and the emitters, along with
/// the intersection and emitter-sampling queries the integrator consumes.
/// All queries are pure functions of a ray (or reference point) and the
/// caller's parameters; the scene never mutates parameter state.
pub struct Scene {
    /// Shapes.
    pub shapes: Vec<Sphere>,

    /// Reflection models, referenced by shapes.
    pub bsdfs: Vec<Box<dyn Bsdf>>,

    /// Emitters (delta lights and area lights).
    pub emitters: Vec<Box<dyn Emitter>>,
}

impl Scene {
    /// Create a new scene.
    ///
    /// * `shapes`   - Shapes.
    /// * `bsdfs`    - Reflection models.
    /// * `emitters` - Emitters.
    pub fn new(shapes: Vec<Sphere>, bsdfs: Vec<Box<dyn Bsdf>>, emitters: Vec<Box<dyn Emitter>>) -> Self {
        Self {
            shapes,
            bsdfs,
            emitters,
        }
    }

    /// Find the closest intersection. The returned interaction is invalid
    /// when the ray escapes.
    ///
    /// * `ray`    - The ray.
    /// * `params` - Scene parameters.
    pub fn intersect(&self, ray: &Ray, params: &SceneParameters) -> SurfaceInteraction {
        let mut nearest = INFINITY;
        let mut hit: Option<(usize, Float)> = None;
        for (i, shape) in self.shapes.iter().enumerate() {
            if let Some(t) = shape.intersect_t(ray, params) {
                if t < nearest {
                    nearest = t;
                    hit = Some((i, t));
                }
            }
        }
        match hit {
            Some((i, t)) => {
                let p = ray.at(t);
                let n = (p - self.shapes[i].center_now(params)) / self.shapes[i].radius;
                SurfaceInteraction::new(p, n, t, i, &ray.d)
            }
            None => SurfaceInteraction::default(),
        }
    }

    /// True if anything blocks the ray before `t_max`.
    ///
    /// * `ray`    - The ray.
    /// * `params` - Scene parameters.
    pub fn occluded(&self, ray: &Ray, params: &SceneParameters) -> bool {
        self.shapes
            .iter()
            .any(|s| s.intersect_t(ray, params).is_some())
    }

    /// BSDF at an interaction.
    ///
    /// * `si` - The interaction.
    pub fn bsdf_at(&self, si: &SurfaceInteraction) -> &dyn Bsdf {
        self.bsdfs[self.shapes[si.shape].bsdf].as_ref()
    }

    /// Emitter at an interaction, if the hit shape emits.
    ///
    /// * `si` - The interaction.
    pub fn emitter_at(&self, si: &SurfaceInteraction) -> Option<&dyn Emitter> {
        if !si.valid {
            return None;
        }
        self.shapes[si.shape]
            .emitter
            .map(|e| self.emitters[e].as_ref())
    }

    /// Emitted radiance at an interaction (black if the shape does not
    /// emit or the ray escaped).
    ///
    /// * `ctx` - Evaluation context.
    /// * `si`  - The interaction.
    pub fn emitter_eval<'t>(
        &self,
        ctx: &AdContext<'_, 't>,
        si: &SurfaceInteraction,
    ) -> AdSpectrum<'t> {
        match self.emitter_at(si) {
            Some(emitter) => emitter.eval(ctx, si),
            None => AdSpectrum::zero(),
        }
    }

    /// Sample a direction toward one uniformly chosen emitter and return
    /// the sample plus the radiance already divided by the sample's pdf.
    /// The sample is detached; occluded samples get pdf 0.
    ///
    /// * `ctx`             - Evaluation context.
    /// * `si`              - Interaction being illuminated.
    /// * `u`               - Unit-square sample (reused for selection).
    /// * `test_visibility` - Whether to shadow-test the sampled direction.
    pub fn sample_emitter_direction<'t>(
        &self,
        ctx: &AdContext<'_, 't>,
        si: &SurfaceInteraction,
        u: &Point2f,
        test_visibility: bool,
    ) -> (DirectionSample, AdSpectrum<'t>) {
        let n = self.emitters.len();
        if n == 0 {
            return (DirectionSample::default(), AdSpectrum::zero());
        }

        // Reuse the first dimension for emitter selection.
        let scaled = u.x * n as Float;
        let index = min(scaled as usize, n - 1);
        let u = Point2f::new(scaled - index as Float, u.y);
        let select_pdf = 1.0 / n as Float;

        let (mut ds, value) = self.emitters[index].sample_direction(ctx, &si.p, &u);
        ds.emitter = index;
        ds.pdf *= select_pdf;
        if ds.pdf <= 0.0 {
            return (DirectionSample::default(), AdSpectrum::zero());
        }

        if test_visibility {
            let shadow_ray = si.spawn_ray_to(&(si.p + ds.d * ds.dist));
            if self.occluded(&shadow_ray, ctx.params) {
                return (DirectionSample::default(), AdSpectrum::zero());
            }
        }

        (ds, value * (1.0 / ds.pdf))
    }

    /// Solid-angle pdf of `sample_emitter_direction` producing the given
    /// direction, summed over all non-delta emitters.
    ///
    /// * `params` - Scene parameters.
    /// * `ref_p`  - Reference point.
    /// * `d`      - Direction from the reference point.
    pub fn pdf_emitter_direction(
        &self,
        params: &SceneParameters,
        ref_p: &Point3f,
        d: &Vector3f,
    ) -> Float {
        let n = self.emitters.len();
        if n == 0 {
            return 0.0;
        }
        let _ = params;
        let select_pdf = 1.0 / n as Float;
        self.emitters
            .iter()
            .map(|e| e.pdf_direction(ref_p, d) * select_pdf)
            .sum()
    }

    /// Hit position as a differentiable function of the hit shape's
    /// translation parameter. The value equals `si.p`; the derivative
    /// follows the shape's motion.
    ///
    /// * `ctx` - Evaluation context.
    /// * `si`  - The interaction.
    pub fn attached_point<'t>(
        &self,
        ctx: &AdContext<'_, 't>,
        si: &SurfaceInteraction,
    ) -> AdVector3<'t> {
        let p = AdVector3::constant(si.p);
        if !si.valid {
            return p;
        }
        match self.shapes[si.shape].translation.as_ref() {
            Some(name) => {
                let t = ctx.vector3(name);
                p + (t - t.detach())
            }
            None => p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn single_sphere_scene() -> (Scene, SceneParameters) {
        let mut params = SceneParameters::new();
        params.insert("mat.reflectance", vec![0.5, 0.5, 0.5]);
        params.insert("sphere.translation", vec![0.0, 0.0, 0.0]);
        let scene = Scene::new(
            vec![Sphere::new(Point3f::new(0.0, 0.0, 3.0), 1.0, 0)
                .with_translation("sphere.translation")],
            vec![Box::new(DiffuseBsdf::new("mat.reflectance"))],
            vec![],
        );
        (scene, params)
    }

    #[test]
    fn intersect_reports_near_hit() {
        let (scene, params) = single_sphere_scene();
        let ray = Ray::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), INFINITY);
        let si = scene.intersect(&ray, &params);
        assert!(si.valid);
        assert!(approx_eq!(Float, si.t, 2.0, epsilon = 1e-4));
        assert!(approx_eq!(Float, si.n.z, -1.0, epsilon = 1e-4));
    }

    #[test]
    fn translation_moves_intersection() {
        let (scene, mut params) = single_sphere_scene();
        params.get_mut("sphere.translation").unwrap().values[2] = 1.0;
        let ray = Ray::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), INFINITY);
        let si = scene.intersect(&ray, &params);
        assert!(approx_eq!(Float, si.t, 3.0, epsilon = 1e-4));
    }

    #[test]
    fn missing_ray_is_invalid() {
        let (scene, params) = single_sphere_scene();
        let ray = Ray::new(Point3f::zero(), Vector3f::new(0.0, 1.0, 0.0), INFINITY);
        assert!(!scene.intersect(&ray, &params).valid);
    }

    #[test]
    fn attached_point_value_is_primal() {
        let (scene, params) = single_sphere_scene();
        let tape = Tape::new();
        let binding = params.bind(&tape);
        let ctx = AdContext::recording(&params, &binding);

        let ray = Ray::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), INFINITY);
        let si = scene.intersect(&ray, &params);
        let p = scene.attached_point(&ctx, &si);
        assert!(approx_eq!(Float, (p.value() - si.p).length(), 0.0, epsilon = 1e-6));

        // The derivative of p.z along the translation's z-component is 1.
        let fwd = {
            let mut seeds = vec![0.0; tape.num_inputs()];
            // sphere.translation occupies the slots after mat.reflectance.
            seeds[5] = 1.0;
            tape.forward(&seeds)
        };
        assert!(approx_eq!(Float, fwd.deriv(&p.z), 1.0, epsilon = 1e-6));
    }
}
