//! Scene Parameters

#![allow(dead_code)]

use crate::autodiff::*;
use crate::base::*;
use crate::geometry::*;
use crate::spectrum::*;
use std::cell::RefCell;

/// One differentiable parameter array: primal values, the gradient
/// accumulated by backward renders, and the perturbation direction used to
/// seed forward renders.
#[derive(Clone, Debug, Default)]
pub struct ParamArray {
    /// Primal values.
    pub values: Vec<Float>,

    /// Accumulated gradient (same length as `values`).
    pub grad: Vec<Float>,

    /// Forward-mode perturbation direction (same length as `values`).
    pub seed: Vec<Float>,
}

impl ParamArray {
    /// Create a parameter array with zero gradient and seed.
    ///
    /// * `values` - The primal values.
    pub fn new(values: Vec<Float>) -> Self {
        let n = values.len();
        Self {
            values,
            grad: vec![0.0; n],
            seed: vec![0.0; n],
        }
    }
}

/// Named mapping from parameter identifiers to differentiable arrays. Owned
/// by the caller; the integrator only reads values and accumulates
/// gradients through a `ParamBinding`.
#[derive(Clone, Debug, Default)]
pub struct SceneParameters {
    entries: Vec<(String, ParamArray)>,
}

impl SceneParameters {
    /// Create an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a parameter array.
    ///
    /// * `name`   - Parameter identifier.
    /// * `values` - Primal values.
    pub fn insert(&mut self, name: &str, values: Vec<Float>) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = ParamArray::new(values);
        } else {
            self.entries.push((name.to_owned(), ParamArray::new(values)));
        }
    }

    /// Look up a parameter array.
    ///
    /// * `name` - Parameter identifier.
    pub fn get(&self, name: &str) -> Option<&ParamArray> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// Look up a parameter array mutably.
    ///
    /// * `name` - Parameter identifier.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParamArray> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    /// Primal value of one component; 0 for unknown parameters.
    ///
    /// * `name` - Parameter identifier.
    /// * `i`    - Component index.
    pub fn value(&self, name: &str, i: usize) -> Float {
        self.get(name).map_or(0.0, |a| a.values[i])
    }

    /// First three components as a vector; zero for unknown parameters.
    ///
    /// * `name` - Parameter identifier.
    pub fn vector3(&self, name: &str) -> Vector3f {
        self.get(name).map_or_else(Vector3f::zero, |a| {
            Vector3f::new(a.values[0], a.values[1], a.values[2])
        })
    }

    /// First three components as a spectrum; black for unknown parameters.
    ///
    /// * `name` - Parameter identifier.
    pub fn spectrum(&self, name: &str) -> Spectrum {
        self.get(name).map_or(Spectrum::ZERO, |a| {
            Spectrum::from_rgb(a.values[0], a.values[1], a.values[2])
        })
    }

    /// Set the forward-mode perturbation direction of a parameter.
    ///
    /// * `name` - Parameter identifier.
    /// * `seed` - The direction, one value per component.
    pub fn set_seed(&mut self, name: &str, seed: &[Float]) {
        if let Some(a) = self.get_mut(name) {
            assert_eq!(seed.len(), a.values.len());
            a.seed.copy_from_slice(seed);
        }
    }

    /// Reset all accumulated gradients to zero.
    pub fn clear_grads(&mut self) {
        for (_, a) in self.entries.iter_mut() {
            a.grad.iter_mut().for_each(|g| *g = 0.0);
        }
    }

    /// Register every component as a tape input, in insertion order.
    ///
    /// * `tape` - The recording tape.
    pub fn bind<'t>(&self, tape: &'t Tape) -> ParamBinding<'t> {
        let mut slots = Vec::with_capacity(self.entries.len());
        let mut inputs = Vec::new();
        let mut seeds = Vec::new();
        for (name, array) in self.entries.iter() {
            slots.push((name.clone(), inputs.len(), array.values.len()));
            for (v, s) in array.values.iter().zip(array.seed.iter()) {
                inputs.push(tape.input(*v));
                seeds.push(*s);
            }
        }
        let n = inputs.len();
        ParamBinding {
            slots,
            inputs,
            seeds,
            grads: RefCell::new(vec![0.0; n]),
        }
    }
}

/// A set of parameters bound to a tape: one input node per component, plus
/// the adjoint accumulator those nodes drain into.
pub struct ParamBinding<'t> {
    slots: Vec<(String, usize, usize)>,
    inputs: Vec<AdFloat<'t>>,
    seeds: Vec<Float>,
    grads: RefCell<Vec<Float>>,
}

impl<'t> ParamBinding<'t> {
    /// The attached value of one component, if the parameter exists.
    ///
    /// * `name` - Parameter identifier.
    /// * `i`    - Component index.
    pub fn get(&self, name: &str, i: usize) -> Option<AdFloat<'t>> {
        self.slots
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, offset, len)| {
                debug_assert!(i < *len);
                self.inputs[offset + i]
            })
    }

    /// Forward-mode seeds, one per bound component.
    pub fn seeds(&self) -> &[Float] {
        &self.seeds
    }

    /// Run a backward sweep over the given tape and accumulate the input
    /// adjoints into this binding.
    ///
    /// * `tape`  - The tape the binding was created on.
    /// * `seeds` - `(node, adjoint)` output seeds.
    pub fn backward(&self, tape: &Tape, seeds: &[(u32, Float)]) {
        let mut grads = self.grads.borrow_mut();
        tape.backward(seeds, grads.as_mut_slice());
    }

    /// Add the accumulated adjoints into the caller's parameter gradients.
    ///
    /// * `params` - The parameter map this binding was created from.
    pub fn write_back(&self, params: &mut SceneParameters) {
        let grads = self.grads.borrow();
        for (name, offset, len) in self.slots.iter() {
            if let Some(a) = params.get_mut(name) {
                for i in 0..*len {
                    a.grad[i] += grads[offset + i];
                }
            }
        }
    }
}

/// Evaluation context threaded through scene queries: the parameter values
/// plus, in differentiated modes, the tape binding. Without a binding every
/// lookup is detached and nothing is recorded (the `no-grad` scope).
#[derive(Copy, Clone)]
pub struct AdContext<'a, 't> {
    /// The caller-owned scene parameters.
    pub params: &'a SceneParameters,

    /// The tape binding, present only in differentiated modes.
    pub binding: Option<&'a ParamBinding<'t>>,
}

impl<'a, 't> AdContext<'a, 't> {
    /// A detached (primal, no-grad) context.
    ///
    /// * `params` - The scene parameters.
    pub fn detached(params: &'a SceneParameters) -> Self {
        Self {
            params,
            binding: None,
        }
    }

    /// A recording context.
    ///
    /// * `params`  - The scene parameters.
    /// * `binding` - The tape binding.
    pub fn recording(params: &'a SceneParameters, binding: &'a ParamBinding<'t>) -> Self {
        Self {
            params,
            binding: Some(binding),
        }
    }

    /// True if lookups return attached values.
    pub fn is_recording(&self) -> bool {
        self.binding.is_some()
    }

    /// One component, attached when recording.
    ///
    /// * `name` - Parameter identifier.
    /// * `i`    - Component index.
    pub fn get(&self, name: &str, i: usize) -> AdFloat<'t> {
        match self.binding.and_then(|b| b.get(name, i)) {
            Some(v) => v,
            None => AdFloat::constant(self.params.value(name, i)),
        }
    }

    /// First three components as a dual spectrum.
    ///
    /// * `name` - Parameter identifier.
    pub fn spectrum(&self, name: &str) -> AdSpectrum<'t> {
        AdSpectrum::new([self.get(name, 0), self.get(name, 1), self.get(name, 2)])
    }

    /// First three components as a dual vector.
    ///
    /// * `name` - Parameter identifier.
    pub fn vector3(&self, name: &str) -> AdVector3<'t> {
        AdVector3::new(self.get(name, 0), self.get(name, 1), self.get(name, 2))
    }
}
