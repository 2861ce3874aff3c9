//! Automatic Differentiation
//!
//! An arena tape recording a computation graph over dual values. Local
//! partial derivatives are precomputed at record time, so a recorded segment
//! supports exactly one forward or backward sweep before it is discarded.
//! The replay integrator records one bounce at a time, sweeps it, and then
//! truncates the tape back to its input nodes, bounding graph memory to the
//! batch size regardless of path length.
//!
//! Values that never touch a tape (the `no-grad` execution mode) carry no
//! node handle and record nothing.

#![allow(dead_code)]

mod float;
mod linalg;

// Re-export.
pub use float::*;
pub use linalg::*;

use crate::base::*;
use std::cell::{Cell, RefCell};

/// Sentinel index for a missing parent.
pub(crate) const NO_PARENT: u32 = u32::MAX;

/// One recorded operation: up to two parents with precomputed partials.
#[derive(Copy, Clone)]
struct Node {
    lhs: u32,
    rhs: u32,
    d_lhs: Float,
    d_rhs: Float,
}

/// Arena tape over which dual values record their operations.
pub struct Tape {
    nodes: RefCell<Vec<Node>>,

    /// Number of leading input (parameter) nodes. These survive truncation.
    inputs: Cell<u32>,
}

impl Tape {
    /// Create an empty tape.
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            inputs: Cell::new(0),
        }
    }

    /// Register a differentiable input and return its attached value.
    /// Inputs must be created before any interior node is recorded.
    ///
    /// * `value` - The input's primal value.
    pub fn input(&self, value: Float) -> AdFloat<'_> {
        let mut nodes = self.nodes.borrow_mut();
        assert!(
            nodes.len() == self.inputs.get() as usize,
            "tape inputs must be registered before interior nodes"
        );
        let id = nodes.len() as u32;
        nodes.push(Node {
            lhs: NO_PARENT,
            rhs: NO_PARENT,
            d_lhs: 0.0,
            d_rhs: 0.0,
        });
        self.inputs.set(id + 1);
        AdFloat::attached(self, id, value)
    }

    /// Number of registered input nodes.
    pub fn num_inputs(&self) -> usize {
        self.inputs.get() as usize
    }

    /// Total number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard every interior node, keeping only the input nodes. Any
    /// `AdFloat` recorded before this call is invalidated.
    pub fn truncate_to_inputs(&self) {
        self.nodes.borrow_mut().truncate(self.inputs.get() as usize);
    }

    pub(crate) fn push_unary(&self, lhs: u32, d_lhs: Float) -> u32 {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len() as u32;
        nodes.push(Node {
            lhs,
            rhs: NO_PARENT,
            d_lhs,
            d_rhs: 0.0,
        });
        id
    }

    pub(crate) fn push_binary(&self, lhs: u32, d_lhs: Float, rhs: u32, d_rhs: Float) -> u32 {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len() as u32;
        nodes.push(Node {
            lhs,
            rhs,
            d_lhs,
            d_rhs,
        });
        id
    }

    /// Forward sweep: propagate the given per-input derivative seeds through
    /// every recorded node and return the per-node derivatives.
    ///
    /// * `seeds` - One derivative seed per input node.
    pub fn forward(&self, seeds: &[Float]) -> ForwardSweep {
        let nodes = self.nodes.borrow();
        let n_inputs = self.inputs.get() as usize;
        assert_eq!(seeds.len(), n_inputs);

        let mut derivs = vec![0.0; nodes.len()];
        derivs[..n_inputs].copy_from_slice(seeds);
        for i in n_inputs..nodes.len() {
            let node = &nodes[i];
            let mut d = 0.0;
            if node.lhs != NO_PARENT {
                d += node.d_lhs * derivs[node.lhs as usize];
            }
            if node.rhs != NO_PARENT {
                d += node.d_rhs * derivs[node.rhs as usize];
            }
            derivs[i] = d;
        }
        ForwardSweep { derivs }
    }

    /// Backward sweep: seed output adjoints and accumulate the resulting
    /// input adjoints into `input_grads` (indexed by input node).
    ///
    /// * `seeds`       - `(node, adjoint)` pairs for the outputs.
    /// * `input_grads` - Accumulator with one slot per input node.
    pub fn backward(&self, seeds: &[(u32, Float)], input_grads: &mut [Float]) {
        let nodes = self.nodes.borrow();
        let n_inputs = self.inputs.get() as usize;
        assert_eq!(input_grads.len(), n_inputs);

        let mut adjoints = vec![0.0; nodes.len()];
        for &(node, adj) in seeds {
            adjoints[node as usize] += adj;
        }
        for i in (n_inputs..nodes.len()).rev() {
            let adj = adjoints[i];
            if adj == 0.0 {
                continue;
            }
            let node = &nodes[i];
            if node.lhs != NO_PARENT {
                adjoints[node.lhs as usize] += node.d_lhs * adj;
            }
            if node.rhs != NO_PARENT {
                adjoints[node.rhs as usize] += node.d_rhs * adj;
            }
        }
        for (grad, adj) in input_grads.iter_mut().zip(adjoints[..n_inputs].iter()) {
            *grad += adj;
        }
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-node derivatives produced by a forward sweep.
pub struct ForwardSweep {
    derivs: Vec<Float>,
}

impl ForwardSweep {
    /// Derivative of a recorded value; 0 for detached values.
    ///
    /// * `v` - The value.
    pub fn deriv(&self, v: &AdFloat<'_>) -> Float {
        match v.node_id() {
            Some(node) => self.derivs[node as usize],
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    // f(x, y) = x^2 * y + sin-free mix of ops; df/dx = 2xy + 1/y at the
    // chosen point via the quotient term.
    fn record<'t>(tape: &'t Tape, x: AdFloat<'t>, y: AdFloat<'t>) -> AdFloat<'t> {
        x * x * y + x / y
    }

    #[test]
    fn forward_matches_backward() {
        let tape = Tape::new();
        let x = tape.input(1.5);
        let y = tape.input(-2.0);
        let f = record(&tape, x, y);

        // Backward: gradient of f.
        let mut grads = vec![0.0; tape.num_inputs()];
        tape.backward(&[(f.node_id().unwrap(), 1.0)], &mut grads);

        // Forward along each axis reproduces the same gradient.
        let fwd_x = tape.forward(&[1.0, 0.0]).deriv(&f);
        let fwd_y = tape.forward(&[0.0, 1.0]).deriv(&f);
        assert!(approx_eq!(Float, grads[0], fwd_x, epsilon = 1e-5));
        assert!(approx_eq!(Float, grads[1], fwd_y, epsilon = 1e-5));

        // And against the closed form.
        let (xv, yv) = (1.5, -2.0);
        assert!(approx_eq!(Float, grads[0], 2.0 * xv * yv + 1.0 / yv, epsilon = 1e-5));
        assert!(approx_eq!(Float, grads[1], xv * xv - xv / (yv * yv), epsilon = 1e-5));
    }

    #[test]
    fn detach_severs_gradient() {
        let tape = Tape::new();
        let x = tape.input(3.0);
        let f = x.detach() * x;
        let mut grads = vec![0.0; 1];
        tape.backward(&[(f.node_id().unwrap(), 1.0)], &mut grads);
        // d/dx detach(x) * x = detach(x) = 3, not 2x = 6.
        assert!(approx_eq!(Float, grads[0], 3.0, epsilon = 1e-6));
    }

    #[test]
    fn truncation_preserves_inputs() {
        let tape = Tape::new();
        let x = tape.input(2.0);
        let f = x * x;
        assert!(tape.len() > tape.num_inputs());
        let mut grads = vec![0.0; 1];
        tape.backward(&[(f.node_id().unwrap(), 1.0)], &mut grads);
        tape.truncate_to_inputs();
        assert_eq!(tape.len(), tape.num_inputs());

        // Inputs remain usable for a fresh segment.
        let g = x * 4.0;
        let mut grads2 = vec![0.0; 1];
        tape.backward(&[(g.node_id().unwrap(), 1.0)], &mut grads2);
        assert!(approx_eq!(Float, grads2[0], 4.0, epsilon = 1e-6));
    }

    #[test]
    fn no_grad_records_nothing() {
        let tape = Tape::new();
        let _ = tape.input(1.0);
        let before = tape.len();
        let a = AdFloat::constant(2.0);
        let b = AdFloat::constant(5.0);
        let c = a * b + a.sqrt();
        assert!(c.node_id().is_none());
        assert_eq!(tape.len(), before);
    }
}
