//! Variational boundary optimization over a simulated qubit register.
//!
//! Each qubit stands for one candidate boundary position inside a
//! segment. A diagonal Hamiltonian scores every boundary assignment, and
//! a product-form ansatz is trained to concentrate probability on cheap
//! assignments. The argmax basis state is decoded back into byte offsets.

use crate::config::{BackendType, QuantumConfig};
use crate::engines::quantum::stats::shannon_entropy;
use crate::error::{EvotokError, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CONVERGENCE_TOL: f64 = 1e-6;
const PROB_EPSILON: f64 = 1e-12;

/// Outcome of one variational run.
#[derive(Debug, Clone)]
pub struct VqeResult {
    pub optimal_params: Vec<f64>,
    pub optimal_cost: f64,
    pub boundaries: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
}

pub trait BoundaryBackend: Send {
    /// Diagonal Hamiltonian over the 2^n boundary assignments.
    fn build_hamiltonian(&self, segment: &[u8]) -> Vec<f64>;

    /// Train the ansatz against the Hamiltonian and decode the winner.
    fn run_vqe(&mut self, hamiltonian: &[f64], segment_len: usize, depth: usize)
        -> Result<VqeResult>;

    /// Boundary offsets encoded by one basis state.
    fn decode_boundaries(&self, state: usize, segment_len: usize) -> Vec<usize>;

    /// Circuit depth scaled by segment entropy. High-entropy segments get
    /// deeper circuits.
    fn entropy_adapted_depth(&self, entropy: f64) -> usize;

    fn optimize_boundaries(&mut self, segment: &[u8]) -> Result<VqeResult> {
        let hamiltonian = self.build_hamiltonian(segment);
        let depth = self.entropy_adapted_depth(shannon_entropy(segment));
        self.run_vqe(&hamiltonian, segment.len(), depth)
    }
}

/// Backend factory. Only the local simulator is implemented; the other
/// variants name integrations that would need external runtimes.
pub fn create_backend(config: &QuantumConfig, seed: u64) -> Result<Box<dyn BoundaryBackend>> {
    match config.backend_type {
        BackendType::Simulated => Ok(Box::new(SimulatedBackend::new(config.clone(), seed))),
        other => Err(EvotokError::Configuration(format!(
            "backend {:?} is not available in this build",
            other
        ))),
    }
}

pub struct SimulatedBackend {
    config: QuantumConfig,
    rng: StdRng,
}

impl SimulatedBackend {
    pub fn new(config: QuantumConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Byte offset a qubit stands for: qubits are spread evenly through
    /// the interior of the segment, never at its ends.
    fn qubit_position(&self, qubit: usize, segment_len: usize) -> usize {
        ((qubit + 1) * segment_len) / (self.config.num_qubits + 1)
    }

    /// Entropy of a 4-byte window around the position.
    fn local_entropy(segment: &[u8], position: usize) -> f64 {
        let start = position.saturating_sub(2);
        let end = (position + 2).min(segment.len());
        if start >= end {
            return 0.0;
        }
        shannon_entropy(&segment[start..end])
    }

    /// Per-basis-state probabilities under the product ansatz. Each qubit
    /// contributes sin^2(theta/2) to its bit being set, with theta summed
    /// over layers; trailing phase parameters do not affect the diagonal
    /// expectation but keep the parameter shape of a full circuit.
    fn state_probabilities(&self, params: &[f64], depth: usize) -> Vec<f64> {
        let n = self.config.num_qubits;
        let mut one_probs = vec![0.0f64; n];
        for (q, prob) in one_probs.iter_mut().enumerate() {
            let theta: f64 = (0..depth).map(|layer| params[layer * n + q]).sum();
            *prob = (theta / 2.0).sin().powi(2);
        }

        let dim = 1usize << n;
        let mut probs = vec![0.0f64; dim];
        let mut total = 0.0;
        for (state, slot) in probs.iter_mut().enumerate() {
            let mut p = 1.0;
            for (q, one_prob) in one_probs.iter().enumerate() {
                if state >> q & 1 == 1 {
                    p *= one_prob;
                } else {
                    p *= 1.0 - one_prob;
                }
            }
            *slot = p;
            total += p;
        }

        // Renormalize; the guard keeps degenerate parameter vectors from
        // dividing by zero.
        if total < PROB_EPSILON {
            let uniform = 1.0 / dim as f64;
            probs.iter_mut().for_each(|p| *p = uniform);
        } else {
            probs.iter_mut().for_each(|p| *p /= total);
        }
        probs
    }

    fn expectation(&self, params: &[f64], hamiltonian: &[f64], depth: usize) -> f64 {
        self.state_probabilities(params, depth)
            .iter()
            .zip(hamiltonian)
            .map(|(p, h)| p * h)
            .sum()
    }

    /// Finite-difference gradient descent step.
    fn gradient_step(&self, params: &mut [f64], hamiltonian: &[f64], depth: usize) {
        const EPS: f64 = 0.01;
        const LR: f64 = 0.1;

        let mut gradient = vec![0.0f64; params.len()];
        for i in 0..params.len() {
            let original = params[i];
            params[i] = original + EPS;
            let up = self.expectation(params, hamiltonian, depth);
            params[i] = original - EPS;
            let down = self.expectation(params, hamiltonian, depth);
            params[i] = original;
            gradient[i] = (up - down) / (2.0 * EPS);
        }
        for (p, g) in params.iter_mut().zip(&gradient) {
            *p -= LR * g;
        }
    }

    /// Simultaneous-perturbation step: two evaluations per iteration
    /// regardless of parameter count.
    fn spsa_step(
        &mut self,
        params: &mut [f64],
        hamiltonian: &[f64],
        depth: usize,
        iteration: usize,
    ) {
        let a_k = 0.1 / (iteration as f64 + 1.0).powf(0.602);
        let c_k = 0.1 / (iteration as f64 + 1.0).powf(0.101);

        let delta: Vec<f64> = (0..params.len())
            .map(|_| if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 })
            .collect();

        let plus: Vec<f64> = params
            .iter()
            .zip(&delta)
            .map(|(p, d)| p + c_k * d)
            .collect();
        let minus: Vec<f64> = params
            .iter()
            .zip(&delta)
            .map(|(p, d)| p - c_k * d)
            .collect();

        let diff = self.expectation(&plus, hamiltonian, depth)
            - self.expectation(&minus, hamiltonian, depth);

        for (p, d) in params.iter_mut().zip(&delta) {
            *p -= a_k * diff / (2.0 * c_k * d);
        }
    }

}

impl BoundaryBackend for SimulatedBackend {
    fn decode_boundaries(&self, state: usize, segment_len: usize) -> Vec<usize> {
        let mut boundaries: Vec<usize> = (0..self.config.num_qubits)
            .filter(|q| state >> q & 1 == 1)
            .map(|q| self.qubit_position(q, segment_len))
            .filter(|&pos| pos > 0 && pos < segment_len)
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();
        boundaries
    }

    fn build_hamiltonian(&self, segment: &[u8]) -> Vec<f64> {
        let n = self.config.num_qubits;
        let dim = 1usize << n;

        let positions: Vec<usize> = (0..n).map(|q| self.qubit_position(q, segment.len())).collect();
        let local_entropies: Vec<f64> = positions
            .iter()
            .map(|&pos| Self::local_entropy(segment, pos))
            .collect();

        let mut diagonal = vec![0.0f64; dim];
        for (state, energy) in diagonal.iter_mut().enumerate() {
            let mut cost = 0.0;
            for q in 0..n {
                if state >> q & 1 == 1 {
                    // Each boundary costs a flat penalty minus a reward for
                    // cutting where the byte stream actually changes.
                    cost += self.config.boundary_cost - local_entropies[q];
                } else {
                    // Leaving a low-entropy span unsplit earns the merge
                    // benefit.
                    cost -= self.config.merge_benefit * (2.0 - local_entropies[q]).max(0.0) / 2.0;
                }
            }
            *energy = cost;
        }
        diagonal
    }

    fn run_vqe(
        &mut self,
        hamiltonian: &[f64],
        segment_len: usize,
        depth: usize,
    ) -> Result<VqeResult> {
        let n = self.config.num_qubits;
        if hamiltonian.len() != 1 << n {
            return Err(EvotokError::Backend(format!(
                "hamiltonian dimension {} does not match {} qubits",
                hamiltonian.len(),
                n
            )));
        }

        // Rotation layers plus one phase parameter per qubit.
        let param_count = depth * n + n;
        let mut params: Vec<f64> = (0..param_count)
            .map(|_| self.rng.gen_range(-0.1..0.1))
            .collect();

        let mut best_cost = self.expectation(&params, hamiltonian, depth);
        let mut best_params = params.clone();
        let mut iterations = 0;
        let mut converged = false;

        for iteration in 0..self.config.max_iterations {
            iterations = iteration + 1;

            if self.config.use_gradient {
                self.gradient_step(&mut params, hamiltonian, depth);
            } else {
                self.spsa_step(&mut params, hamiltonian, depth, iteration);
            }

            let cost = self.expectation(&params, hamiltonian, depth);
            if cost < best_cost {
                let improvement = best_cost - cost;
                best_cost = cost;
                best_params = params.clone();
                if improvement < CONVERGENCE_TOL {
                    converged = true;
                    break;
                }
            }
        }

        let probs = self.state_probabilities(&best_params, depth);
        let mut argmax = 0;
        for (state, &p) in probs.iter().enumerate() {
            if p > probs[argmax] {
                argmax = state;
            }
        }
        let boundaries = self.decode_boundaries(argmax, segment_len);

        debug!(
            "vqe: {} iterations, cost {:.4}, {} boundaries, converged={}",
            iterations,
            best_cost,
            boundaries.len(),
            converged
        );

        Ok(VqeResult {
            optimal_params: best_params,
            optimal_cost: best_cost,
            boundaries,
            iterations,
            converged,
        })
    }

    fn entropy_adapted_depth(&self, entropy: f64) -> usize {
        let normalized = (entropy / 4.0).clamp(0.0, 1.0);
        let low = self.config.circuit_depth_low_entropy as f64;
        let high = self.config.circuit_depth_high_entropy as f64;
        (low + normalized * (high - low)).round() as usize
    }
}
