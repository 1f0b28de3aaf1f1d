use super::traits::ConfigSection;
use crate::error::{EvotokError, Result};
use serde::{Deserialize, Serialize};

/// Boundary-optimizer backend selector.
///
/// Only the classical simulation is implemented; the other tags are reserved
/// for hardware-backed optimizers and are rejected by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    Simulated,
    Qutip,
    Qiskit,
    Hardware,
}

impl Default for BackendType {
    fn default() -> Self {
        BackendType::Simulated
    }
}

/// Parameters for the simulated variational boundary optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantumConfig {
    pub backend_type: BackendType,
    /// Boundary decision bits per segment; the search space is 2^num_qubits.
    pub num_qubits: usize,
    /// Bytes per segment fed to the boundary optimizer.
    pub segment_size: usize,
    pub max_iterations: usize,
    /// Finite-difference gradient descent instead of SPSA perturbation.
    pub use_gradient: bool,
    pub circuit_depth_low_entropy: usize,
    pub circuit_depth_high_entropy: usize,
    pub boundary_cost: f64,
    pub merge_benefit: f64,
    pub cache_solutions: bool,
    /// Contexts scanned during the boundary-refinement pass.
    pub refine_context_limit: usize,
}

impl Default for QuantumConfig {
    fn default() -> Self {
        Self {
            backend_type: BackendType::Simulated,
            num_qubits: 8,
            segment_size: 32,
            max_iterations: 100,
            use_gradient: false,
            circuit_depth_low_entropy: 2,
            circuit_depth_high_entropy: 8,
            boundary_cost: 1.0,
            merge_benefit: 0.5,
            cache_solutions: true,
            refine_context_limit: 10,
        }
    }
}

impl ConfigSection for QuantumConfig {
    fn section_name() -> &'static str {
        "quantum"
    }

    fn validate(&self) -> Result<()> {
        if self.num_qubits == 0 || self.num_qubits > 16 {
            return Err(EvotokError::Configuration(
                "num_qubits must be between 1 and 16".to_string(),
            ));
        }
        if self.segment_size < 4 {
            return Err(EvotokError::Configuration(
                "segment_size must be at least 4 bytes".to_string(),
            ));
        }
        if self.circuit_depth_low_entropy > self.circuit_depth_high_entropy {
            return Err(EvotokError::Configuration(
                "Low-entropy circuit depth must not exceed high-entropy depth".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(EvotokError::Configuration(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
