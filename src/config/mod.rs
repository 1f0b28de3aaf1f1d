pub mod evolution;
pub mod fitness;
pub mod manager;
pub mod quantum;
pub mod safety;
pub mod traits;

pub use evolution::{GaConfig, HierarchicalConfig, SelectionMethod};
pub use fitness::FitnessConfig;
pub use manager::{ConfigManager, EvotokConfig};
pub use quantum::{BackendType, QuantumConfig};
pub use safety::{DpMechanism, SafetyConfig};
pub use traits::{ConfigSection, Mode};
