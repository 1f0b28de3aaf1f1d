pub mod engine;
pub mod fitness;
pub mod hierarchical;
pub mod individual;
pub mod ngram;
pub mod operators;
pub mod pareto;

pub use engine::GaOptimizer;
pub use fitness::FitnessEvaluator;
pub use hierarchical::HierarchicalOptimizer;
pub use individual::{components, GaState, GenerationRecord, Individual};
pub use ngram::NgramTable;
pub use pareto::{default_objectives, Objective, OptimizationDirection};
