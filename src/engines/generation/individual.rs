use crate::vocab::Vocabulary;
use std::collections::HashMap;

/// Named fitness components produced by the evaluator.
pub mod components {
    pub const COMPRESSION: &str = "compression";
    pub const SPARSITY: &str = "sparsity";
    pub const OOV_COVERAGE: &str = "oov_coverage";
    pub const CONTEXT_COVERAGE: &str = "context_coverage";
    pub const PERPLEXITY_PROXY: &str = "perplexity_proxy";
}

/// One candidate vocabulary plus its fitness record.
#[derive(Debug, Clone)]
pub struct Individual {
    pub vocab: Vocabulary,
    pub fitness_scores: HashMap<String, f64>,
    pub overall_fitness: f64,
    pub generation: usize,
    pub pareto_rank: usize,
    pub crowding_distance: f64,
}

impl Individual {
    pub fn new(vocab: Vocabulary, generation: usize) -> Self {
        Self {
            vocab,
            fitness_scores: HashMap::new(),
            overall_fitness: 0.0,
            generation,
            pareto_rank: 0,
            crowding_distance: 0.0,
        }
    }

    pub fn score(&self, component: &str) -> f64 {
        self.fitness_scores.get(component).copied().unwrap_or(0.0)
    }
}

/// Mutable state of one GA run.
#[derive(Debug, Clone)]
pub struct GaState {
    pub generation: usize,
    pub best_fitness: f64,
    pub stagnation_count: usize,
    pub population: Vec<Individual>,
}

/// Per-generation progress record kept for reporting.
#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub generation: usize,
    pub best_fitness: f64,
    pub best_vocab_size: usize,
    pub best_scores: HashMap<String, f64>,
}
