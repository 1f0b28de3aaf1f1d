use super::traits::ConfigSection;
use crate::error::{EvotokError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    Tournament,
    Pareto,
}

/// Genetic-algorithm parameters for vocabulary evolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elite_size: usize,
    pub tournament_size: usize,
    pub selection_method: SelectionMethod,
    /// Consecutive non-improving generations before a catastrophic reset.
    pub stagnation_threshold: usize,
    /// Fraction of the population reinitialized on a catastrophic reset.
    pub catastrophic_mutation_rate: f64,
    /// Reject mutation candidates that are not valid UTF-8.
    pub byte_validity_check: bool,
    /// Draw mutation candidates from the corpus n-gram frequency table.
    pub ngram_guided_mutation: bool,
    /// Tokens sampled into a fresh individual: lower bound.
    pub init_tokens_min: usize,
    /// Tokens sampled into a fresh individual: upper bound.
    pub init_tokens_max: usize,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            elite_size: 5,
            tournament_size: 3,
            selection_method: SelectionMethod::Pareto,
            stagnation_threshold: 10,
            catastrophic_mutation_rate: 0.3,
            byte_validity_check: true,
            ngram_guided_mutation: true,
            init_tokens_min: 50,
            init_tokens_max: 200,
        }
    }
}

impl ConfigSection for GaConfig {
    fn section_name() -> &'static str {
        "ga"
    }

    fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(EvotokError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvotokError::Configuration(
                "Mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(EvotokError::Configuration(
                "Crossover rate must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.catastrophic_mutation_rate) {
            return Err(EvotokError::Configuration(
                "Catastrophic mutation rate must be between 0 and 1".to_string(),
            ));
        }
        if self.elite_size >= self.population_size {
            return Err(EvotokError::Configuration(
                "Elite size must be smaller than the population".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(EvotokError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        if self.init_tokens_min > self.init_tokens_max {
            return Err(EvotokError::Configuration(
                "init_tokens_min must not exceed init_tokens_max".to_string(),
            ));
        }
        Ok(())
    }
}

/// Two-phase subword/phrase evolution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchicalConfig {
    pub enabled: bool,
    pub subword_generations: usize,
    pub phrase_generations: usize,
    pub subword_mutation_rate: f64,
    pub phrase_mutation_rate: f64,
    /// N-gram horizon for the subword phase.
    pub subword_max_ngram: usize,
    /// N-gram horizon for the phrase phase.
    pub phrase_max_ngram: usize,
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            subword_generations: 50,
            phrase_generations: 30,
            subword_mutation_rate: 0.15,
            phrase_mutation_rate: 0.08,
            subword_max_ngram: 4,
            phrase_max_ngram: 8,
        }
    }
}

impl ConfigSection for HierarchicalConfig {
    fn section_name() -> &'static str {
        "hierarchical"
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.subword_mutation_rate)
            || !(0.0..=1.0).contains(&self.phrase_mutation_rate)
        {
            return Err(EvotokError::Configuration(
                "Phase mutation rates must be between 0 and 1".to_string(),
            ));
        }
        if self.subword_max_ngram == 0 || self.phrase_max_ngram == 0 {
            return Err(EvotokError::Configuration(
                "N-gram horizons must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
