use super::traits::ConfigSection;
use crate::error::{EvotokError, Result};
use serde::{Deserialize, Serialize};

/// Weights and thresholds for the fitness evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessConfig {
    pub compression_weight: f64,
    pub sparsity_weight: f64,
    pub oov_weight: f64,
    pub context_coverage_weight: f64,
    pub perplexity_weight: f64,
    /// Minimum distinct contexts a token must appear in to count as covered.
    pub min_context_coverage: usize,
    /// Minimum total occurrences a token must reach to count as covered.
    pub min_occurrence_count: usize,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            compression_weight: 0.3,
            sparsity_weight: 0.2,
            oov_weight: 0.25,
            context_coverage_weight: 0.1,
            perplexity_weight: 0.15,
            min_context_coverage: 1,
            min_occurrence_count: 2,
        }
    }
}

impl ConfigSection for FitnessConfig {
    fn section_name() -> &'static str {
        "fitness"
    }

    fn validate(&self) -> Result<()> {
        let weights = [
            self.compression_weight,
            self.sparsity_weight,
            self.oov_weight,
            self.context_coverage_weight,
            self.perplexity_weight,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(EvotokError::Configuration(
                "Fitness weights must be non-negative".to_string(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(EvotokError::Configuration(
                "At least one fitness weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
