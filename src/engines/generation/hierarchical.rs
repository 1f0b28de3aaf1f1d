//! Two-phase hierarchical evolution: a subword phase discovers short,
//! frequent units, then a phrase phase grows longer tokens on top of the
//! subword winner.

use crate::config::{FitnessConfig, GaConfig, HierarchicalConfig};
use crate::engines::generation::engine::GaOptimizer;
use crate::engines::generation::fitness::FitnessEvaluator;
use crate::engines::generation::individual::{GenerationRecord, Individual};
use crate::engines::generation::ngram::NgramTable;
use crate::engines::safety::{DifferentialPrivacy, ExploitPenalty};
use crate::error::Result;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct HierarchicalOptimizer {
    ga: GaConfig,
    hierarchical: HierarchicalConfig,
    fitness: FitnessConfig,
    exploit_penalty: Option<ExploitPenalty>,
    privacy: Option<DifferentialPrivacy>,
    seed: u64,
    history: Vec<GenerationRecord>,
}

impl HierarchicalOptimizer {
    pub fn new(
        ga: GaConfig,
        hierarchical: HierarchicalConfig,
        fitness: FitnessConfig,
        exploit_penalty: Option<ExploitPenalty>,
        seed: u64,
    ) -> Self {
        Self {
            ga,
            hierarchical,
            fitness,
            exploit_penalty,
            privacy: None,
            seed,
            history: Vec::new(),
        }
    }

    pub fn with_privacy(mut self, privacy: Option<DifferentialPrivacy>) -> Self {
        self.privacy = privacy;
        self
    }

    fn phase_table(&self, contexts: &[Vec<u8>], max_ngram: usize) -> NgramTable {
        let mut table = NgramTable::build(contexts, max_ngram);
        if let Some(privacy) = &self.privacy {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(2));
            table.apply_noise(privacy, &mut rng);
        }
        table
    }

    fn phase_optimizer(
        &self,
        generations: usize,
        mutation_rate: f64,
        seed: u64,
    ) -> GaOptimizer {
        let config = GaConfig {
            generations,
            mutation_rate,
            ..self.ga.clone()
        };
        let evaluator = FitnessEvaluator::new(self.fitness.clone(), self.exploit_penalty.clone());
        GaOptimizer::new(config, evaluator, seed)
    }

    /// Run both phases against the corpus and return the phrase-phase best.
    pub fn run(&mut self, contexts: &[Vec<u8>]) -> Result<Individual> {
        info!(
            "hierarchical phase 1: subwords, {} generations",
            self.hierarchical.subword_generations
        );
        let mut subword = self.phase_optimizer(
            self.hierarchical.subword_generations,
            self.hierarchical.subword_mutation_rate,
            self.seed,
        );
        subword.set_ngram_table(self.phase_table(contexts, self.hierarchical.subword_max_ngram));
        let subword_best = subword.run(contexts)?;
        self.history.extend_from_slice(subword.history());

        info!(
            "hierarchical phase 2: phrases on {} subword tokens, {} generations",
            subword_best.vocab.multi_byte_tokens().len(),
            self.hierarchical.phrase_generations
        );
        let mut phrase = self.phase_optimizer(
            self.hierarchical.phrase_generations,
            self.hierarchical.phrase_mutation_rate,
            self.seed.wrapping_add(1),
        );
        phrase.set_ngram_table(self.phase_table(contexts, self.hierarchical.phrase_max_ngram));
        phrase.seed_population(&subword_best.vocab);
        let phrase_best = phrase.run(contexts)?;
        self.history.extend_from_slice(phrase.history());

        Ok(phrase_best)
    }

    pub fn history(&self) -> &[GenerationRecord] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts() -> Vec<Vec<u8>> {
        vec![
            b"natural language processing with tokenizers".to_vec(),
            b"language models need tokenizers".to_vec(),
            b"processing natural language".to_vec(),
        ]
    }

    fn tiny() -> HierarchicalOptimizer {
        let ga = GaConfig {
            population_size: 6,
            elite_size: 2,
            init_tokens_min: 5,
            init_tokens_max: 15,
            ..GaConfig::default()
        };
        let hierarchical = HierarchicalConfig {
            enabled: true,
            subword_generations: 3,
            phrase_generations: 2,
            ..HierarchicalConfig::default()
        };
        HierarchicalOptimizer::new(ga, hierarchical, FitnessConfig::default(), None, 42)
    }

    #[test]
    fn both_phases_contribute_history() {
        let mut opt = tiny();
        let best = opt.run(&contexts()).unwrap();
        assert!(best.vocab.len() >= 256);
        assert_eq!(opt.history().len(), 3 + 2);
    }

    #[test]
    fn runs_are_reproducible() {
        let a = tiny().run(&contexts()).unwrap();
        let b = tiny().run(&contexts()).unwrap();
        assert_eq!(a.vocab.canonical_hash(), b.vocab.canonical_hash());
    }
}
