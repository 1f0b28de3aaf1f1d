//! Top-level trainer/tokenizer facade.
//!
//! Owns the vocabulary lifecycle: evolution against a corpus, variational
//! boundary refinement, safety checks, stable encoding, and versioned
//! persistence.

use crate::config::{EvotokConfig, Mode};
use crate::corpus::CorpusSource;
use crate::engines::generation::{
    GaOptimizer, FitnessEvaluator, GenerationRecord, HierarchicalOptimizer, Individual, NgramTable,
};
use crate::engines::quantum::{
    create_backend, BoundaryBackend, ClassicalBoundaryOptimizer, SegmentStats, SolutionCache,
};
use crate::engines::safety::{DifferentialPrivacy, SafetyChecker, SafetyReport};
use crate::error::{EvotokError, Result};
use crate::vocab::{
    build_compatibility_map, is_valid_token, ReferenceTokenizer, VocabManager, VocabMetrics,
    VocabVersion, Vocabulary, MAX_TOKEN_LEN,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

pub struct QuantumEvoTokenizer {
    config: EvotokConfig,
    vocab: Vocabulary,
    manager: VocabManager,
    backend: Box<dyn BoundaryBackend>,
    solution_cache: SolutionCache,
    safety: SafetyChecker,
    history: Vec<GenerationRecord>,
    frozen: bool,
}

impl QuantumEvoTokenizer {
    pub fn new(config: EvotokConfig) -> Result<Self> {
        config.validate()?;
        let manager = VocabManager::new(config.output_dir.clone())?;
        let backend = create_backend(&config.quantum, config.seed)?;
        let safety = SafetyChecker::new(config.safety.clone());

        Ok(Self {
            config,
            vocab: Vocabulary::base(),
            manager,
            backend,
            solution_cache: SolutionCache::new(),
            safety,
            history: Vec::new(),
            frozen: false,
        })
    }

    pub fn config(&self) -> &EvotokConfig {
        &self.config
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn evolution_history(&self) -> &[GenerationRecord] {
        &self.history
    }

    fn ngram_table(&self, contexts: &[Vec<u8>]) -> NgramTable {
        let horizon = if self.config.hierarchical.enabled {
            self.config.hierarchical.phrase_max_ngram
        } else {
            8
        };
        let mut table = NgramTable::build(contexts, horizon);

        if self.config.safety.differential_privacy {
            let privacy = DifferentialPrivacy::new(
                self.config.safety.dp_epsilon,
                self.config.safety.dp_delta,
                self.config.safety.dp_mechanism,
            );
            let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(2));
            table.apply_noise(&privacy, &mut rng);
            info!(
                "applied differential privacy (epsilon {}) to {} n-gram counts",
                self.config.safety.dp_epsilon,
                table.len()
            );
        }
        table
    }

    /// Evolve the vocabulary against the corpus, then refine token
    /// boundaries with the variational optimizer.
    pub fn evolve(&mut self, corpus: &dyn CorpusSource) -> Result<Individual> {
        if self.config.mode == Mode::Production {
            return Err(EvotokError::Configuration(
                "Production mode serves frozen vocabularies and cannot evolve".to_string(),
            ));
        }
        if self.frozen {
            return Err(EvotokError::Configuration(
                "Loaded vocabulary is frozen; fork it before evolving".to_string(),
            ));
        }

        let contexts = corpus.contexts();
        if contexts.is_empty() {
            return Err(EvotokError::Evolution(
                "cannot evolve against an empty corpus".to_string(),
            ));
        }

        info!(
            "starting evolution: {} contexts, {} bytes, hierarchical={}",
            contexts.len(),
            corpus.total_bytes(),
            self.config.hierarchical.enabled
        );

        let exploit_penalty = self.safety.exploit_penalty();
        let best = if self.config.hierarchical.enabled {
            let privacy = self.config.safety.differential_privacy.then(|| {
                DifferentialPrivacy::new(
                    self.config.safety.dp_epsilon,
                    self.config.safety.dp_delta,
                    self.config.safety.dp_mechanism,
                )
            });
            let mut optimizer = HierarchicalOptimizer::new(
                self.config.ga.clone(),
                self.config.hierarchical.clone(),
                self.config.fitness.clone(),
                exploit_penalty,
                self.config.seed,
            )
            .with_privacy(privacy);
            let best = optimizer.run(contexts)?;
            self.history = optimizer.history().to_vec();
            best
        } else {
            let evaluator = FitnessEvaluator::new(self.config.fitness.clone(), exploit_penalty);
            let mut optimizer =
                GaOptimizer::new(self.config.ga.clone(), evaluator, self.config.seed);
            optimizer.set_ngram_table(self.ngram_table(contexts));
            let best = optimizer.run(contexts)?;
            self.history = optimizer.history().to_vec();
            best
        };

        self.vocab = best.vocab.clone();
        self.refine_with_boundaries(contexts)?;

        info!(
            "evolution finished: fitness {:.4}, {} tokens, hash {}",
            best.overall_fitness,
            self.vocab.len(),
            &self.vocab.canonical_hash()[..12]
        );
        Ok(best)
    }

    /// Variational refinement pass: segment a slice of the corpus, solve
    /// boundary placement per segment cluster, and promote the resulting
    /// spans to vocabulary tokens.
    fn refine_with_boundaries(&mut self, contexts: &[Vec<u8>]) -> Result<()> {
        let limit = self.config.quantum.refine_context_limit.min(contexts.len());
        let segment_size = self.config.quantum.segment_size;
        let classical = ClassicalBoundaryOptimizer::default();
        let mut promoted = 0usize;

        for context in &contexts[..limit] {
            for segment in context.chunks(segment_size) {
                if segment.len() < 4 {
                    continue;
                }

                let key = SegmentStats::from_bytes(segment).cluster_key();
                let cached = if self.config.quantum.cache_solutions {
                    self.solution_cache.get(&key)
                } else {
                    None
                };
                let result = match cached {
                    Some(hit) => hit,
                    None => {
                        let result = self.backend.optimize_boundaries(segment)?;
                        let (classical_positions, _) = classical
                            .optimize_boundaries(segment, self.config.quantum.num_qubits);
                        debug!(
                            "segment {}: vqe found {} boundaries, classical baseline {}",
                            key,
                            result.boundaries.len(),
                            classical_positions.len()
                        );
                        if self.config.quantum.cache_solutions {
                            self.solution_cache.insert(key, result.clone());
                        }
                        result
                    }
                };

                let mut cuts = vec![0];
                cuts.extend(result.boundaries.iter().filter(|&&b| b < segment.len()));
                cuts.push(segment.len());
                for pair in cuts.windows(2) {
                    let span = &segment[pair[0]..pair[1]];
                    if span.len() >= 2
                        && span.len() <= MAX_TOKEN_LEN
                        && is_valid_token(span, self.config.ga.byte_validity_check)
                        && self.vocab.insert(span.to_vec())
                    {
                        promoted += 1;
                    }
                }
            }
        }

        info!(
            "boundary refinement: {} tokens promoted, {} cached solutions",
            promoted,
            self.solution_cache.len()
        );
        Ok(())
    }

    /// Encode with the token-budget guardrail: an input that tokenizes
    /// past the configured ratio falls back to plain byte ids, which the
    /// stable ranking maps to the byte values themselves.
    pub fn encode(&mut self, text: &[u8]) -> Vec<u32> {
        let encoder = self.manager.get_stable_encoder(&self.vocab);
        let tokens = encoder.encode(text);

        let budget = self.safety.check_token_budget(text.len(), tokens.len());
        if !budget.passed {
            warn!("token budget exceeded ({}), using byte fallback", budget.details);
            return text.iter().map(|&b| b as u32).collect();
        }
        tokens
    }

    pub fn decode(&mut self, ids: &[u32]) -> Vec<u8> {
        self.manager.get_stable_encoder(&self.vocab).decode(ids)
    }

    /// Persist the current vocabulary as a version bundle.
    pub fn save(&mut self, version: &str, freeze: bool) -> Result<VocabVersion> {
        let metrics = VocabMetrics {
            vocab_size: self.vocab.len(),
            compression_ratio: self.vocab.avg_token_length(),
            oov_rate: 0.0,
            avg_token_length: self.vocab.avg_token_length(),
            throughput_tokens_per_sec: None,
        };
        let record = self
            .manager
            .save(&self.vocab, version, &self.config, metrics, freeze)?;
        if freeze {
            self.frozen = true;
        }
        Ok(record)
    }

    /// Load a stored version. Loading a frozen version arms the freeze
    /// guard on this instance.
    pub fn load(&mut self, version: &str) -> Result<()> {
        self.vocab = self.manager.load(version)?;
        self.frozen = self
            .manager
            .version_info(version)
            .map(|v| v.is_frozen)
            .unwrap_or(false);
        info!(
            "loaded version {} ({} tokens, frozen: {})",
            version,
            self.vocab.len(),
            self.frozen
        );
        Ok(())
    }

    /// Fork a frozen version into a fresh mutable vocabulary.
    pub fn fork(&mut self, source_version: &str) -> Result<()> {
        self.vocab = self.manager.fork(source_version)?;
        self.frozen = false;
        Ok(())
    }

    pub fn freeze(&mut self, version: &str) -> Result<VocabVersion> {
        let record = self.manager.freeze(version)?;
        self.frozen = true;
        Ok(record)
    }

    pub fn list_versions(&self, frozen_only: bool) -> Vec<String> {
        self.manager.list_versions(frozen_only)
    }

    /// Run the adversarial battery against the current vocabulary.
    pub fn run_safety_suite(&mut self) -> SafetyReport {
        let encoder = self.manager.get_stable_encoder(&self.vocab);
        let report = self
            .safety
            .run_suite(|b| encoder.encode(b), |ids| encoder.decode(ids));
        info!(
            "safety suite: {}/{} passed, recommendation {:?}",
            report.passed, report.total, report.recommendation
        );
        report
    }

    /// Map current tokens onto a reference tokenizer's id space.
    pub fn compatibility_map(&self, reference: &dyn ReferenceTokenizer) -> HashMap<Vec<u8>, i64> {
        build_compatibility_map(&self.vocab, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GaConfig;
    use crate::corpus::InMemoryCorpus;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> EvotokConfig {
        EvotokConfig {
            output_dir: dir.path().to_string_lossy().into_owned(),
            ga: GaConfig {
                population_size: 6,
                generations: 3,
                elite_size: 2,
                init_tokens_min: 5,
                init_tokens_max: 15,
                ..GaConfig::default()
            },
            ..EvotokConfig::default()
        }
    }

    fn corpus() -> InMemoryCorpus {
        InMemoryCorpus::from_texts(&[
            "the quick brown fox jumps over the lazy dog",
            "the quick brown fox",
            "lazy dogs sleep",
        ])
    }

    #[test]
    fn evolve_then_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut tok = QuantumEvoTokenizer::new(test_config(&dir)).unwrap();
        tok.evolve(&corpus()).unwrap();

        let input = b"the quick brown fox";
        let ids = tok.encode(input);
        assert_eq!(tok.decode(&ids), input);
        assert!(!tok.evolution_history().is_empty());
    }

    #[test]
    fn production_mode_cannot_evolve() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.mode = Mode::Production;
        config.ga.generations = 0;
        let mut tok = QuantumEvoTokenizer::new(config).unwrap();
        assert!(tok.evolve(&corpus()).is_err());
    }

    #[test]
    fn frozen_vocabulary_cannot_evolve_until_forked() {
        let dir = TempDir::new().unwrap();
        let mut tok = QuantumEvoTokenizer::new(test_config(&dir)).unwrap();
        tok.save("v1", true).unwrap();
        assert!(tok.evolve(&corpus()).is_err());

        tok.fork("v1").unwrap();
        assert!(tok.evolve(&corpus()).is_ok());
    }

    #[test]
    fn byte_fallback_ids_are_byte_values() {
        let dir = TempDir::new().unwrap();
        let mut tok = QuantumEvoTokenizer::new(test_config(&dir)).unwrap();
        let ids = tok.encode(b"abc");
        assert_eq!(ids, vec![b'a' as u32, b'b' as u32, b'c' as u32]);
    }
}
