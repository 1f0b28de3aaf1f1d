//! Multi-component fitness for candidate vocabularies.
//!
//! Evaluation is pure: the evaluator holds no RNG and no mutable state,
//! so a population can be scored in parallel.

use crate::config::FitnessConfig;
use crate::engines::generation::individual::{components, Individual};
use crate::engines::safety::ExploitPenalty;
use crate::vocab::{Vocabulary, MAX_TOKEN_LEN};
use std::collections::{HashMap, HashSet};

pub struct FitnessEvaluator {
    config: FitnessConfig,
    exploit_penalty: Option<ExploitPenalty>,
}

impl FitnessEvaluator {
    pub fn new(config: FitnessConfig, exploit_penalty: Option<ExploitPenalty>) -> Self {
        Self {
            config,
            exploit_penalty,
        }
    }

    /// Greedy longest-match segmentation against the vocabulary set.
    /// Single-byte fallback means this never fails.
    fn tokenize<'a>(&self, vocab: &Vocabulary, text: &'a [u8]) -> Vec<&'a [u8]> {
        let mut tokens = Vec::new();
        let mut i = 0;
        let max_len = vocab.longest_token_len().min(MAX_TOKEN_LEN);

        while i < text.len() {
            let limit = max_len.min(text.len() - i);
            let mut matched = 1;
            for len in (2..=limit).rev() {
                if vocab.contains(&text[i..i + len]) {
                    matched = len;
                    break;
                }
            }
            tokens.push(&text[i..i + matched]);
            i += matched;
        }
        tokens
    }

    /// Score every component, write the results into the individual, and
    /// fold them into a single scalar for tournament selection.
    pub fn evaluate(&self, individual: &mut Individual, contexts: &[Vec<u8>]) {
        let vocab = &individual.vocab;

        let mut total_bytes = 0usize;
        let mut total_tokens = 0usize;
        let mut used_tokens: HashSet<&[u8]> = HashSet::new();
        let mut token_contexts: HashMap<&[u8], HashSet<usize>> = HashMap::new();
        let mut token_occurrences: HashMap<&[u8], u64> = HashMap::new();

        for (ctx_idx, context) in contexts.iter().enumerate() {
            total_bytes += context.len();
            for token in self.tokenize(vocab, context) {
                total_tokens += 1;
                used_tokens.insert(token);
                if token.len() > 1 {
                    token_contexts.entry(token).or_default().insert(ctx_idx);
                    *token_occurrences.entry(token).or_insert(0) += 1;
                }
            }
        }

        let compression = if total_tokens > 0 {
            total_bytes as f64 / total_tokens as f64
        } else {
            1.0
        };

        // Every vocabulary entry counts here, the byte baseline included.
        let sparsity = used_tokens.len() as f64 / vocab.len() as f64;

        // Byte fallback makes every input representable.
        let oov_coverage = 1.0;

        let covered = token_contexts
            .iter()
            .filter(|(t, ctxs)| {
                let occurrences = token_occurrences.get(*t).copied().unwrap_or(0);
                ctxs.len() >= self.config.min_context_coverage
                    && occurrences >= self.config.min_occurrence_count as u64
            })
            .count();
        let context_coverage = if token_contexts.is_empty() {
            0.0
        } else {
            covered as f64 / token_contexts.len() as f64
        };

        // Stand-in for model perplexity; lower is better.
        let perplexity_proxy = 1.0 / compression.max(f64::MIN_POSITIVE);

        let mut overall = self.config.compression_weight * compression
            + self.config.sparsity_weight * sparsity
            + self.config.oov_weight * oov_coverage
            + self.config.context_coverage_weight * context_coverage
            + self.config.perplexity_weight * (1.0 / perplexity_proxy.max(0.1));

        if let Some(penalty) = &self.exploit_penalty {
            overall -= penalty.penalty(vocab);
        }

        individual
            .fitness_scores
            .insert(components::COMPRESSION.to_string(), compression);
        individual
            .fitness_scores
            .insert(components::SPARSITY.to_string(), sparsity);
        individual
            .fitness_scores
            .insert(components::OOV_COVERAGE.to_string(), oov_coverage);
        individual
            .fitness_scores
            .insert(components::CONTEXT_COVERAGE.to_string(), context_coverage);
        individual
            .fitness_scores
            .insert(components::PERPLEXITY_PROXY.to_string(), perplexity_proxy);
        individual.overall_fitness = overall;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts() -> Vec<Vec<u8>> {
        vec![
            b"the cat sat on the mat".to_vec(),
            b"the dog sat on the log".to_vec(),
        ]
    }

    #[test]
    fn useful_tokens_raise_compression() {
        let evaluator = FitnessEvaluator::new(FitnessConfig::default(), None);
        let contexts = contexts();

        let mut base = Individual::new(Vocabulary::base(), 0);
        evaluator.evaluate(&mut base, &contexts);

        let mut enriched = Individual::new(
            Vocabulary::from_tokens(vec![b"the ".to_vec(), b"sat on ".to_vec()]),
            0,
        );
        evaluator.evaluate(&mut enriched, &contexts);

        assert!(
            enriched.score(components::COMPRESSION) > base.score(components::COMPRESSION)
        );
        assert!(enriched.overall_fitness > base.overall_fitness);
    }

    #[test]
    fn byte_fallback_keeps_coverage_total() {
        let evaluator = FitnessEvaluator::new(FitnessConfig::default(), None);
        let mut ind = Individual::new(Vocabulary::base(), 0);
        evaluator.evaluate(&mut ind, &contexts());
        assert_eq!(ind.score(components::OOV_COVERAGE), 1.0);
    }

    #[test]
    fn unused_tokens_lower_sparsity() {
        let evaluator = FitnessEvaluator::new(FitnessConfig::default(), None);
        let contexts = contexts();

        let mut dead_weight = Individual::new(
            Vocabulary::from_tokens(vec![
                b"the ".to_vec(),
                b"zzzz".to_vec(),
                b"qqqq".to_vec(),
                b"xxxx".to_vec(),
            ]),
            0,
        );
        evaluator.evaluate(&mut dead_weight, &contexts);

        let mut lean = Individual::new(Vocabulary::from_tokens(vec![b"the ".to_vec()]), 0);
        evaluator.evaluate(&mut lean, &contexts);

        assert!(lean.score(components::SPARSITY) > dead_weight.score(components::SPARSITY));
    }

    #[test]
    fn base_vocabulary_still_earns_sparsity_credit() {
        let evaluator = FitnessEvaluator::new(FitnessConfig::default(), None);
        let mut ind = Individual::new(Vocabulary::base(), 0);
        evaluator.evaluate(&mut ind, &[b"abcabc".to_vec()]);

        // Three distinct bytes out of the 256-entry baseline.
        let sparsity = ind.score(components::SPARSITY);
        assert!(sparsity > 0.0);
        assert!((sparsity - 3.0 / 256.0).abs() < 1e-12);
    }

    #[test]
    fn rare_tokens_fall_below_the_occurrence_floor() {
        let contexts = contexts();
        let vocab = Vocabulary::from_tokens(vec![b"the ".to_vec(), b"cat".to_vec()]);

        // "the " repeats across both contexts; "cat" appears exactly once.
        let strict = FitnessEvaluator::new(
            FitnessConfig {
                min_occurrence_count: 2,
                ..FitnessConfig::default()
            },
            None,
        );
        let mut ind = Individual::new(vocab.clone(), 0);
        strict.evaluate(&mut ind, &contexts);
        assert!((ind.score(components::CONTEXT_COVERAGE) - 0.5).abs() < 1e-12);

        let lenient = FitnessEvaluator::new(
            FitnessConfig {
                min_occurrence_count: 1,
                ..FitnessConfig::default()
            },
            None,
        );
        let mut ind = Individual::new(vocab, 0);
        lenient.evaluate(&mut ind, &contexts);
        assert!((ind.score(components::CONTEXT_COVERAGE) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn exploit_tokens_cost_fitness() {
        let contexts = contexts();
        let penalized = FitnessEvaluator::new(
            FitnessConfig::default(),
            Some(ExploitPenalty { weight: 1.0 }),
        );
        let plain = FitnessEvaluator::new(FitnessConfig::default(), None);

        let vocab = Vocabulary::from_tokens(vec![b"<|endoftext|>".to_vec()]);
        let mut a = Individual::new(vocab.clone(), 0);
        let mut b = Individual::new(vocab, 0);
        penalized.evaluate(&mut a, &contexts);
        plain.evaluate(&mut b, &contexts);

        assert!(a.overall_fitness < b.overall_fitness);
    }
}
