//! Corpus n-gram frequency table used for guided mutation.
//!
//! Entries are kept in a deterministic order (count descending, bytes
//! ascending) so that weighted draws depend only on the RNG stream.

use crate::engines::safety::privacy::DifferentialPrivacy;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct NgramTable {
    entries: Vec<(Vec<u8>, u64)>,
    context_count: usize,
}

impl NgramTable {
    /// Count every n-gram up to `max_n` bytes across the contexts.
    pub fn build(contexts: &[Vec<u8>], max_n: usize) -> Self {
        let mut counts: HashMap<Vec<u8>, u64> = HashMap::new();

        for context in contexts {
            let horizon = max_n.min(context.len());
            for n in 1..=horizon {
                for window in context.windows(n) {
                    *counts.entry(window.to_vec()).or_insert(0) += 1;
                }
            }
        }

        let mut entries: Vec<(Vec<u8>, u64)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            entries,
            context_count: contexts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn context_count(&self) -> usize {
        self.context_count
    }

    /// Frequency-weighted draw; favors common substrings.
    pub fn sample_weighted(&self, rng: &mut StdRng) -> Option<&[u8]> {
        if self.entries.is_empty() {
            return None;
        }
        let dist = WeightedIndex::new(self.entries.iter().map(|(_, c)| *c)).ok()?;
        let idx = dist.sample(rng);
        Some(&self.entries[idx].0)
    }

    /// Add calibrated noise to the counts before they influence mutation,
    /// so a single document's rare substrings cannot be memorized verbatim.
    /// Entries whose noisy count drops to zero are removed.
    pub fn apply_noise(&mut self, privacy: &DifferentialPrivacy, rng: &mut StdRng) {
        let mut noisy: Vec<(Vec<u8>, u64)> = self
            .entries
            .drain(..)
            .filter_map(|(ngram, count)| {
                let noisy_count = privacy.noise(count as f64, 1.0, rng);
                if noisy_count >= 0.5 {
                    Some((ngram, noisy_count.round() as u64))
                } else {
                    None
                }
            })
            .collect();

        noisy.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        self.entries = noisy;
    }
}
