//! Stable greedy longest-match encoder derived from a vocabulary.
//!
//! Ranks are assigned by (length, lexicographic) sort, so the id space is a
//! pure function of the token set. The encoder is built once per canonical
//! hash and reused across encode calls.

use super::vocabulary::{Vocabulary, MAX_TOKEN_LEN};
use std::collections::HashMap;

pub struct StableEncoder {
    ranks: HashMap<Vec<u8>, u32>,
    tokens: Vec<Vec<u8>>,
    max_token_len: usize,
}

impl StableEncoder {
    pub fn new(vocab: &Vocabulary) -> Self {
        let mut sorted: Vec<Vec<u8>> = vocab.iter().cloned().collect();
        sorted.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let ranks = sorted
            .iter()
            .enumerate()
            .map(|(rank, token)| (token.clone(), rank as u32))
            .collect();

        let max_token_len = vocab.longest_token_len().min(MAX_TOKEN_LEN);

        Self {
            ranks,
            tokens: sorted,
            max_token_len,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.tokens.len()
    }

    pub fn rank_of(&self, token: &[u8]) -> Option<u32> {
        self.ranks.get(token).copied()
    }

    /// Greedy longest-match encoding. Single-byte tokens guarantee progress.
    pub fn encode(&self, text: &[u8]) -> Vec<u32> {
        let mut ids = Vec::new();
        let mut i = 0;

        while i < text.len() {
            let limit = self.max_token_len.min(text.len() - i);
            let mut matched = 1;
            // The byte baseline occupies ranks 0..256 in rank order, so a
            // single byte's rank is the byte value itself.
            let mut rank = self
                .ranks
                .get(&text[i..i + 1])
                .copied()
                .unwrap_or(text[i] as u32);

            for len in (2..=limit).rev() {
                if let Some(&r) = self.ranks.get(&text[i..i + len]) {
                    matched = len;
                    rank = r;
                    break;
                }
            }

            ids.push(rank);
            i += matched;
        }

        ids
    }

    /// Decode ids back to bytes. Ids below 256 with no rank entry decode as
    /// raw bytes (the byte-level fallback path); other unknown ids are
    /// dropped, which is only reachable for invalid input.
    pub fn decode(&self, ids: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        for &id in ids {
            if let Some(token) = self.tokens.get(id as usize) {
                out.extend_from_slice(token);
            } else if id < 256 {
                out.push(id as u8);
            }
        }
        out
    }
}
