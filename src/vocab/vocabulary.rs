//! Byte-string vocabulary with the 256 single-byte baseline.
//!
//! Every vocabulary produced by the engine contains all 256 single-byte
//! tokens, so any byte sequence is encodable. Ordered storage keeps
//! iteration deterministic, which the evolution determinism contract
//! depends on.

use std::collections::BTreeSet;

/// Maximum token length in bytes.
pub const MAX_TOKEN_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: BTreeSet<Vec<u8>>,
}

impl Vocabulary {
    /// The 256 single-byte tokens, the floor of every vocabulary.
    pub fn base() -> Self {
        let tokens = (0u16..256).map(|b| vec![b as u8]).collect();
        Self { tokens }
    }

    /// Build from arbitrary tokens, always re-adding the byte baseline.
    pub fn from_tokens<I: IntoIterator<Item = Vec<u8>>>(tokens: I) -> Self {
        let mut vocab = Self::base();
        for token in tokens {
            if !token.is_empty() && token.len() <= MAX_TOKEN_LEN {
                vocab.tokens.insert(token);
            }
        }
        vocab
    }

    pub fn insert(&mut self, token: Vec<u8>) -> bool {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return false;
        }
        self.tokens.insert(token)
    }

    /// Remove a token. Single-byte tokens are never removed.
    pub fn remove(&mut self, token: &[u8]) -> bool {
        if token.len() <= 1 {
            return false;
        }
        self.tokens.remove(token)
    }

    pub fn contains(&self, token: &[u8]) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.tokens.iter()
    }

    /// Multi-byte tokens in sorted order (mutation candidates for removal).
    pub fn multi_byte_tokens(&self) -> Vec<&Vec<u8>> {
        self.tokens.iter().filter(|t| t.len() > 1).collect()
    }

    pub fn longest_token_len(&self) -> usize {
        self.tokens.iter().map(|t| t.len()).max().unwrap_or(0)
    }

    /// Order-independent hash over the sorted token set.
    ///
    /// Each token is length-prefixed so that e.g. {"ab"} and {"a","b"}
    /// cannot collide on concatenation.
    pub fn canonical_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for token in &self.tokens {
            hasher.update(&(token.len() as u32).to_le_bytes());
            hasher.update(token);
        }
        hasher.finalize().to_hex().to_string()
    }

    pub fn avg_token_length(&self) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        let total: usize = self.tokens.iter().map(|t| t.len()).sum();
        total as f64 / self.tokens.len() as f64
    }
}

/// Length and optional UTF-8 validity check applied to mutation candidates.
pub fn is_valid_token(token: &[u8], utf8_check: bool) -> bool {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return false;
    }
    if utf8_check && std::str::from_utf8(token).is_err() {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_has_256_single_bytes() {
        let vocab = Vocabulary::base();
        assert_eq!(vocab.len(), 256);
        for b in 0u16..256 {
            assert!(vocab.contains(&[b as u8]));
        }
    }

    #[test]
    fn single_bytes_cannot_be_removed() {
        let mut vocab = Vocabulary::base();
        assert!(!vocab.remove(b"a"));
        assert_eq!(vocab.len(), 256);
    }

    #[test]
    fn from_tokens_keeps_baseline() {
        let vocab = Vocabulary::from_tokens(vec![b"hello".to_vec()]);
        assert_eq!(vocab.len(), 257);
        assert!(vocab.contains(b"hello"));
        assert!(vocab.contains(b"\x00"));
    }

    #[test]
    fn oversized_tokens_are_rejected() {
        let mut vocab = Vocabulary::base();
        assert!(!vocab.insert(vec![b'x'; MAX_TOKEN_LEN + 1]));
        assert!(vocab.insert(vec![b'x'; MAX_TOKEN_LEN]));
    }

    #[test]
    fn canonical_hash_is_order_independent() {
        let a = Vocabulary::from_tokens(vec![b"ab".to_vec(), b"cd".to_vec()]);
        let b = Vocabulary::from_tokens(vec![b"cd".to_vec(), b"ab".to_vec()]);
        assert_eq!(a.canonical_hash(), b.canonical_hash());

        let c = Vocabulary::from_tokens(vec![b"ab".to_vec()]);
        assert_ne!(a.canonical_hash(), c.canonical_hash());
    }

    #[test]
    fn validity_check_rejects_invalid_utf8() {
        assert!(is_valid_token(b"hello", true));
        assert!(!is_valid_token(&[0xff, 0xfe], true));
        assert!(is_valid_token(&[0xff, 0xfe], false));
        assert!(!is_valid_token(b"", true));
    }
}
