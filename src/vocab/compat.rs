//! Best-effort mapping into an external reference tokenizer's id space.
//!
//! Interop only: the mapping never influences training. Tokens that the
//! reference encodes to a single id map one-to-one; multi-id tokens map to
//! their first id; unrepresentable tokens map to -1.

use super::vocabulary::Vocabulary;
use std::collections::HashMap;

/// External tokenizer consulted by the compatibility-map builder.
pub trait ReferenceTokenizer {
    fn name(&self) -> &str;
    fn encode(&self, text: &str) -> Vec<u32>;
}

pub fn build_compatibility_map(
    vocab: &Vocabulary,
    reference: &dyn ReferenceTokenizer,
) -> HashMap<Vec<u8>, i64> {
    let mut mapping = HashMap::with_capacity(vocab.len());

    for token in vocab.iter() {
        let text = String::from_utf8_lossy(token);
        let ids = reference.encode(&text);
        let mapped = ids.first().map(|&id| id as i64).unwrap_or(-1);
        mapping.insert(token.clone(), mapped);
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ByteReference;

    impl ReferenceTokenizer for ByteReference {
        fn name(&self) -> &str {
            "byte-reference"
        }

        fn encode(&self, text: &str) -> Vec<u32> {
            text.bytes().map(|b| b as u32).collect()
        }
    }

    #[test]
    fn single_byte_tokens_map_one_to_one() {
        let vocab = Vocabulary::base();
        let map = build_compatibility_map(&vocab, &ByteReference);
        assert_eq!(map.len(), 256);
        assert_eq!(map[&b"a".to_vec()], b'a' as i64);
    }

    #[test]
    fn multi_byte_tokens_map_to_first_id() {
        let vocab = Vocabulary::from_tokens(vec![b"ab".to_vec()]);
        let map = build_compatibility_map(&vocab, &ByteReference);
        assert_eq!(map[&b"ab".to_vec()], b'a' as i64);
    }
}
