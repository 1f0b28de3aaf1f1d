//! Per-segment statistics used to cluster similar segments so their
//! boundary solutions can be shared through the cache.

/// Summary of one byte segment.
#[derive(Debug, Clone)]
pub struct SegmentStats {
    pub length: usize,
    pub entropy: f64,
    pub distribution_hash: String,
}

impl SegmentStats {
    pub fn from_bytes(segment: &[u8]) -> Self {
        Self {
            length: segment.len(),
            entropy: shannon_entropy(segment),
            distribution_hash: distribution_hash(segment),
        }
    }

    /// Bucketed key: length rounded down to 32, entropy rounded to the
    /// nearest half bit, plus a distribution fingerprint. Segments sharing
    /// a key get the same cached boundary solution.
    pub fn cluster_key(&self) -> String {
        let length_bucket = (self.length / 32) * 32;
        let entropy_bucket = (self.entropy * 2.0).round() / 2.0;
        format!(
            "L{}_E{:.1}_{}",
            length_bucket, entropy_bucket, self.distribution_hash
        )
    }
}

/// Shannon entropy in bits over the byte distribution.
pub fn shannon_entropy(segment: &[u8]) -> f64 {
    if segment.is_empty() {
        return 0.0;
    }
    let mut counts = [0u64; 256];
    for &b in segment {
        counts[b as usize] += 1;
    }
    let total = segment.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Fingerprint of the byte frequency shape: the top 20 counts in
/// descending order, hashed and truncated to 8 hex characters.
fn distribution_hash(segment: &[u8]) -> String {
    let mut counts = [0u64; 256];
    for &b in segment {
        counts[b as usize] += 1;
    }
    let mut sorted: Vec<u64> = counts.iter().copied().filter(|&c| c > 0).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.truncate(20);

    let mut hasher = blake3::Hasher::new();
    for count in &sorted {
        hasher.update(&count.to_le_bytes());
    }
    hasher.finalize().to_hex()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_uniform_and_constant() {
        assert_eq!(shannon_entropy(&[]), 0.0);
        assert_eq!(shannon_entropy(&[7u8; 64]), 0.0);

        let uniform: Vec<u8> = (0..=255u8).collect();
        assert!((shannon_entropy(&uniform) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn similar_segments_share_a_cluster_key() {
        let a = SegmentStats::from_bytes(b"aaaabbbbccccdddd");
        let b = SegmentStats::from_bytes(b"bbbbccccddddeeee");
        // Same length bucket, same entropy, same count shape.
        assert_eq!(a.cluster_key(), b.cluster_key());
    }

    #[test]
    fn different_distributions_get_different_keys() {
        let a = SegmentStats::from_bytes(&[0u8; 32]);
        let uniform: Vec<u8> = (0..32u8).collect();
        let b = SegmentStats::from_bytes(&uniform);
        assert_ne!(a.cluster_key(), b.cluster_key());
    }
}
