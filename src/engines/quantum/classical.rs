//! Classical baseline for boundary placement, used to sanity-check the
//! variational optimizer's output.

use crate::engines::quantum::stats::shannon_entropy;

pub struct ClassicalBoundaryOptimizer {
    pub window: usize,
}

impl Default for ClassicalBoundaryOptimizer {
    fn default() -> Self {
        Self { window: 4 }
    }
}

impl ClassicalBoundaryOptimizer {
    /// Pick the `max_boundaries` positions with the highest windowed
    /// entropy. Ties resolve to the earlier position. Returns the sorted
    /// positions and the summed entropy score.
    pub fn optimize_boundaries(&self, segment: &[u8], max_boundaries: usize) -> (Vec<usize>, f64) {
        if segment.len() < 2 || max_boundaries == 0 {
            return (Vec::new(), 0.0);
        }

        let mut scored: Vec<(usize, f64)> = (1..segment.len())
            .map(|pos| {
                let start = pos.saturating_sub(self.window / 2);
                let end = (pos + self.window / 2).min(segment.len());
                (pos, shannon_entropy(&segment[start..end]))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(max_boundaries);

        let score: f64 = scored.iter().map(|(_, s)| s).sum();
        let mut positions: Vec<usize> = scored.into_iter().map(|(p, _)| p).collect();
        positions.sort_unstable();
        (positions, score)
    }
}
