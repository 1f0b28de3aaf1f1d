//! Differential-privacy noise for frequency statistics.

use crate::config::DpMechanism;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

/// Noise calibrated by a privacy budget (epsilon, delta).
#[derive(Debug, Clone)]
pub struct DifferentialPrivacy {
    pub epsilon: f64,
    pub delta: f64,
    pub mechanism: DpMechanism,
}

impl DifferentialPrivacy {
    pub fn new(epsilon: f64, delta: f64, mechanism: DpMechanism) -> Self {
        Self {
            epsilon,
            delta,
            mechanism,
        }
    }

    /// Noise drawn from the configured mechanism.
    pub fn noise(&self, value: f64, sensitivity: f64, rng: &mut StdRng) -> f64 {
        match self.mechanism {
            DpMechanism::Laplace => self.laplace_noise(value, sensitivity, rng),
            DpMechanism::Gaussian => self.gaussian_noise(value, sensitivity, rng),
        }
    }

    /// Laplace mechanism for epsilon-DP, via the inverse-CDF transform.
    pub fn laplace_noise(&self, value: f64, sensitivity: f64, rng: &mut StdRng) -> f64 {
        let scale = sensitivity / self.epsilon;
        let u: f64 = rng.gen::<f64>() - 0.5;
        let noise = -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln();
        value + noise
    }

    /// Gaussian mechanism for (epsilon, delta)-DP, via Box-Muller.
    pub fn gaussian_noise(&self, value: f64, sensitivity: f64, rng: &mut StdRng) -> f64 {
        let sigma = sensitivity * (2.0 * (1.25 / self.delta).ln()).sqrt() / self.epsilon;
        let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = rng.gen();
        let standard = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        value + sigma * standard
    }

    /// Noisy copy of a histogram, clamped at zero.
    pub fn privatize_histogram(
        &self,
        histogram: &HashMap<Vec<u8>, u64>,
        rng: &mut StdRng,
    ) -> HashMap<Vec<u8>, u64> {
        let mut keys: Vec<&Vec<u8>> = histogram.keys().collect();
        keys.sort();

        let mut private = HashMap::with_capacity(histogram.len());
        for key in keys {
            let noisy = self.noise(histogram[key] as f64, 1.0, rng);
            private.insert(key.clone(), noisy.max(0.0).round() as u64);
        }
        private
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn noise_is_deterministic_per_seed() {
        let dp = DifferentialPrivacy::new(1.0, 1e-5, DpMechanism::Laplace);
        let mut rng1 = StdRng::seed_from_u64(3);
        let mut rng2 = StdRng::seed_from_u64(3);
        assert_eq!(
            dp.laplace_noise(10.0, 1.0, &mut rng1),
            dp.laplace_noise(10.0, 1.0, &mut rng2)
        );
    }

    #[test]
    fn mechanism_selects_the_noise_distribution() {
        let laplace = DifferentialPrivacy::new(1.0, 1e-5, DpMechanism::Laplace);
        let gaussian = DifferentialPrivacy::new(1.0, 1e-5, DpMechanism::Gaussian);

        let mut rng = StdRng::seed_from_u64(17);
        assert_eq!(
            laplace.noise(10.0, 1.0, &mut StdRng::seed_from_u64(17)),
            laplace.laplace_noise(10.0, 1.0, &mut rng)
        );
        let mut rng = StdRng::seed_from_u64(17);
        assert_eq!(
            gaussian.noise(10.0, 1.0, &mut StdRng::seed_from_u64(17)),
            gaussian.gaussian_noise(10.0, 1.0, &mut rng)
        );
    }

    #[test]
    fn gaussian_sigma_shrinks_with_epsilon() {
        let tight = DifferentialPrivacy::new(10.0, 1e-5, DpMechanism::Gaussian);
        let loose = DifferentialPrivacy::new(0.1, 1e-5, DpMechanism::Gaussian);
        let mut rng = StdRng::seed_from_u64(23);

        let spread = |dp: &DifferentialPrivacy, rng: &mut StdRng| -> f64 {
            (0..200)
                .map(|_| (dp.gaussian_noise(0.0, 1.0, rng)).abs())
                .sum::<f64>()
                / 200.0
        };

        assert!(spread(&loose, &mut rng) > spread(&tight, &mut rng));
    }

    #[test]
    fn smaller_epsilon_means_larger_spread() {
        let tight = DifferentialPrivacy::new(10.0, 1e-5, DpMechanism::Laplace);
        let loose = DifferentialPrivacy::new(0.1, 1e-5, DpMechanism::Laplace);
        let mut rng = StdRng::seed_from_u64(11);

        let spread = |dp: &DifferentialPrivacy, rng: &mut StdRng| -> f64 {
            (0..200)
                .map(|_| (dp.laplace_noise(0.0, 1.0, rng)).abs())
                .sum::<f64>()
                / 200.0
        };

        assert!(spread(&loose, &mut rng) > spread(&tight, &mut rng));
    }

    #[test]
    fn privatized_histogram_never_negative() {
        let dp = DifferentialPrivacy::new(0.5, 1e-5, DpMechanism::Gaussian);
        let mut rng = StdRng::seed_from_u64(5);
        let mut hist = HashMap::new();
        hist.insert(b"a".to_vec(), 1u64);
        hist.insert(b"b".to_vec(), 2u64);

        let private = dp.privatize_histogram(&hist, &mut rng);
        assert_eq!(private.len(), 2);
    }
}
