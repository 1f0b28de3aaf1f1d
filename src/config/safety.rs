use super::traits::ConfigSection;
use crate::error::{EvotokError, Result};
use serde::{Deserialize, Serialize};

/// Noise distribution used when differential privacy is enabled. Laplace
/// gives pure epsilon-DP; Gaussian gives (epsilon, delta)-DP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DpMechanism {
    Laplace,
    Gaussian,
}

impl Default for DpMechanism {
    fn default() -> Self {
        DpMechanism::Laplace
    }
}

/// Guardrails and privacy knobs applied during evolution and encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Encode output beyond `len * ratio` tokens triggers the byte fallback.
    pub max_tokens_per_byte_ratio: f64,
    /// Subtract a fitness penalty for exploit strings present as tokens.
    pub exploit_penalty_enabled: bool,
    pub injection_penalty_weight: f64,
    /// Add calibrated noise to n-gram counts before guided mutation.
    pub differential_privacy: bool,
    pub dp_epsilon: f64,
    pub dp_delta: f64,
    #[serde(default)]
    pub dp_mechanism: DpMechanism,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_byte_ratio: 2.0,
            exploit_penalty_enabled: true,
            injection_penalty_weight: 0.5,
            differential_privacy: false,
            dp_epsilon: 1.0,
            dp_delta: 1e-5,
            dp_mechanism: DpMechanism::default(),
        }
    }
}

impl ConfigSection for SafetyConfig {
    fn section_name() -> &'static str {
        "safety"
    }

    fn validate(&self) -> Result<()> {
        if self.max_tokens_per_byte_ratio <= 0.0 {
            return Err(EvotokError::Configuration(
                "max_tokens_per_byte_ratio must be positive".to_string(),
            ));
        }
        if self.differential_privacy && self.dp_epsilon <= 0.0 {
            return Err(EvotokError::Configuration(
                "Differential privacy requires a positive epsilon".to_string(),
            ));
        }
        if self.differential_privacy && !(0.0..1.0).contains(&self.dp_delta) {
            return Err(EvotokError::Configuration(
                "dp_delta must be in [0, 1)".to_string(),
            ));
        }
        if self.differential_privacy
            && self.dp_mechanism == DpMechanism::Gaussian
            && self.dp_delta <= 0.0
        {
            return Err(EvotokError::Configuration(
                "The Gaussian mechanism requires a positive dp_delta".to_string(),
            ));
        }
        Ok(())
    }
}
