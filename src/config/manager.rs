use super::{
    evolution::{GaConfig, HierarchicalConfig},
    fitness::FitnessConfig,
    quantum::QuantumConfig,
    safety::SafetyConfig,
    traits::{ConfigSection, Mode},
};
use crate::error::{EvotokError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Full training configuration, persisted verbatim into each version bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvotokConfig {
    pub mode: Mode,
    pub seed: u64,
    pub output_dir: String,
    pub ga: GaConfig,
    pub hierarchical: HierarchicalConfig,
    pub fitness: FitnessConfig,
    pub quantum: QuantumConfig,
    pub safety: SafetyConfig,
}

impl Default for EvotokConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Research,
            seed: 42,
            output_dir: "artifacts/evotok".to_string(),
            ga: GaConfig::default(),
            hierarchical: HierarchicalConfig::default(),
            fitness: FitnessConfig::default(),
            quantum: QuantumConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

impl EvotokConfig {
    /// Validate all sections plus cross-section constraints.
    ///
    /// Fails before any corpus is touched: production mode may only serve
    /// frozen vocabularies, so asking it to evolve is rejected here.
    pub fn validate(&self) -> Result<()> {
        self.ga.validate()?;
        self.hierarchical.validate()?;
        self.fitness.validate()?;
        self.quantum.validate()?;
        self.safety.validate()?;

        if self.mode == Mode::Production && self.ga.generations > 0 {
            return Err(EvotokError::Configuration(
                "Production mode cannot request evolution generations > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Deterministic hash of the configuration, recorded per version.
    pub fn config_hash(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(blake3::hash(&canonical).to_hex().to_string())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<EvotokConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(EvotokConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EvotokError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: EvotokConfig = toml::from_str(&contents)
            .map_err(|e| EvotokError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.config.write().unwrap() = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config = self.config.read().unwrap();
        let toml_str = toml::to_string_pretty(&*config)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> EvotokConfig {
        self.config.read().unwrap().clone()
    }

    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut EvotokConfig),
    {
        let mut config = self.config.write().unwrap();
        f(&mut config);
        config.validate()?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EvotokConfig::default().validate().is_ok());
    }

    #[test]
    fn production_mode_rejects_evolution() {
        let mut config = EvotokConfig::default();
        config.mode = Mode::Production;
        assert!(config.ga.generations > 0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EvotokError::Configuration(_)));
    }

    #[test]
    fn config_hash_is_stable() {
        let config = EvotokConfig::default();
        assert_eq!(
            config.config_hash().unwrap(),
            config.config_hash().unwrap()
        );
    }
}
