//! Versioned vocabulary storage.
//!
//! Each saved version is a directory bundle (vocab.json, config.json,
//! metrics.json, hash.txt) under the output root, with a single
//! version_registry.json mapping labels to version records. The registry is
//! owned by the manager instance and persisted on save/freeze; there is no
//! ambient state.

use super::encoder::StableEncoder;
use super::vocabulary::Vocabulary;
use crate::config::EvotokConfig;
use crate::error::{EvotokError, Result};
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabMetrics {
    pub vocab_size: usize,
    pub compression_ratio: f64,
    pub oov_rate: f64,
    pub avg_token_length: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput_tokens_per_sec: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabVersion {
    pub version: String,
    pub created_at: String,
    pub hash: String,
    pub metrics: VocabMetrics,
    pub config_hash: String,
    pub is_frozen: bool,
}

/// Invoked with the path to vocab.json after a successful save.
/// Failures are logged and never propagate into the save result.
pub type NotarizationHook = Box<dyn Fn(&Path) -> std::io::Result<()> + Send + Sync>;

#[derive(Serialize, Deserialize)]
struct VocabFile {
    vocab: Vec<String>,
    size: usize,
}

pub struct VocabManager {
    output_dir: PathBuf,
    versions: HashMap<String, VocabVersion>,
    cached_encoder: Option<(String, Arc<StableEncoder>)>,
    notarization_hook: Option<NotarizationHook>,
}

impl VocabManager {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;

        let mut manager = Self {
            output_dir,
            versions: HashMap::new(),
            cached_encoder: None,
            notarization_hook: None,
        };
        manager.load_registry()?;
        Ok(manager)
    }

    pub fn with_notarization_hook(mut self, hook: NotarizationHook) -> Self {
        self.notarization_hook = Some(hook);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn registry_path(&self) -> PathBuf {
        self.output_dir.join("version_registry.json")
    }

    fn load_registry(&mut self) -> Result<()> {
        let path = self.registry_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            self.versions = serde_json::from_str(&contents)?;
        }
        Ok(())
    }

    fn save_registry(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.versions)?;
        std::fs::write(self.registry_path(), contents)?;
        Ok(())
    }

    /// Cached encoder, rebuilt only when the canonical hash changes.
    pub fn get_stable_encoder(&mut self, vocab: &Vocabulary) -> Arc<StableEncoder> {
        let hash = vocab.canonical_hash();
        if let Some((cached_hash, encoder)) = &self.cached_encoder {
            if *cached_hash == hash {
                return Arc::clone(encoder);
            }
        }
        let encoder = Arc::new(StableEncoder::new(vocab));
        self.cached_encoder = Some((hash, Arc::clone(&encoder)));
        encoder
    }

    /// Write the artifact bundle and register the version.
    pub fn save(
        &mut self,
        vocab: &Vocabulary,
        version: &str,
        config: &EvotokConfig,
        metrics: VocabMetrics,
        freeze: bool,
    ) -> Result<VocabVersion> {
        if let Some(existing) = self.versions.get(version) {
            if existing.is_frozen {
                return Err(EvotokError::Configuration(format!(
                    "Version {} is frozen and cannot be overwritten",
                    version
                )));
            }
        }

        let version_dir = self.output_dir.join(version);
        std::fs::create_dir_all(&version_dir)?;

        let vocab_file = VocabFile {
            vocab: vocab.iter().map(hex_encode).collect(),
            size: vocab.len(),
        };
        let vocab_path = version_dir.join("vocab.json");
        std::fs::write(&vocab_path, serde_json::to_string_pretty(&vocab_file)?)?;

        std::fs::write(
            version_dir.join("config.json"),
            serde_json::to_string_pretty(config)?,
        )?;
        std::fs::write(
            version_dir.join("metrics.json"),
            serde_json::to_string_pretty(&metrics)?,
        )?;

        let hash = vocab.canonical_hash();
        std::fs::write(version_dir.join("hash.txt"), &hash)?;

        let record = VocabVersion {
            version: version.to_string(),
            created_at: Utc::now().to_rfc3339(),
            hash,
            metrics,
            config_hash: config.config_hash()?,
            is_frozen: freeze,
        };
        self.versions.insert(version.to_string(), record.clone());
        self.save_registry()?;

        if let Some(hook) = &self.notarization_hook {
            if let Err(e) = hook(&vocab_path) {
                warn!("Notarization hook failed for {}: {}", version, e);
            }
        }

        info!(
            "Saved vocabulary version {} ({} tokens, frozen: {})",
            version,
            vocab.len(),
            freeze
        );
        Ok(record)
    }

    pub fn load(&self, version: &str) -> Result<Vocabulary> {
        let vocab_path = self.output_dir.join(version).join("vocab.json");
        if !vocab_path.exists() {
            return Err(EvotokError::VersionNotFound(version.to_string()));
        }

        let contents = std::fs::read_to_string(&vocab_path)?;
        let file: VocabFile = serde_json::from_str(&contents)?;

        let tokens = file
            .vocab
            .iter()
            .map(|h| hex_decode(h))
            .collect::<Result<Vec<_>>>()?;
        Ok(Vocabulary::from_tokens(tokens))
    }

    /// Mark a version immutable.
    pub fn freeze(&mut self, version: &str) -> Result<VocabVersion> {
        let record = self
            .versions
            .get_mut(version)
            .ok_or_else(|| EvotokError::VersionNotFound(version.to_string()))?;
        record.is_frozen = true;
        let record = record.clone();
        self.save_registry()?;
        Ok(record)
    }

    /// Mutable copy of a (typically frozen) version's vocabulary.
    pub fn fork(&self, source_version: &str) -> Result<Vocabulary> {
        self.load(source_version)
    }

    pub fn version_info(&self, version: &str) -> Option<&VocabVersion> {
        self.versions.get(version)
    }

    pub fn list_versions(&self, frozen_only: bool) -> Vec<String> {
        let mut versions: Vec<String> = self
            .versions
            .values()
            .filter(|v| !frozen_only || v.is_frozen)
            .map(|v| v.version.clone())
            .collect();
        versions.sort();
        versions
    }
}

fn hex_encode(bytes: &Vec<u8>) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(EvotokError::Configuration(format!(
            "Invalid hex token in vocab file: {}",
            hex
        )));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| {
                EvotokError::Configuration(format!("Invalid hex token in vocab file: {}", hex))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let token = b"hello\xff".to_vec();
        assert_eq!(hex_decode(&hex_encode(&token)).unwrap(), token);
    }

    #[test]
    fn hex_decode_rejects_garbage() {
        assert!(hex_decode("zz").is_err());
        assert!(hex_decode("abc").is_err());
    }
}
