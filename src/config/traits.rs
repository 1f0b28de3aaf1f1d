use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<()>;
}

/// Operating mode for the tokenizer.
///
/// `Production` only serves frozen vocabularies; any evolution request is a
/// configuration error. `Research` allows the full GA/VQE pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Research,
    Production,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Research
    }
}
