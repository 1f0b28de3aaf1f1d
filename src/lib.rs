//! Evolutionary vocabulary optimization for byte-level tokenizers.
//!
//! A genetic algorithm searches the space of token sets against a corpus,
//! a simulated variational optimizer refines token boundaries inside
//! high-entropy segments, and a versioned manager persists the winners as
//! frozen, reproducible artifacts.

pub mod config;
pub mod corpus;
pub mod engines;
pub mod error;
pub mod tokenizer;
pub mod vocab;

pub use config::{ConfigManager, EvotokConfig, Mode};
pub use corpus::{CorpusSource, InMemoryCorpus};
pub use error::{EvotokError, Result};
pub use tokenizer::QuantumEvoTokenizer;
pub use vocab::{StableEncoder, VocabManager, Vocabulary};
