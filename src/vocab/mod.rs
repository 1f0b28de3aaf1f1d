pub mod compat;
pub mod encoder;
pub mod manager;
pub mod vocabulary;

pub use compat::{build_compatibility_map, ReferenceTokenizer};
pub use encoder::StableEncoder;
pub use manager::{NotarizationHook, VocabManager, VocabMetrics, VocabVersion};
pub use vocabulary::{is_valid_token, Vocabulary, MAX_TOKEN_LEN};
