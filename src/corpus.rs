//! Corpus abstraction: the engine only ever sees a sequence of byte buffers.

/// Source of training contexts.
pub trait CorpusSource {
    fn contexts(&self) -> &[Vec<u8>];

    fn total_bytes(&self) -> usize {
        self.contexts().iter().map(|c| c.len()).sum()
    }
}

/// Contexts held in memory, the only source the trainer needs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    contexts: Vec<Vec<u8>>,
}

impl InMemoryCorpus {
    pub fn new(contexts: Vec<Vec<u8>>) -> Self {
        Self { contexts }
    }

    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        Self {
            contexts: texts
                .iter()
                .map(|t| t.as_ref().as_bytes().to_vec())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }
}

impl CorpusSource for InMemoryCorpus {
    fn contexts(&self) -> &[Vec<u8>] {
        &self.contexts
    }
}
