//! Shared cache of boundary solutions, keyed by segment cluster.
//!
//! Concurrent inserts under the same key are race-tolerant: whichever
//! writer lands last wins, and both solutions are valid for the cluster.

use crate::engines::quantum::backend::VqeResult;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct SolutionCache {
    entries: Mutex<HashMap<String, VqeResult>>,
}

impl SolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<VqeResult> {
        match self.entries.lock() {
            Ok(guard) => guard.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    pub fn insert(&self, key: String, result: VqeResult) {
        match self.entries.lock() {
            Ok(mut guard) => {
                guard.insert(key, result);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, result);
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
