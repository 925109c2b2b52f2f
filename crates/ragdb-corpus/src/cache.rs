//! Cross-request corpus cache keyed by base directory.
//!
//! Entries live until `refresh`/`refresh_all` is called. A directory that does
//! not exist is never cached, so provisioning it later is picked up without a
//! refresh.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use ragdb_core::types::CorpusEntry;

use crate::loader::load_corpus;

#[derive(Default)]
pub struct CorpusCache {
    entries: RwLock<HashMap<PathBuf, Arc<Vec<CorpusEntry>>>>,
}

impl CorpusCache {
    pub fn new() -> Self { Self::default() }

    pub fn get_or_load(&self, base_dir: &Path) -> Arc<Vec<CorpusEntry>> {
        let key = cache_key(base_dir);
        if let Some(hit) = self.entries.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
            debug!(base = %key.display(), "corpus cache hit");
            return Arc::clone(hit);
        }
        let loaded = Arc::new(load_corpus(base_dir));
        if !base_dir.is_dir() {
            return loaded;
        }
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(key).or_insert(loaded))
    }

    /// Drop the cached corpus for `base_dir`; returns whether one was cached.
    pub fn refresh(&self, base_dir: &Path) -> bool {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).remove(&cache_key(base_dir)).is_some()
    }

    pub fn refresh_all(&self) { self.entries.write().unwrap_or_else(PoisonError::into_inner).clear(); }

    pub fn len(&self) -> usize { self.entries.read().unwrap_or_else(PoisonError::into_inner).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

fn cache_key(base_dir: &Path) -> PathBuf { base_dir.canonicalize().unwrap_or_else(|_| base_dir.to_path_buf()) }
