use crate::parsing::syntax::SyntaxUnit;
use crate::resolution::types::ResolutionResult;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A cached lookup. Absence is a cacheable answer.
#[derive(Debug, Clone)]
pub enum Lookup<V> {
    Present(V),
    Absent,
}

impl<V: Clone> Lookup<V> {
    pub fn present(&self) -> Option<V> {
        match self {
            Lookup::Present(value) => Some(value.clone()),
            Lookup::Absent => None,
        }
    }
}

impl<V> From<Option<V>> for Lookup<V> {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => Lookup::Present(value),
            None => Lookup::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSizes {
    pub files: usize,
    pub directories: usize,
    pub names: usize,
}

/// The three caches of the resolution index.
///
/// All maps are safe for concurrent readers and racing writers. Two workers
/// computing the same entry store equal values, so the last write wins.
/// `max_entries` bounds the unit caches only; evicted entries are recomputed
/// on demand.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    files: DashMap<PathBuf, Lookup<Arc<SyntaxUnit>>>,
    directories: DashMap<PathBuf, Arc<Vec<Arc<SyntaxUnit>>>>,
    names: DashMap<String, ResolutionResult>,
    max_entries: Option<usize>,
}

impl ResolutionCache {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    pub fn file(&self, path: &Path) -> Option<Lookup<Arc<SyntaxUnit>>> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    pub fn insert_file(&self, path: PathBuf, lookup: Lookup<Arc<SyntaxUnit>>) {
        make_room(&self.files, self.max_entries);
        self.files.insert(path, lookup);
    }

    pub fn directory(&self, path: &Path) -> Option<Arc<Vec<Arc<SyntaxUnit>>>> {
        self.directories.get(path).map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert_directory(&self, path: PathBuf, units: Arc<Vec<Arc<SyntaxUnit>>>) {
        make_room(&self.directories, self.max_entries);
        self.directories.insert(path, units);
    }

    pub fn name(&self, qualified_name: &str) -> Option<ResolutionResult> {
        self.names
            .get(qualified_name)
            .map(|entry| entry.value().clone())
    }

    pub fn insert_name(&self, qualified_name: String, result: ResolutionResult) {
        self.names.insert(qualified_name, result);
    }

    pub fn sizes(&self) -> CacheSizes {
        CacheSizes {
            files: self.files.len(),
            directories: self.directories.len(),
            names: self.names.len(),
        }
    }
}

fn make_room<K, V>(map: &DashMap<K, V>, max_entries: Option<usize>)
where
    K: Eq + Hash + Clone,
{
    let Some(max_entries) = max_entries else {
        return;
    };
    while map.len() >= max_entries.max(1) {
        let victim = map.iter().next().map(|entry| entry.key().clone());
        match victim {
            Some(key) => {
                map.remove(&key);
            }
            None => break,
        }
    }
}
