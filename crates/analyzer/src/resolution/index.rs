//! The cross-file resolution index.
//!
//! A qualified name `a.b.C.D` is resolved without a global symbol table by
//! guessing where its declaration lives. For every prefix length `i`, from
//! longest to shortest, the file `root/a/.../seg[i-1].java` is a candidate
//! holding the type path `seg[i-1..]`. Only when no guess hits does the index
//! scan the directories of the failed guesses, which finds secondary
//! top-level types declared in a file with a different name.

use crate::parsing::parser::parse_java;
use crate::parsing::syntax::SyntaxUnit;
use crate::project::roots::SourceRoots;
use crate::resolution::cache::{CacheSizes, Lookup, ResolutionCache};
use crate::resolution::store::UnitStore;
use crate::resolution::types::{DeclarationHandle, ResolutionResult};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    /// Reject on-demand parses whose tree has syntax errors
    pub strict_parse: bool,
    pub max_file_size: usize,
    pub cache_size_limit: Option<usize>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            strict_parse: true,
            max_file_size: 5_000_000,
            cache_size_limit: None,
        }
    }
}

pub struct SourceIndex {
    roots: SourceRoots,
    store: UnitStore,
    cache: ResolutionCache,
    options: IndexOptions,
    /// Files that already failed to read or parse; never parsed again
    failed: FxHashSet<PathBuf>,
    on_demand_parses: AtomicUsize,
}

impl SourceIndex {
    pub fn new(roots: SourceRoots, store: UnitStore, options: IndexOptions) -> Self {
        Self {
            roots,
            store,
            cache: ResolutionCache::new(options.cache_size_limit),
            options,
            failed: FxHashSet::default(),
            on_demand_parses: AtomicUsize::new(0),
        }
    }

    /// Record files that failed before the index was built. Lookups of them
    /// answer `Absent` instead of parsing again.
    pub fn with_failed_files<I>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.failed.extend(files);
        self
    }

    pub fn roots(&self) -> &SourceRoots {
        &self.roots
    }

    pub fn store(&self) -> &UnitStore {
        &self.store
    }

    /// Number of files parsed because they were missing from the store.
    pub fn parse_count(&self) -> usize {
        self.on_demand_parses.load(Ordering::Relaxed)
    }

    pub fn cache_sizes(&self) -> CacheSizes {
        self.cache.sizes()
    }

    pub fn resolve(&self, qualified_name: &str) -> ResolutionResult {
        if let Some(cached) = self.cache.name(qualified_name) {
            return cached;
        }

        let result = self.resolve_uncached(qualified_name);
        trace!(name = qualified_name, resolved = result.is_resolved(), "resolved name");
        self.cache.insert_name(qualified_name.to_string(), result.clone());
        result
    }

    fn resolve_uncached(&self, qualified_name: &str) -> ResolutionResult {
        let segments: SmallVec<[&str; 8]> = qualified_name.split('.').collect();
        if segments.iter().any(|segment| !is_java_identifier(segment)) {
            return ResolutionResult::Unresolved;
        }

        for root in self.roots.iter() {
            if let Some(handle) = self.resolve_in_root(root, &segments) {
                return ResolutionResult::Resolved(handle);
            }
        }

        ResolutionResult::Unresolved
    }

    fn resolve_in_root(&self, root: &Path, segments: &[&str]) -> Option<DeclarationHandle> {
        let mut fallbacks: Vec<(PathBuf, &[&str])> = Vec::new();

        for prefix in (1..=segments.len()).rev() {
            let mut candidate = root.to_path_buf();
            for segment in &segments[..prefix - 1] {
                candidate.push(segment);
            }
            let directory = candidate.clone();
            candidate.push(format!("{}.java", segments[prefix - 1]));
            let type_path = &segments[prefix - 1..];

            if candidate.is_file()
                && let Some(unit) = self.unit_for_file(&candidate)
                && let Some(index) = unit.find_type(type_path)
            {
                return Some(DeclarationHandle::Source { unit, index });
            }

            if !fallbacks.iter().any(|(dir, _)| dir == &directory) {
                fallbacks.push((directory, type_path));
            }
        }

        for (directory, type_path) in fallbacks {
            for unit in self.units_in_directory(&directory).iter() {
                if let Some(index) = unit.find_type(type_path) {
                    debug!(
                        "Found {} in {} by directory scan",
                        type_path.join("."),
                        unit.path.display()
                    );
                    return Some(DeclarationHandle::Source {
                        unit: Arc::clone(unit),
                        index,
                    });
                }
            }
        }

        None
    }

    /// The unit of one file: cache, then store, then an on-demand parse.
    pub fn unit_for_file(&self, path: &Path) -> Option<Arc<SyntaxUnit>> {
        if let Some(lookup) = self.cache.file(path) {
            return lookup.present();
        }

        let unit = match self.store.get(path) {
            Some(unit) => Some(unit),
            None if self.failed.contains(path) => None,
            None => self.parse_on_demand(path),
        };
        self.cache
            .insert_file(path.to_path_buf(), Lookup::from(unit.clone()));
        unit
    }

    fn parse_on_demand(&self, path: &Path) -> Option<Arc<SyntaxUnit>> {
        let metadata = std::fs::metadata(path).ok()?;
        if !metadata.is_file() || metadata.len() as usize > self.options.max_file_size {
            return None;
        }

        let source = std::fs::read_to_string(path).ok()?;
        self.on_demand_parses.fetch_add(1, Ordering::Relaxed);

        match parse_java(path, source, self.options.strict_parse) {
            Ok(unit) => Some(Arc::new(unit)),
            Err(e) => {
                debug!("On-demand parse of {} failed: {e}", path.display());
                None
            }
        }
    }

    /// Units of every `.java` file directly inside `directory`, sorted by path.
    pub fn units_in_directory(&self, directory: &Path) -> Arc<Vec<Arc<SyntaxUnit>>> {
        if let Some(units) = self.cache.directory(directory) {
            return units;
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(directory)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("java")
                    })
                    .collect()
            })
            .unwrap_or_default();
        files.sort();

        let units: Arc<Vec<Arc<SyntaxUnit>>> = Arc::new(
            files
                .iter()
                .filter_map(|file| self.unit_for_file(file))
                .collect(),
        );
        self.cache
            .insert_directory(directory.to_path_buf(), Arc::clone(&units));
        units
    }
}

pub fn is_java_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
