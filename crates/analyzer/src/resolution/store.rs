use crate::error::ConfigurationError;
use crate::parsing::syntax::SyntaxUnit;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The parsed units of a run, keyed by absolute path.
///
/// Also records which file declares each fully qualified type; two files
/// claiming the same type make the configuration invalid.
#[derive(Debug, Default)]
pub struct UnitStore {
    units: FxHashMap<PathBuf, Arc<SyntaxUnit>>,
    declarations: FxHashMap<String, PathBuf>,
}

impl UnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<I>(units: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = Arc<SyntaxUnit>>,
    {
        let mut store = Self::new();
        for unit in units {
            store.insert(unit)?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, unit: Arc<SyntaxUnit>) -> Result<(), ConfigurationError> {
        for name in unit.types.iter().filter_map(|t| t.qualified_name.as_ref()) {
            match self.declarations.get(name) {
                Some(first) if first != &unit.path => {
                    return Err(ConfigurationError::DuplicateType {
                        name: name.clone(),
                        first: first.clone(),
                        second: unit.path.clone(),
                    });
                }
                _ => {
                    self.declarations.insert(name.clone(), unit.path.clone());
                }
            }
        }

        self.units.insert(unit.path.clone(), unit);
        Ok(())
    }

    pub fn get(&self, path: &Path) -> Option<Arc<SyntaxUnit>> {
        self.units.get(path).cloned()
    }

    pub fn declaring_file(&self, qualified_name: &str) -> Option<&Path> {
        self.declarations.get(qualified_name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
