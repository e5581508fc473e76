use crate::error::ConfigurationError;
use std::path::{Path, PathBuf};

/// Ordered, de-duplicated list of directories that hold Java sources.
///
/// The order is the search priority used by the resolution index. Roots are
/// validated and canonicalized once; the list is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoots {
    roots: Vec<PathBuf>,
}

impl SourceRoots {
    pub fn new<I, P>(roots: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut validated: Vec<PathBuf> = Vec::new();

        for root in roots {
            let root = root.as_ref();
            if !root.exists() {
                return Err(ConfigurationError::MissingRoot(root.to_path_buf()));
            }
            if !root.is_dir() {
                return Err(ConfigurationError::NotADirectory(root.to_path_buf()));
            }

            let canonical = root
                .canonicalize()
                .map_err(|_| ConfigurationError::MissingRoot(root.to_path_buf()))?;
            if !validated.contains(&canonical) {
                validated.push(canonical);
            }
        }

        if validated.is_empty() {
            return Err(ConfigurationError::NoRoots);
        }

        Ok(Self { roots: validated })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every root that contains `path`.
    pub fn containing<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Path> + 'a {
        self.iter().filter(move |root| path.starts_with(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let err = SourceRoots::new([&missing]).expect_err("missing root must fail");
        assert!(matches!(err, ConfigurationError::MissingRoot(path) if path == missing));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("Foo.java");
        std::fs::write(&file, "class Foo {}").unwrap();

        let err = SourceRoots::new([&file]).expect_err("file root must fail");
        assert!(matches!(err, ConfigurationError::NotADirectory(_)));
    }

    #[test]
    fn test_roots_are_deduplicated_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();

        let roots = SourceRoots::new([&b, &a, &b]).unwrap();
        let collected: Vec<&Path> = roots.iter().collect();

        assert_eq!(collected.len(), 2);
        assert!(collected[0].ends_with("b"));
        assert!(collected[1].ends_with("a"));
    }

    #[test]
    fn test_empty_roots_rejected() {
        let err = SourceRoots::new(Vec::<PathBuf>::new()).expect_err("no roots");
        assert!(matches!(err, ConfigurationError::NoRoots));
    }
}
