use crate::error::ReportError;
use std::path::{Path, PathBuf};

/// Maps each source root to the directory its reports are written to.
///
/// The output of `root/a/b/Foo.java` is `out/a/b/Foo.java`, to which the
/// report sink appends its own suffixes.
#[derive(Debug, Clone, Default)]
pub struct OutputLayout {
    mappings: Vec<(PathBuf, PathBuf)>,
}

impl OutputLayout {
    pub fn new<I>(mappings: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, PathBuf)>,
    {
        let mappings = mappings
            .into_iter()
            .map(|(source, output)| {
                let source = source.canonicalize().unwrap_or(source);
                (source, output)
            })
            .collect();
        Self { mappings }
    }

    /// Every root writes into the same output directory.
    pub fn single_output<I>(roots: I, output: &Path) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self::new(roots.into_iter().map(|root| (root, output.to_path_buf())))
    }

    pub fn output_stem(&self, source: &Path) -> Result<PathBuf, ReportError> {
        let mut matches = self
            .mappings
            .iter()
            .filter(|(root, _)| source.starts_with(root));

        match (matches.next(), matches.next()) {
            (Some((root, output)), None) => {
                let relative = source
                    .strip_prefix(root)
                    .map_err(|_| ReportError::OutputLayout {
                        path: source.to_path_buf(),
                        matches: 0,
                    })?;
                Ok(output.join(relative))
            }
            (None, _) => Err(ReportError::OutputLayout {
                path: source.to_path_buf(),
                matches: 0,
            }),
            (Some(_), Some(_)) => Err(ReportError::OutputLayout {
                path: source.to_path_buf(),
                matches: 2 + matches.count(),
            }),
        }
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.mappings.iter().map(|(_, output)| output.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_stem_mirrors_relative_path() {
        let layout = OutputLayout::new([(
            PathBuf::from("/src/lib/module"),
            PathBuf::from("/out/lib"),
        )]);

        let stem = layout
            .output_stem(Path::new("/src/lib/module/pkg/Foo.java"))
            .unwrap();
        assert_eq!(stem, PathBuf::from("/out/lib/pkg/Foo.java"));
    }

    #[test]
    fn test_output_stem_requires_exactly_one_root() {
        let layout = OutputLayout::new([
            (PathBuf::from("/src/a"), PathBuf::from("/out/a")),
            (PathBuf::from("/src/a/nested"), PathBuf::from("/out/nested")),
        ]);

        let err = layout
            .output_stem(Path::new("/src/a/nested/Foo.java"))
            .expect_err("two roots match");
        assert!(matches!(err, ReportError::OutputLayout { matches: 2, .. }));

        let err = layout
            .output_stem(Path::new("/elsewhere/Foo.java"))
            .expect_err("no root matches");
        assert!(matches!(err, ReportError::OutputLayout { matches: 0, .. }));
    }
}
