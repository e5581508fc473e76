use crate::execution::config::AnalysisConfig;
use crate::project::file_info::FileInfo;
use crate::project::roots::SourceRoots;
use ignore::WalkBuilder;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

// The FileSource trait keeps the pipeline agnostic of how files are discovered.
// PathFileSource walks the configured source roots on disk; tests and embedders
// can hand in a pre-enumerated list instead.

pub trait FileSource {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn get_files(&self, config: &AnalysisConfig) -> Result<Vec<FileInfo>, Self::Error>;
}

pub struct PathFileSource {
    pub files: Vec<FileInfo>,
}

impl PathFileSource {
    pub fn new(mut files: Vec<FileInfo>) -> Self {
        files.sort();
        files.dedup();
        Self { files }
    }

    /// Walk every root. Results are sorted so that later phases see a stable
    /// order no matter how the parallel walk interleaved.
    pub fn from_roots(roots: &SourceRoots, respect_gitignore: bool) -> Self {
        let files = Arc::new(Mutex::new(Vec::new()));
        for root in roots.iter() {
            walk_root(root, respect_gitignore, &files);
        }

        Self::new(collected(&files))
    }
}

/// Files gathered by the walk. A walker thread that panicked while holding
/// the lock leaves its pushes intact, so the list is recovered and flagged.
fn collected(files: &Mutex<Vec<FileInfo>>) -> Vec<FileInfo> {
    match files.lock() {
        Ok(files) => files.clone(),
        Err(poisoned) => {
            let files = poisoned.into_inner().clone();
            warn!(
                "Source walk panicked, continuing with the {} files collected",
                files.len()
            );
            files
        }
    }
}

fn walk_root(root: &Path, respect_gitignore: bool, files: &Arc<Mutex<Vec<FileInfo>>>) {
    WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(respect_gitignore)
        .git_global(false)
        .git_exclude(respect_gitignore)
        .ignore(respect_gitignore)
        .parents(false)
        .build_parallel()
        .run(|| {
            let files: Arc<Mutex<Vec<FileInfo>>> = Arc::clone(files);

            Box::new(move |result| {
                if let Ok(entry) = result
                    && entry.file_type().map(|ft| ft.is_file()).unwrap_or(false)
                {
                    files
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push(FileInfo::from_path(entry.path().to_path_buf()));
                }
                ignore::WalkState::Continue
            })
        });
}

impl FileSource for PathFileSource {
    type Error = &'static str;

    fn get_files(&self, _config: &AnalysisConfig) -> Result<Vec<FileInfo>, Self::Error> {
        debug!(
            "{} of {} files are Java sources",
            self.files.iter().filter(|f| f.is_java_source()).count(),
            self.files.len()
        );
        Ok(self.files.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::config::AnalysisConfigBuilder;
    use std::fs;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    #[test]
    fn test_from_roots_collects_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::write(root.join("pkg/Foo.java"), "package pkg; class Foo {}").unwrap();
        fs::write(root.join("pkg/sub/Bar.java"), "package pkg.sub; class Bar {}").unwrap();
        fs::write(root.join("pkg/notes.txt"), "not java").unwrap();

        let roots = SourceRoots::new([root]).unwrap();
        let source = PathFileSource::from_roots(&roots, false);
        let files = source.get_files(&AnalysisConfigBuilder::build(1)).unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files.iter().filter(|f| f.is_java_source()).count(), 2);
        assert!(files.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    #[traced_test]
    fn test_poisoned_walk_keeps_collected_files() {
        let files = Arc::new(Mutex::new(vec![FileInfo::from_path("/src/pkg/Foo.java".into())]));
        let shared = Arc::clone(&files);
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("walker failed");
        })
        .join();
        assert!(files.is_poisoned());

        let collected = collected(&files);
        assert_eq!(collected.len(), 1);
        assert!(logs_contain("continuing with the 1 files collected"));
    }

    #[test]
    fn test_new_deduplicates_files() {
        let file = FileInfo::from_path("/tmp/a/Foo.java".into());
        let source = PathFileSource::new(vec![file.clone(), file]);
        assert_eq!(source.files.len(), 1);
    }
}
