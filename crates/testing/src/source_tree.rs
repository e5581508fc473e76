use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A throwaway Java source root.
///
/// The tree is either copied from a fixture under `fixtures/java/` at the
/// root of the workspace, or written file by file from inline sources.
/// example usage:
/// ```rust,ignore
/// let temp_dir = TempDir::new().expect("Failed to create temp directory");
/// let tree = TestSourceTree::new(temp_dir.path(), Some("shop"));
/// tree.write("com/shop/Extra.java", "package com.shop; class Extra {}");
/// assert!(tree.root().join("com/shop/model/Item.java").exists());
/// ```
pub struct TestSourceTree {
    pub dir: PathBuf,
}

impl TestSourceTree {
    pub fn new(dir: &Path, fixture_name: Option<&str>) -> Self {
        fs::create_dir_all(dir).expect("Failed to create source root");

        if let Some(fixture_name) = fixture_name {
            let fixture = fixtures_dir().join(fixture_name);
            copy_dir_all(&fixture, dir)
                .with_context(|| format!("Failed to copy fixture {}", fixture.display()))
                .expect("Failed to copy fixture files");
        }

        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn with_files(dir: &Path, files: &[(&str, &str)]) -> Self {
        let tree = Self::new(dir, None);
        for (relative, content) in files {
            tree.write(relative, content);
        }
        tree
    }

    pub fn root(&self) -> &Path {
        &self.dir
    }

    /// Write one source file, creating its package directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create package directory");
        }
        fs::write(&path, content).expect("Failed to write source file");
        path
    }

    /// Paths of every `.java` file in the tree, relative to the root, sorted.
    pub fn java_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_java_files(&self.dir, &self.dir, &mut files);
        files.sort();
        files
    }
}

fn collect_java_files(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_java_files(root, &path, files);
        } else if path.extension().is_some_and(|ext| ext == "java")
            && let Ok(relative) = path.strip_prefix(root)
        {
            files.push(relative.to_path_buf());
        }
    }
}

/// `fixtures/java` at the root of the workspace.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(Path::parent)
        .expect("testing crate lives in crates/testing")
        .join("fixtures")
        .join("java")
}

pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)?;
    }

    for entry in fs::read_dir(src).with_context(|| format!("Failed to read {}", src.display()))? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_all(&src_path, &dst_path)?;
        } else {
            debug!("Copying fixture {}", src_path.display());
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}
