//! `jxref.toml`: where the sources live, where reports go and how to run.

use crate::error::ConfigurationError;
use crate::execution::config::{AnalysisConfig, AnalysisConfigBuilder};
use crate::project::layout::OutputLayout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub sources_root: PathBuf,
    pub analysis_root: PathBuf,
    #[serde(default)]
    pub threads: usize,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    #[serde(default = "default_true")]
    pub strict_parse: bool,
    #[serde(default)]
    pub respect_gitignore: bool,
    #[serde(default)]
    pub cache_size_limit: Option<usize>,
    #[serde(default)]
    pub libraries: Vec<Library>,
}

fn default_max_file_size() -> usize {
    5_000_000
}

fn default_true() -> bool {
    true
}

/// A versioned source distribution, laid out as
/// `<sources_root>/<group>/<artifact>/<version>[/<module>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Library {
    pub name: String,
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default)]
    pub modules: Vec<String>,
}

impl Library {
    fn relative_dir(&self) -> PathBuf {
        [&self.group, &self.artifact, &self.version].iter().collect()
    }

    /// One root per module, or the version directory when there are none.
    pub fn source_roots(&self, sources_root: &Path) -> Vec<PathBuf> {
        let base = sources_root.join(self.relative_dir());
        if self.modules.is_empty() {
            vec![base]
        } else {
            self.modules.iter().map(|module| base.join(module)).collect()
        }
    }

    pub fn output_dir(&self, analysis_root: &Path) -> PathBuf {
        analysis_root.join(self.relative_dir())
    }

    /// Every module writes into the library's output directory.
    pub fn output_layout(&self, sources_root: &Path, analysis_root: &Path) -> OutputLayout {
        OutputLayout::single_output(
            self.source_roots(sources_root),
            &self.output_dir(analysis_root),
        )
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigurationError> {
        toml::from_str(text).map_err(|source| ConfigurationError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn library(&self, name: &str) -> Result<&Library, ConfigurationError> {
        self.libraries
            .iter()
            .find(|library| library.name == name)
            .ok_or_else(|| ConfigurationError::UnknownLibrary(name.to_string()))
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            max_file_size: self.max_file_size,
            strict_parse: self.strict_parse,
            respect_gitignore: self.respect_gitignore,
            cache_size_limit: self.cache_size_limit,
            ..AnalysisConfigBuilder::build(self.threads)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
sources_root = "/work/sources"
analysis_root = "/work/analysis"
threads = 3

[[libraries]]
name = "openjdk"
group = "JDK"
artifact = "openjdk8"
version = "jdk8-b120"
modules = ["corba", "jdk"]

[[libraries]]
name = "commons-io"
group = "commons-io"
artifact = "commons-io"
version = "2.11.0"
"#;

    fn config() -> RunConfig {
        RunConfig::parse(CONFIG, Path::new("jxref.toml")).unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_settings() {
        let config = config();
        assert_eq!(config.max_file_size, 5_000_000);
        assert!(config.strict_parse);
        assert!(!config.respect_gitignore);
        assert_eq!(config.cache_size_limit, None);
        assert_eq!(config.analysis_config().worker_threads, 3);
    }

    #[test]
    fn test_library_layout() {
        let config = config();
        let openjdk = config.library("openjdk").unwrap();
        assert_eq!(
            openjdk.source_roots(&config.sources_root),
            [
                PathBuf::from("/work/sources/JDK/openjdk8/jdk8-b120/corba"),
                PathBuf::from("/work/sources/JDK/openjdk8/jdk8-b120/jdk"),
            ]
        );
        assert_eq!(
            openjdk.output_dir(&config.analysis_root),
            PathBuf::from("/work/analysis/JDK/openjdk8/jdk8-b120")
        );

        let commons = config.library("commons-io").unwrap();
        assert_eq!(
            commons.source_roots(&config.sources_root),
            [PathBuf::from("/work/sources/commons-io/commons-io/2.11.0")]
        );
    }

    #[test]
    fn test_unknown_library_and_bad_files() {
        let err = config().library("guava").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownLibrary(name) if name == "guava"));

        let err = RunConfig::parse("sources_root = 1", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidConfig { .. }));

        let err = RunConfig::load(Path::new("/definitely/missing/jxref.toml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::ReadConfig { .. }));
    }
}
