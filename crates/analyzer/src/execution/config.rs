use crate::resolution::IndexOptions;
use serde::{Deserialize, Serialize};

/// Settings of one analysis run after the configuration file and the command
/// line have been merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub worker_threads: usize,
    pub max_file_size: usize,
    pub respect_gitignore: bool,
    /// Treat any syntax error in a tree as a parse failure
    pub strict_parse: bool,
    pub cache_size_limit: Option<usize>,
}

impl AnalysisConfig {
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            strict_parse: self.strict_parse,
            max_file_size: self.max_file_size,
            cache_size_limit: self.cache_size_limit,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfigBuilder::build(0)
    }
}

pub struct AnalysisConfigBuilder;

impl AnalysisConfigBuilder {
    pub fn build(threads: usize) -> AnalysisConfig {
        let effective_threads = AnalysisConfigBuilder::get_effective_threads(threads);
        AnalysisConfig {
            worker_threads: effective_threads,
            max_file_size: 5_000_000,
            respect_gitignore: false,
            strict_parse: true,
            cache_size_limit: None,
        }
    }

    pub fn get_effective_threads(threads: usize) -> usize {
        if threads == 0 {
            num_cpus::get()
        } else {
            threads
        }
    }
}
