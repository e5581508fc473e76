//! The two-phase pipeline.
//!
//! Phase one parses every file on the worker pool. Once all trees exist the
//! unit store, the resolution index and the resolver are built on the calling
//! thread. Phase two then extracts every unit on the same pool, sharing the
//! resolver by reference.

use crate::error::{AnalysisError, ConfigurationError, ExtractionError};
use crate::execution::config::AnalysisConfig;
use crate::extraction::extract_file;
use crate::parsing::processor::{ErroredFile, ProcessingResult, SkippedFile, process_file};
use crate::parsing::syntax::SyntaxUnit;
use crate::project::file_info::FileInfo;
use crate::project::roots::SourceRoots;
use crate::project::source::FileSource;
use crate::report::{ReportCounts, ReportSink, RowCounts};
use crate::resolution::{
    CacheSizes, ExternalTypeSolver, SourceIndex, TypeResolver, UnitStore,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Extraction result of one file.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub path: PathBuf,
    pub result: Result<ReportCounts, ExtractionError>,
    pub processing_time: Duration,
}

#[derive(Debug, Default)]
pub struct AnalysisResult {
    pub files_discovered: usize,
    pub files_parsed: usize,
    pub skipped_files: Vec<SkippedFile>,
    pub errored_files: Vec<ErroredFile>,
    pub outcomes: Vec<ExtractionOutcome>,
    pub parse_duration: Duration,
    pub extract_duration: Duration,
    pub cache_sizes: CacheSizes,
    pub on_demand_parses: usize,
}

impl AnalysisResult {
    pub fn files_extracted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn extraction_failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// Rows written per report kind, summed over every extracted file.
    pub fn row_counts(&self) -> ReportCounts {
        let mut totals = ReportCounts::new();
        for counts in self.outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
            for (kind, rows) in counts {
                *totals.entry(*kind).or_insert_with(RowCounts::default) += *rows;
            }
        }
        totals
    }
}

pub struct AnalysisExecutor {
    config: AnalysisConfig,
    pool: ThreadPool,
}

impl AnalysisExecutor {
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigurationError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.max(1))
            .thread_name(|index| format!("jxref-worker-{index}"))
            .build()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run both phases over the files of `file_source`, writing reports to
    /// `sink`.
    pub fn execute<F: FileSource>(
        &self,
        roots: SourceRoots,
        file_source: &F,
        external: Box<dyn ExternalTypeSolver>,
        sink: &dyn ReportSink,
    ) -> Result<AnalysisResult, AnalysisError> {
        let files = file_source
            .get_files(&self.config)
            .map_err(|e| AnalysisError::FileSource(e.to_string()))?;
        info!(
            "Analyzing {} files from {} source roots with {} threads",
            files.len(),
            roots.len(),
            self.config.worker_threads
        );

        let mut result = AnalysisResult {
            files_discovered: files.len(),
            ..AnalysisResult::default()
        };

        let parse_start = Instant::now();
        let units = self.parse_files(&files, &mut result);
        result.parse_duration = parse_start.elapsed();
        result.files_parsed = units.len();
        info!(
            "Parsed {} files in {:?} ({} skipped, {} errors)",
            units.len(),
            result.parse_duration,
            result.skipped_files.len(),
            result.errored_files.len()
        );

        let store = UnitStore::build(units.iter().cloned())?;
        let index = SourceIndex::new(roots, store, self.config.index_options()).with_failed_files(
            result
                .errored_files
                .iter()
                .map(|errored| PathBuf::from(&errored.file_path)),
        );
        let resolver = TypeResolver::new(index, external);

        let extract_start = Instant::now();
        result.outcomes = self.extract_units(&resolver, &units, sink);
        result.extract_duration = extract_start.elapsed();
        result.cache_sizes = resolver.index().cache_sizes();
        result.on_demand_parses = resolver.index().parse_count();
        info!(
            "Extracted {} files in {:?} ({} failed)",
            result.files_extracted(),
            result.extract_duration,
            result.extraction_failures()
        );

        Ok(result)
    }

    /// Phase one. Results come back in input order.
    fn parse_files(&self, files: &[FileInfo], result: &mut AnalysisResult) -> Vec<Arc<SyntaxUnit>> {
        let max_file_size = self.config.max_file_size;
        let strict = self.config.strict_parse;
        let processed: Vec<ProcessingResult> = self.pool.install(|| {
            files
                .par_iter()
                .map(|file_info| process_file(file_info, max_file_size, strict))
                .collect()
        });

        let mut units = Vec::with_capacity(processed.len());
        for processing_result in processed {
            match processing_result {
                ProcessingResult::Success(parsed) => {
                    debug!(
                        "Parsed {} ({} bytes) in {:?}",
                        parsed.unit.path.display(),
                        parsed.file_size,
                        parsed.processing_time
                    );
                    units.push(parsed.unit);
                }
                ProcessingResult::Skipped(skipped) => {
                    debug!("Skipped {}: {}", skipped.file_path, skipped.reason);
                    result.skipped_files.push(skipped);
                }
                ProcessingResult::Error(errored) => {
                    warn!("Failed to parse {}: {}", errored.file_path, errored.error_message);
                    result.errored_files.push(errored);
                }
            }
        }
        units
    }

    /// Phase two. Each file's error stays in its own outcome.
    fn extract_units(
        &self,
        resolver: &TypeResolver,
        units: &[Arc<SyntaxUnit>],
        sink: &dyn ReportSink,
    ) -> Vec<ExtractionOutcome> {
        self.pool.install(|| {
            units
                .par_iter()
                .map(|unit| {
                    let start = Instant::now();
                    let solver = resolver.solver(Arc::clone(unit));
                    let result = extract_file(&solver, sink);
                    if let Err(e) = &result {
                        error!("Extraction failed for {}: {e}", unit.path.display());
                    }
                    ExtractionOutcome {
                        path: unit.path.clone(),
                        result,
                        processing_time: start.elapsed(),
                    }
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::config::AnalysisConfigBuilder;
    use crate::project::source::PathFileSource;
    use crate::report::{MemoryReportSink, ReportKind};
    use crate::resolution::PlatformTypes;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &std::path::Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_errors_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "pkg/Good.java", "package pkg; class Good { Bad b; }");
        write(temp_dir.path(), "pkg/Bad.java", "package pkg; class Bad {");
        write(temp_dir.path(), "pkg/README.md", "# notes");

        let roots = SourceRoots::new([temp_dir.path()]).unwrap();
        let source = PathFileSource::from_roots(&roots, false);
        let executor = AnalysisExecutor::new(AnalysisConfigBuilder::build(2)).unwrap();
        let sink = MemoryReportSink::new();

        let result = executor
            .execute(roots, &source, Box::new(PlatformTypes::jdk()), &sink)
            .unwrap();

        assert_eq!(result.files_discovered, 3);
        assert_eq!(result.skipped_files.len(), 1);
        assert_eq!(result.files_parsed, 1);
        assert_eq!(result.errored_files.len(), 1);
        assert_eq!(result.files_extracted(), 1);
        // Bad.java failed in phase one, so resolving `Bad` does not parse it again
        assert_eq!(result.row_counts()[&ReportKind::Types].errors, 1);
        assert_eq!(result.on_demand_parses, 0);
    }

    #[test]
    fn test_duplicate_types_abort_before_extraction() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "pkg/Foo.java", "package pkg; class Foo {}");
        write(b.path(), "pkg/Foo.java", "package pkg; class Foo {}");

        let roots = SourceRoots::new([a.path(), b.path()]).unwrap();
        let source = PathFileSource::from_roots(&roots, false);
        let executor = AnalysisExecutor::new(AnalysisConfigBuilder::build(1)).unwrap();
        let sink = MemoryReportSink::new();

        let err = executor
            .execute(roots, &source, Box::new(PlatformTypes::jdk()), &sink)
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Configuration(ConfigurationError::DuplicateType { .. })
        ));
        assert!(sink.sources().is_empty());
    }
}
