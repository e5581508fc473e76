use crate::config::RunConfig;
use crate::execution::config::AnalysisConfig;
use crate::execution::executor::AnalysisExecutor;
use crate::project::layout::OutputLayout;
use crate::project::roots::SourceRoots;
use crate::project::source::PathFileSource;
use crate::report::ParquetReportSink;
use crate::resolution::{
    DeclarationHandle, IndexOptions, PlatformTypes, ResolutionResult, SourceIndex, TypeResolver,
    UnitStore,
};
use crate::stats::RunStatistics;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{Level, error, info, warn};

fn progress_with_tracing<F>(message: &str, progress: &mut F, level: Level)
where
    F: FnMut(&str),
{
    progress(message);
    match level {
        Level::WARN => warn!("{message}"),
        Level::ERROR => error!("{message}"),
        _ => info!("{message}"),
    }
}

/// What to analyse and where the reports go.
#[derive(Debug, Clone)]
pub struct AnalysisTarget {
    pub name: String,
    pub source_roots: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub layout: OutputLayout,
    pub config: AnalysisConfig,
}

impl AnalysisTarget {
    /// A library declared in the run configuration.
    pub fn from_library(run_config: &RunConfig, name: &str) -> Result<Self> {
        let library = run_config.library(name)?;
        Ok(Self {
            name: library.name.clone(),
            source_roots: library.source_roots(&run_config.sources_root),
            output_dir: library.output_dir(&run_config.analysis_root),
            layout: library.output_layout(&run_config.sources_root, &run_config.analysis_root),
            config: run_config.analysis_config(),
        })
    }

    /// Ad hoc source directories sharing one output directory.
    pub fn from_sources(sources: Vec<PathBuf>, output_dir: PathBuf, config: AnalysisConfig) -> Self {
        let name = sources
            .first()
            .and_then(|root| root.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "sources".to_string());
        Self {
            name,
            layout: OutputLayout::single_output(sources.clone(), &output_dir),
            source_roots: sources,
            output_dir,
            config,
        }
    }
}

/// Parse, resolve and extract one target into Parquet reports.
///
/// Only setup problems are returned as errors. Per-file failures are logged
/// and counted in the returned statistics.
pub fn run_analysis<F>(target: AnalysisTarget, mut progress: F) -> Result<RunStatistics>
where
    F: FnMut(&str),
{
    let start_time = Instant::now();
    progress_with_tracing(
        &format!("🚀 Analyzing {}", target.name),
        &mut progress,
        Level::INFO,
    );
    for root in &target.source_roots {
        progress_with_tracing(
            &format!("  📂 Source root: {}", root.display()),
            &mut progress,
            Level::INFO,
        );
    }
    progress_with_tracing(
        &format!("  📁 Output: {}", target.output_dir.display()),
        &mut progress,
        Level::INFO,
    );
    progress_with_tracing(
        &format!(
            "  🧵 Threads: {}, strict parse: {}, max file size: {} MB",
            target.config.worker_threads,
            target.config.strict_parse,
            target.config.max_file_size / 1_000_000
        ),
        &mut progress,
        Level::INFO,
    );

    let roots = SourceRoots::new(&target.source_roots).context("Invalid source roots")?;
    let file_source = PathFileSource::from_roots(&roots, target.config.respect_gitignore);
    let sink = ParquetReportSink::new(target.layout);
    let executor = AnalysisExecutor::new(target.config)?;

    let result = executor.execute(roots, &file_source, Box::new(PlatformTypes::jdk()), &sink)?;

    for errored in result.errored_files.iter().take(5) {
        progress_with_tracing(
            &format!("  ⚠️ {}: {}", errored.file_path, errored.error_message),
            &mut progress,
            Level::WARN,
        );
    }
    if result.errored_files.len() > 5 {
        progress_with_tracing(
            &format!("  ⚠️ ... and {} more parse errors", result.errored_files.len() - 5),
            &mut progress,
            Level::WARN,
        );
    }

    let elapsed = start_time.elapsed();
    let stats = RunStatistics::new(
        target.name,
        target.source_roots,
        target.output_dir,
        &result,
        elapsed.as_secs_f64(),
    );
    progress_with_tracing(&stats.to_string(), &mut progress, Level::INFO);
    progress_with_tracing(
        &format!("🎉 Analysis completed in {}", format_elapsed(elapsed)),
        &mut progress,
        Level::INFO,
    );

    Ok(stats)
}

/// Where a qualified name was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLocation {
    Source(PathBuf),
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameResolution {
    pub name: String,
    pub resolved: Option<(String, NameLocation)>,
}

/// Look up qualified names in a fresh index over `source_roots`, parsing
/// files on demand.
pub fn resolve_names(
    source_roots: &[PathBuf],
    names: &[String],
    options: IndexOptions,
) -> Result<Vec<NameResolution>> {
    let roots = SourceRoots::new(source_roots).context("Invalid source roots")?;
    let index = SourceIndex::new(roots, UnitStore::new(), options);
    let resolver = TypeResolver::new(index, Box::new(PlatformTypes::jdk()));

    let resolutions = names
        .iter()
        .map(|name| {
            let resolved = match resolver.solve_type(name) {
                ResolutionResult::Resolved(handle) => {
                    let location = match &handle {
                        DeclarationHandle::Source { unit, .. } => {
                            NameLocation::Source(unit.path.clone())
                        }
                        DeclarationHandle::External(_) => NameLocation::External,
                    };
                    Some((handle.qualified_name().to_string(), location))
                }
                ResolutionResult::Unresolved => None,
            };
            NameResolution {
                name: name.clone(),
                resolved,
            }
        })
        .collect();

    info!(
        "Resolved {} names with {} on-demand parses",
        names.len(),
        resolver.index().parse_count()
    );
    Ok(resolutions)
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let total_millis = elapsed.as_millis();
    let minutes = total_millis / 60_000;
    let seconds = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    if minutes > 0 {
        format!("{minutes}m {seconds}.{millis:03}s")
    } else {
        format!("{seconds}.{millis:03}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::config::AnalysisConfigBuilder;
    use crate::report::ReportKind;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &std::path::Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1_234)), "1.234s");
        assert_eq!(format_elapsed(Duration::from_millis(61_005)), "1m 1.005s");
        assert_eq!(format_elapsed(Duration::ZERO), "0.000s");
    }

    #[test]
    fn test_run_analysis_writes_reports() {
        let sources = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write(sources.path(), "pkg/Foo.java", "package pkg; public class Foo {}");
        write(sources.path(), "pkg/Bar.java", "package pkg; class Bar { Foo foo; }");

        let target = AnalysisTarget::from_sources(
            vec![sources.path().to_path_buf()],
            output.path().to_path_buf(),
            AnalysisConfigBuilder::build(2),
        );
        let mut messages = Vec::new();
        let stats = run_analysis(target, |message| messages.push(message.to_string())).unwrap();

        assert_eq!(stats.files.parsed, 2);
        assert_eq!(stats.files.extracted, 2);
        assert_eq!(stats.rows[&ReportKind::Types].regular, 1);
        assert_eq!(stats.rows[&ReportKind::Definitions].regular, 2);
        assert!(output.path().join("pkg/Bar.java.types.parquet").exists());
        assert!(output.path().join("pkg/Foo.java.def.parquet").exists());
        assert!(!output.path().join("pkg/Bar.java.types.errors.parquet").exists());
        assert!(messages.iter().any(|m| m.starts_with("🎉 Analysis completed")));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let output = TempDir::new().unwrap();
        let target = AnalysisTarget::from_sources(
            vec![PathBuf::from("/definitely/missing/sources")],
            output.path().to_path_buf(),
            AnalysisConfigBuilder::build(1),
        );
        assert!(run_analysis(target, |_| {}).is_err());
    }

    #[test]
    fn test_resolve_names() {
        let sources = TempDir::new().unwrap();
        write(sources.path(), "a/b/C.java", "package a.b; public class C { class D {} }");

        let names = ["a.b.C.D", "java.lang.String", "a.b.Missing"].map(String::from);
        let resolutions =
            resolve_names(&[sources.path().to_path_buf()], &names, IndexOptions::default())
                .unwrap();

        let file = sources.path().canonicalize().unwrap().join("a/b/C.java");
        assert_eq!(
            resolutions[0].resolved,
            Some(("a.b.C.D".to_string(), NameLocation::Source(file)))
        );
        assert_eq!(
            resolutions[1].resolved,
            Some(("java.lang.String".to_string(), NameLocation::External))
        );
        assert_eq!(resolutions[2].resolved, None);
    }
}
