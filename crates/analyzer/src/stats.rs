use crate::execution::executor::AnalysisResult;
use crate::report::{ReportKind, RowCounts};
use crate::resolution::CacheSizes;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsMetadata {
    pub jxref_version: String,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub source_roots: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileStatistics {
    pub discovered: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub parse_errors: usize,
    pub extracted: usize,
    pub extraction_failures: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub parse_seconds: f64,
    pub extract_seconds: f64,
    pub total_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub metadata: StatisticsMetadata,
    pub files: FileStatistics,
    pub rows: BTreeMap<ReportKind, RowCounts>,
    pub durations: PhaseDurations,
    pub cache_sizes: CacheSizes,
    pub on_demand_parses: usize,
}

impl RunStatistics {
    pub fn new(
        name: String,
        source_roots: Vec<PathBuf>,
        output_dir: PathBuf,
        result: &AnalysisResult,
        total_seconds: f64,
    ) -> Self {
        let mut rows = result.row_counts();
        for kind in ReportKind::ALL {
            rows.entry(kind).or_default();
        }

        Self {
            metadata: StatisticsMetadata {
                jxref_version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now(),
                name,
                source_roots,
                output_dir,
            },
            files: FileStatistics {
                discovered: result.files_discovered,
                parsed: result.files_parsed,
                skipped: result.skipped_files.len(),
                parse_errors: result.errored_files.len(),
                extracted: result.files_extracted(),
                extraction_failures: result.extraction_failures(),
            },
            rows,
            durations: PhaseDurations {
                parse_seconds: result.parse_duration.as_secs_f64(),
                extract_seconds: result.extract_duration.as_secs_f64(),
                total_seconds,
            },
            cache_sizes: result.cache_sizes,
            on_demand_parses: result.on_demand_parses,
        }
    }

    pub fn export_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files = &self.files;
        writeln!(f, "📊 {}", self.metadata.name)?;
        writeln!(
            f,
            "  • Files: {} discovered, {} parsed, {} skipped, {} parse errors",
            files.discovered, files.parsed, files.skipped, files.parse_errors
        )?;
        writeln!(
            f,
            "  • Extraction: {} files, {} failed",
            files.extracted, files.extraction_failures
        )?;
        for (kind, counts) in &self.rows {
            writeln!(
                f,
                "  • {}: {} rows, {} packages, {} errors",
                kind.as_str(),
                counts.regular,
                counts.packages,
                counts.errors
            )?;
        }
        write!(
            f,
            "  • Index: {} files, {} directories, {} names cached, {} on-demand parses",
            self.cache_sizes.files,
            self.cache_sizes.directories,
            self.cache_sizes.names,
            self.on_demand_parses
        )
    }
}
