//! Fact rows and the sinks that store them.
//!
//! Every analysed file gets one report per [`ReportKind`]. A report has three
//! tables: its regular table, `packages` and `errors`. Rows are appended in
//! traversal order and flushed when the report is closed.

pub mod memory;
pub mod parquet_sink;

use crate::error::ReportError;
use crate::parsing::syntax::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::warn;

pub use memory::MemoryReportSink;
pub use parquet_sink::ParquetReportSink;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Types,
    #[serde(rename = "def")]
    Definitions,
    Lines,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [ReportKind::Types, ReportKind::Definitions, ReportKind::Lines];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Types => "types",
            ReportKind::Definitions => "def",
            ReportKind::Lines => "lines",
        }
    }

    /// Whether `row` may be stored in this kind of report.
    pub fn accepts(&self, row: &FactRow) -> bool {
        match row {
            FactRow::Type { .. } => matches!(self, ReportKind::Types | ReportKind::Definitions),
            FactRow::Call { .. } => matches!(self, ReportKind::Lines),
            FactRow::Package { .. } | FactRow::Error { .. } => true,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Regular,
    Packages,
    Errors,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Regular, Category::Packages, Category::Errors];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Regular => "regular",
            Category::Packages => "packages",
            Category::Errors => "errors",
        }
    }

    /// Infix between the report kind and the file extension.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Category::Regular => None,
            Category::Packages => Some("packages"),
            Category::Errors => Some("errors"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FactRow {
    /// `types` and `def` tables
    Type {
        position: Position,
        type_name: String,
    },
    /// `lines` table. Receiver rows only carry the owner.
    Call {
        position: Position,
        owner: String,
        method: Option<String>,
        argument_types: Option<String>,
        reference: Option<Position>,
    },
    Package {
        position: Position,
        package: String,
        type_name: String,
    },
    Error {
        position: Position,
        node: String,
        error: String,
    },
}

impl FactRow {
    pub fn category(&self) -> Category {
        match self {
            FactRow::Type { .. } | FactRow::Call { .. } => Category::Regular,
            FactRow::Package { .. } => Category::Packages,
            FactRow::Error { .. } => Category::Errors,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            FactRow::Type { position, .. }
            | FactRow::Call { position, .. }
            | FactRow::Package { position, .. }
            | FactRow::Error { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    pub regular: usize,
    pub packages: usize,
    pub errors: usize,
}

impl RowCounts {
    pub fn record(&mut self, category: Category) {
        match category {
            Category::Regular => self.regular += 1,
            Category::Packages => self.packages += 1,
            Category::Errors => self.errors += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.regular + self.packages + self.errors
    }
}

impl AddAssign for RowCounts {
    fn add_assign(&mut self, other: Self) {
        self.regular += other.regular;
        self.packages += other.packages;
        self.errors += other.errors;
    }
}

/// Per-file, per-kind report handle.
pub trait ReportWriter: Send {
    fn append(&mut self, row: FactRow) -> Result<(), ReportError>;

    /// Flush every non-empty table. Called exactly once.
    fn close(&mut self) -> Result<(), ReportError>;
}

pub trait ReportSink: Send + Sync {
    fn open(&self, source: &Path, kind: ReportKind) -> Result<Box<dyn ReportWriter>, ReportError>;
}

/// Scoped report that closes its writer on every exit path.
///
/// `close` reports flush failures to the caller. A report dropped without
/// `close`, for instance because extraction failed part-way, is closed in
/// `Drop` and a failure is logged.
pub struct FileReport {
    writer: Option<Box<dyn ReportWriter>>,
    source: PathBuf,
    kind: ReportKind,
    counts: RowCounts,
}

impl FileReport {
    pub fn open(sink: &dyn ReportSink, source: &Path, kind: ReportKind) -> Result<Self, ReportError> {
        Ok(Self {
            writer: Some(sink.open(source, kind)?),
            source: source.to_path_buf(),
            kind,
            counts: RowCounts::default(),
        })
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn counts(&self) -> RowCounts {
        self.counts
    }

    pub fn append(&mut self, row: FactRow) -> Result<(), ReportError> {
        if !self.kind.accepts(&row) {
            return Err(ReportError::UnexpectedRow {
                kind: self.kind.as_str(),
                category: row.category().as_str(),
            });
        }
        let category = row.category();
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ReportError::Closed(self.source.clone()))?;
        writer.append(row)?;
        self.counts.record(category);
        Ok(())
    }

    pub fn close(mut self) -> Result<RowCounts, ReportError> {
        self.finish()?;
        Ok(self.counts)
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        match self.writer.take() {
            Some(mut writer) => writer.close(),
            None => Ok(()),
        }
    }
}

impl Drop for FileReport {
    fn drop(&mut self) {
        if self.writer.is_some()
            && let Err(e) = self.finish()
        {
            warn!(
                "Failed to close {} report for {}: {e}",
                self.kind.as_str(),
                self.source.display()
            );
        }
    }
}

/// Row counts of every report of one file.
pub type ReportCounts = BTreeMap<ReportKind, RowCounts>;

/// The three reports of one source file.
pub struct FileReports {
    types: FileReport,
    definitions: FileReport,
    lines: FileReport,
}

impl FileReports {
    pub fn open(sink: &dyn ReportSink, source: &Path) -> Result<Self, ReportError> {
        Ok(Self {
            types: FileReport::open(sink, source, ReportKind::Types)?,
            definitions: FileReport::open(sink, source, ReportKind::Definitions)?,
            lines: FileReport::open(sink, source, ReportKind::Lines)?,
        })
    }

    pub fn report_mut(&mut self, kind: ReportKind) -> &mut FileReport {
        match kind {
            ReportKind::Types => &mut self.types,
            ReportKind::Definitions => &mut self.definitions,
            ReportKind::Lines => &mut self.lines,
        }
    }

    pub fn append(&mut self, kind: ReportKind, row: FactRow) -> Result<(), ReportError> {
        self.report_mut(kind).append(row)
    }

    /// Close every report, even when an earlier one fails to flush.
    pub fn close(self) -> Result<ReportCounts, ReportError> {
        let types = self.types.close();
        let definitions = self.definitions.close();
        let lines = self.lines.close();

        Ok(BTreeMap::from([
            (ReportKind::Types, types?),
            (ReportKind::Definitions, definitions?),
            (ReportKind::Lines, lines?),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_row(line: u32, name: &str) -> FactRow {
        FactRow::Type {
            position: Position::new(line, 1),
            type_name: name.to_string(),
        }
    }

    #[test]
    fn test_dropped_report_is_flushed() {
        let sink = MemoryReportSink::new();
        let source = Path::new("/src/pkg/Foo.java");
        {
            let mut report = FileReport::open(&sink, source, ReportKind::Types).unwrap();
            report.append(type_row(1, "pkg.Foo")).unwrap();
            // Dropped without close, as on an early return
        }

        assert_eq!(sink.rows(source, ReportKind::Types), vec![type_row(1, "pkg.Foo")]);
    }

    #[test]
    fn test_counts_by_category() {
        let sink = MemoryReportSink::new();
        let mut report =
            FileReport::open(&sink, Path::new("/src/A.java"), ReportKind::Types).unwrap();
        report.append(type_row(1, "A")).unwrap();
        report
            .append(FactRow::Error {
                position: Position::new(2, 3),
                node: "Missing".to_string(),
                error: "Bad symbol Missing".to_string(),
            })
            .unwrap();

        let counts = report.close().unwrap();
        assert_eq!(
            counts,
            RowCounts {
                regular: 1,
                packages: 0,
                errors: 1
            }
        );
    }

    #[test]
    fn test_rows_must_match_report_kind() {
        let sink = MemoryReportSink::new();
        let mut report =
            FileReport::open(&sink, Path::new("/src/A.java"), ReportKind::Lines).unwrap();

        let err = report.append(type_row(1, "A")).unwrap_err();
        assert!(matches!(err, ReportError::UnexpectedRow { kind: "lines", .. }));
    }
}
