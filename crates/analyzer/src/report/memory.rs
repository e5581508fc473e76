use crate::error::ReportError;
use crate::report::{Category, FactRow, ReportKind, ReportSink, ReportWriter};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

type Reports = BTreeMap<(PathBuf, ReportKind), Vec<FactRow>>;

/// Keeps closed reports in memory, keyed by source path and report kind.
#[derive(Debug, Clone, Default)]
pub struct MemoryReportSink {
    reports: Arc<Mutex<Reports>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Reports> {
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn rows(&self, source: &Path, kind: ReportKind) -> Vec<FactRow> {
        self.lock()
            .get(&(source.to_path_buf(), kind))
            .cloned()
            .unwrap_or_default()
    }

    pub fn rows_in(&self, source: &Path, kind: ReportKind, category: Category) -> Vec<FactRow> {
        self.rows(source, kind)
            .into_iter()
            .filter(|row| row.category() == category)
            .collect()
    }

    pub fn sources(&self) -> Vec<PathBuf> {
        let mut sources: Vec<PathBuf> = self.lock().keys().map(|(path, _)| path.clone()).collect();
        sources.dedup();
        sources
    }

    pub fn snapshot(&self) -> Reports {
        self.lock().clone()
    }
}

impl ReportSink for MemoryReportSink {
    fn open(&self, source: &Path, kind: ReportKind) -> Result<Box<dyn ReportWriter>, ReportError> {
        Ok(Box::new(MemoryReportWriter {
            key: (source.to_path_buf(), kind),
            rows: Vec::new(),
            reports: Arc::clone(&self.reports),
        }))
    }
}

struct MemoryReportWriter {
    key: (PathBuf, ReportKind),
    rows: Vec<FactRow>,
    reports: Arc<Mutex<Reports>>,
}

impl ReportWriter for MemoryReportWriter {
    fn append(&mut self, row: FactRow) -> Result<(), ReportError> {
        self.rows.push(row);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ReportError> {
        let rows = std::mem::take(&mut self.rows);
        self.reports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(self.key.clone(), rows);
        Ok(())
    }
}
