use crate::error::{ExtractionError, ReportError};
use crate::parsing::syntax::{Position, SyntaxUnit, compact_text};
use crate::report::{FactRow, FileReports, ReportCounts, ReportKind};
use crate::resolution::SymbolSolver;
use std::sync::Arc;
use tree_sitter::Node;

/// State shared by the visitors while one file is extracted.
pub struct ExtractionContext<'s, 'r> {
    solver: &'s SymbolSolver<'r>,
    unit: Arc<SyntaxUnit>,
    reports: FileReports,
}

impl<'s, 'r> ExtractionContext<'s, 'r> {
    pub fn new(solver: &'s SymbolSolver<'r>, reports: FileReports) -> Self {
        Self {
            solver,
            unit: Arc::clone(solver.unit()),
            reports,
        }
    }

    pub fn solver(&self) -> &'s SymbolSolver<'r> {
        self.solver
    }

    pub fn unit(&self) -> &SyntaxUnit {
        &self.unit
    }

    pub fn position(&self, node: Node<'_>) -> Position {
        self.unit.position(node)
    }

    /// Source text of `node` on one line.
    pub fn text(&self, node: Node<'_>) -> String {
        compact_text(self.unit.text(node))
    }

    pub fn write(&mut self, kind: ReportKind, row: FactRow) -> Result<(), ExtractionError> {
        Ok(self.reports.append(kind, row)?)
    }

    pub fn write_type(
        &mut self,
        kind: ReportKind,
        node: Node<'_>,
        type_name: impl Into<String>,
    ) -> Result<(), ExtractionError> {
        let position = self.position(node);
        self.write(
            kind,
            FactRow::Type {
                position,
                type_name: type_name.into(),
            },
        )
    }

    pub fn write_package(
        &mut self,
        kind: ReportKind,
        node: Node<'_>,
        package: String,
        type_name: String,
    ) -> Result<(), ExtractionError> {
        let position = self.position(node);
        self.write(
            kind,
            FactRow::Package {
                position,
                package,
                type_name,
            },
        )
    }

    pub fn write_error(
        &mut self,
        kind: ReportKind,
        node: Node<'_>,
        label: String,
        error: impl Into<String>,
    ) -> Result<(), ExtractionError> {
        let position = self.position(node);
        self.write(
            kind,
            FactRow::Error {
                position,
                node: label,
                error: error.into(),
            },
        )
    }

    pub fn finish(self) -> Result<ReportCounts, ReportError> {
        self.reports.close()
    }
}
