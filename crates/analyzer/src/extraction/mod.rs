//! Fact extraction: one pre-order walk per file, fanned out to the visitors.

pub mod context;
pub mod definitions;
pub mod method_calls;
pub mod types;
pub mod variables;
pub mod walker;


use crate::error::ExtractionError;
use crate::report::{FileReports, ReportCounts, ReportSink};
use crate::resolution::SymbolSolver;
use std::sync::Arc;

pub use context::ExtractionContext;
pub use definitions::DeclarationVisitor;
pub use method_calls::MethodCallVisitor;
pub use types::TypeReferenceVisitor;
pub use variables::VariableDeclarationVisitor;
pub use walker::{FactVisitor, walk};

/// Extract every fact of the solver's unit into `sink`.
///
/// The reports are closed on every path. When the walk fails part-way the
/// rows written so far are still flushed and the error is returned.
pub fn extract_file(
    solver: &SymbolSolver<'_>,
    sink: &dyn ReportSink,
) -> Result<ReportCounts, ExtractionError> {
    let unit = Arc::clone(solver.unit());
    let reports = FileReports::open(sink, unit.path())?;
    let mut context = ExtractionContext::new(solver, reports);

    let visitors: [&dyn FactVisitor; 4] = [
        &TypeReferenceVisitor,
        &VariableDeclarationVisitor,
        &DeclarationVisitor,
        &MethodCallVisitor,
    ];
    walk(&unit, &visitors, &mut context)?;

    Ok(context.finish()?)
}
