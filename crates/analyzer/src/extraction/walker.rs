use crate::error::ExtractionError;
use crate::extraction::context::ExtractionContext;
use crate::parsing::syntax::{SyntaxUnit, compact_text};
use tree_sitter::Node;

/// A fact visitor is offered every node of the tree in pre-order and writes
/// whatever rows apply to it into the context's reports.
pub trait FactVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        context: &mut ExtractionContext<'_, '_>,
    ) -> Result<(), ExtractionError>;
}

/// Depth-first, pre-order walk over the whole tree of `unit`.
///
/// Every node is handed to each visitor in order before its children are
/// entered. The walk stops at the first ERROR or MISSING node.
pub fn walk(
    unit: &SyntaxUnit,
    visitors: &[&dyn FactVisitor],
    context: &mut ExtractionContext<'_, '_>,
) -> Result<(), ExtractionError> {
    let mut cursor = unit.root().walk();

    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Err(malformed(unit, node));
        }

        for visitor in visitors {
            visitor.visit(node, context)?;
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return Ok(());
            }
        }
    }
}

fn malformed(unit: &SyntaxUnit, node: Node<'_>) -> ExtractionError {
    let position = unit.position(node);
    let kind = if node.is_missing() {
        format!("MISSING {}", node.kind())
    } else {
        node.kind().to_string()
    };
    ExtractionError::MalformedNode {
        kind,
        line: position.line,
        column: position.column,
        text: compact_text(unit.text(node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_java;
    use crate::project::roots::SourceRoots;
    use crate::report::{FileReports, MemoryReportSink};
    use crate::resolution::{IndexOptions, NoExternalTypes, SourceIndex, TypeResolver, UnitStore};
    use std::cell::RefCell;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct KindRecorder {
        kinds: RefCell<Vec<String>>,
    }

    impl FactVisitor for KindRecorder {
        fn visit(
            &self,
            node: Node<'_>,
            _context: &mut ExtractionContext<'_, '_>,
        ) -> Result<(), ExtractionError> {
            if node.is_named() {
                self.kinds.borrow_mut().push(node.kind().to_string());
            }
            Ok(())
        }
    }

    fn run(source: &str) -> (Result<(), ExtractionError>, Vec<String>) {
        let temp_dir = TempDir::new().unwrap();
        let resolver = TypeResolver::new(
            SourceIndex::new(
                SourceRoots::new([temp_dir.path()]).unwrap(),
                UnitStore::new(),
                IndexOptions::default(),
            ),
            Box::new(NoExternalTypes),
        );
        let unit = Arc::new(
            parse_java(Path::new("/src/Walk.java"), source.to_string(), false).unwrap(),
        );
        let solver = resolver.solver(Arc::clone(&unit));
        let sink = MemoryReportSink::new();
        let reports = FileReports::open(&sink, unit.path()).unwrap();
        let mut context = ExtractionContext::new(&solver, reports);

        let recorder = KindRecorder {
            kinds: RefCell::new(Vec::new()),
        };
        let result = walk(&unit, &[&recorder], &mut context);
        (result, recorder.kinds.into_inner())
    }

    #[test]
    fn test_walk_is_pre_order() {
        let (result, kinds) = run("class A { int x; }");
        result.unwrap();

        assert_eq!(
            kinds,
            [
                "program",
                "class_declaration",
                "identifier",
                "class_body",
                "field_declaration",
                "integral_type",
                "variable_declarator",
                "identifier",
            ]
        );
    }

    #[test]
    fn test_error_node_stops_the_walk() {
        let (result, _) = run("class A { void f( { } }");

        assert!(matches!(
            result,
            Err(ExtractionError::MalformedNode { .. })
        ));
    }
}
