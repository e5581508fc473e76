use crate::error::ExtractionError;
use crate::extraction::context::ExtractionContext;
use crate::extraction::walker::FactVisitor;
use crate::report::{FactRow, ReportKind};
use crate::resolution::{MethodRef, Resolution};
use tree_sitter::Node;

/// Binds every method invocation to its declaration.
///
/// A resolved call gives a `lines` row at the method name. When the call has
/// a receiver, the receiver's static type gets a row of its own with only the
/// owner set. Either failure becomes an `errors` row and the walk goes on.
pub struct MethodCallVisitor;

impl FactVisitor for MethodCallVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        context: &mut ExtractionContext<'_, '_>,
    ) -> Result<(), ExtractionError> {
        if node.kind() != "method_invocation" {
            return Ok(());
        }

        match context.solver().resolve_call(node) {
            Resolution::Resolved(method) => write_call(node, method, context)?,
            failed => {
                let label = format!("Cannot resolve {}", context.text(node));
                let message = failed.message().unwrap_or_default().to_string();
                context.write_error(ReportKind::Lines, node, label, message)?;
            }
        }

        if let Some(object) = node.child_by_field_name("object") {
            match context.solver().receiver_owner(object) {
                Resolution::Resolved(owner) => {
                    let position = context.position(object);
                    context.write(
                        ReportKind::Lines,
                        FactRow::Call {
                            position,
                            owner,
                            method: None,
                            argument_types: None,
                            reference: None,
                        },
                    )?;
                }
                failed => {
                    let label = format!("Cannot resolve {}", context.text(object));
                    let message = failed.message().unwrap_or_default().to_string();
                    context.write_error(ReportKind::Lines, object, label, message)?;
                }
            }
        }
        Ok(())
    }
}

fn write_call(
    call: Node<'_>,
    method: MethodRef,
    context: &mut ExtractionContext<'_, '_>,
) -> Result<(), ExtractionError> {
    let name = call.child_by_field_name("name").unwrap_or(call);
    let position = context.position(name);
    // External methods have no source position, the call site stands in
    let reference = method.declaration_position.unwrap_or(position);

    context.write(
        ReportKind::Lines,
        FactRow::Call {
            position,
            owner: method.owner,
            method: Some(method.name),
            argument_types: Some(method.parameter_types.join(",")),
            reference: Some(reference),
        },
    )
}

#[cfg(test)]
mod tests {
    use crate::extraction::tests::extract_tree;
    use crate::parsing::syntax::Position;
    use crate::report::{Category, FactRow, ReportKind};

    const FOO: &str = "package pkg;\n\
        public class Foo {\n\
        public static void doThing(int value) {}\n\
        public Foo self() { return this; }\n\
        }\n";

    fn call(line: u32, column: u32, owner: &str, method: &str, args: &str, reference: Position) -> FactRow {
        FactRow::Call {
            position: Position::new(line, column),
            owner: owner.to_string(),
            method: Some(method.to_string()),
            argument_types: Some(args.to_string()),
            reference: Some(reference),
        }
    }

    fn receiver(line: u32, column: u32, owner: &str) -> FactRow {
        FactRow::Call {
            position: Position::new(line, column),
            owner: owner.to_string(),
            method: None,
            argument_types: None,
            reference: None,
        }
    }

    #[test]
    fn test_static_call_and_receiver_rows() {
        let extracted = extract_tree(&[
            ("pkg/Foo.java", FOO),
            (
                "pkg/Bar.java",
                "package pkg;\nclass Bar {\nvoid run() { Foo.doThing(42); }\n}\n",
            ),
        ]);

        let rows = extracted.rows("pkg/Bar.java", ReportKind::Lines);
        assert_eq!(
            rows,
            [
                call(3, 18, "pkg.Foo", "doThing", "int", Position::new(3, 20)),
                receiver(3, 14, "pkg.Foo"),
            ]
        );
    }

    #[test]
    fn test_platform_call_references_call_site() {
        let extracted = extract_tree(&[(
            "pkg/Hello.java",
            "package pkg;\nclass Hello {\nvoid run() { System.out.println(\"hi\"); }\n}\n",
        )]);

        let rows = extracted.rows("pkg/Hello.java", ReportKind::Lines);
        assert_eq!(
            rows[0],
            call(3, 25, "java.io.PrintStream", "println", "java.lang.String", Position::new(3, 25))
        );
        assert_eq!(rows[1], receiver(3, 14, "java.io.PrintStream"));
    }

    #[test]
    fn test_unresolved_call_continues() {
        let extracted = extract_tree(&[
            ("pkg/Foo.java", FOO),
            (
                "pkg/Lost.java",
                "package pkg;\nclass Lost {\nvoid run(Foo foo) { ghost(); foo.self(); }\n}\n",
            ),
        ]);

        let rows = extracted.rows("pkg/Lost.java", ReportKind::Lines);
        let errors: Vec<&FactRow> = rows
            .iter()
            .filter(|row| row.category() == Category::Errors)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            FactRow::Error { node, .. } if node == "Cannot resolve ghost()"
        ));
        assert!(rows.contains(&call(3, 34, "pkg.Foo", "self", "", Position::new(4, 12))));
    }
}
