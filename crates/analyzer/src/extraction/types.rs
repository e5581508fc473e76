use crate::error::ExtractionError;
use crate::extraction::context::ExtractionContext;
use crate::extraction::walker::FactVisitor;
use crate::report::ReportKind;
use crate::resolution::{Resolution, ResolvedType};
use tree_sitter::Node;

/// Writes a `types` row for every class or interface type written in the
/// source, and for every type parameter declaration.
///
/// The declared type of a variable is left to the variable declaration
/// visitor, which reports it at the declarator.
pub struct TypeReferenceVisitor;

impl FactVisitor for TypeReferenceVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        context: &mut ExtractionContext<'_, '_>,
    ) -> Result<(), ExtractionError> {
        if node.kind() == "type_parameter" {
            let text = context.text(node);
            return context.write_type(ReportKind::Types, node, text);
        }
        if !is_type_reference(node, context) || is_declared_variable_type(node) {
            return Ok(());
        }

        let text = context.text(node);
        match context.solver().resolve_type_node(node) {
            Resolution::Resolved(ResolvedType::Reference(handle)) => {
                context.write_type(ReportKind::Types, node, handle.qualified_name())
            }
            Resolution::Resolved(ResolvedType::TypeVariable(name)) => context.write_error(
                ReportKind::Types,
                node,
                format!("Unresolvable symbol {text}"),
                format!("{name} is a type variable"),
            ),
            Resolution::Resolved(other) => context.write_error(
                ReportKind::Types,
                node,
                format!("Unresolvable symbol {text}"),
                format!("{} is not a class or interface type", other.describe()),
            ),
            Resolution::Unresolved(message) => match resolvable_enclosing_type(node, context) {
                Some(type_name) => context.write_package(ReportKind::Types, node, text, type_name),
                None => context.write_error(
                    ReportKind::Types,
                    node,
                    format!("Bad symbol {text}"),
                    message,
                ),
            },
            Resolution::Ambiguous(message) | Resolution::Unsupported(message) => context
                .write_error(
                    ReportKind::Types,
                    node,
                    format!("Unresolvable symbol {text}"),
                    message,
                ),
        }
    }
}

/// Whether `node` is a class type reference on its own.
///
/// In `a.b.C<D>` the references are `a`, `a.b`, `a.b.C<D>` and `D`. The name
/// part of a scoped type and the base of a generic type are covered by the
/// enclosing node.
fn is_type_reference(node: Node<'_>, context: &ExtractionContext<'_, '_>) -> bool {
    let parent = node.parent();
    let parent_kind = parent.map(|p| p.kind());

    match node.kind() {
        "generic_type" => true,
        "scoped_type_identifier" => parent_kind != Some("generic_type"),
        "type_identifier" => {
            if context.unit().text(node) == "var" {
                return false;
            }
            match (parent, parent_kind) {
                (_, Some("generic_type" | "type_parameter")) => false,
                (Some(parent), Some("scoped_type_identifier")) => {
                    parent.child_by_field_name("name") != Some(node)
                        && last_named_child(parent) != Some(node)
                }
                _ => true,
            }
        }
        _ => false,
    }
}

/// Whether `node` is the whole declared type of a field or local variable,
/// possibly wrapped in array dimensions or annotations.
pub(crate) fn is_declared_variable_type(node: Node<'_>) -> bool {
    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "array_type" | "annotated_type" => current = parent,
            "local_variable_declaration" | "field_declaration" | "constant_declaration" => {
                return parent.child_by_field_name("type") == Some(current);
            }
            _ => return false,
        }
    }
    false
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).last()
}

/// Walk up through the scoped and generic types that contain `node` and
/// return the qualified name of the first one that resolves.
fn resolvable_enclosing_type(
    node: Node<'_>,
    context: &ExtractionContext<'_, '_>,
) -> Option<String> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if !matches!(ancestor.kind(), "scoped_type_identifier" | "generic_type") {
            return None;
        }
        if let Resolution::Resolved(ResolvedType::Reference(handle)) =
            context.solver().resolve_type_node(ancestor)
        {
            return Some(handle.qualified_name().to_string());
        }
        current = ancestor.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::extraction::tests::{Extracted, extract_tree};
    use crate::report::{Category, FactRow, ReportKind};

    fn types(extracted: &Extracted, file: &str) -> Vec<FactRow> {
        extracted.rows(file, ReportKind::Types)
    }

    fn names(rows: &[FactRow], category: Category) -> Vec<String> {
        rows.iter()
            .filter(|row| row.category() == category)
            .map(|row| match row {
                FactRow::Type { type_name, .. } => type_name.clone(),
                FactRow::Package {
                    package, type_name, ..
                } => format!("{package} -> {type_name}"),
                FactRow::Error { node, .. } => node.clone(),
                FactRow::Call { owner, .. } => owner.clone(),
            })
            .collect()
    }

    #[test]
    fn test_field_type_is_reported_once() {
        let extracted = extract_tree(&[
            ("pkg/Foo.java", "package pkg; public class Foo {}"),
            ("pkg/Bar.java", "package pkg; public class Bar { Foo foo; Foo[] many; }"),
        ]);

        let rows = types(&extracted, "pkg/Bar.java");
        assert_eq!(names(&rows, Category::Regular), ["pkg.Foo", "pkg.Foo"]);
        assert!(names(&rows, Category::Errors).is_empty());
    }

    #[test]
    fn test_parameter_and_creation_types() {
        let extracted = extract_tree(&[
            ("pkg/Foo.java", "package pkg; public class Foo {}"),
            (
                "pkg/Make.java",
                "package pkg; class Make { Object make(Foo seed) { return new Foo(); } }",
            ),
        ]);

        let rows = types(&extracted, "pkg/Make.java");
        assert_eq!(
            names(&rows, Category::Regular),
            ["java.lang.Object", "pkg.Foo", "pkg.Foo"]
        );
    }

    #[test]
    fn test_qualifiers_fall_back_to_enclosing_type() {
        let extracted = extract_tree(&[
            ("a/b/C.java", "package a.b; public class C {}"),
            ("pkg/Use.java", "package pkg; class Use { void f(a.b.C c) {} }"),
        ]);

        let rows = types(&extracted, "pkg/Use.java");
        assert_eq!(
            names(&rows, Category::Packages),
            ["a.b -> a.b.C", "a -> a.b.C"]
        );
        assert_eq!(names(&rows, Category::Regular), ["a.b.C"]);
        assert!(names(&rows, Category::Errors).is_empty());
    }

    #[test]
    fn test_unknown_type_is_one_error() {
        let extracted = extract_tree(&[(
            "pkg/Lost.java",
            "package pkg; class Lost { void f() { Missing.call(); } Unknown u; }",
        )]);

        let rows = types(&extracted, "pkg/Lost.java");
        assert!(names(&rows, Category::Regular).is_empty());
        assert_eq!(names(&rows, Category::Errors), ["Unresolved symbol u"]);
    }

    #[test]
    fn test_generic_types_and_type_parameters() {
        let extracted = extract_tree(&[(
            "pkg/Box.java",
            "package pkg; import java.util.List;\n\
             class Box<T extends Comparable<T>> { List<String> items; }",
        )]);

        let rows = types(&extracted, "pkg/Box.java");
        assert_eq!(
            names(&rows, Category::Regular),
            [
                "T extends Comparable<T>",
                "java.lang.Comparable",
                "java.lang.String",
                "java.util.List",
            ]
        );
        assert_eq!(names(&rows, Category::Errors), ["Unresolvable symbol T"]);
    }
}
