use crate::error::ExtractionError;
use crate::extraction::context::ExtractionContext;
use crate::extraction::walker::FactVisitor;
use crate::parsing::syntax::TypeSyntax;
use crate::report::ReportKind;
use crate::resolution::{Resolution, ResolvedType};
use tree_sitter::Node;

/// Reports the type of each field and local variable at its declarator.
/// `var` declarations take the type of their initializer.
pub struct VariableDeclarationVisitor;

impl FactVisitor for VariableDeclarationVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        context: &mut ExtractionContext<'_, '_>,
    ) -> Result<(), ExtractionError> {
        if node.kind() != "variable_declarator" {
            return Ok(());
        }
        let Some(declaration) = node.parent().filter(|parent| {
            matches!(
                parent.kind(),
                "local_variable_declaration" | "field_declaration" | "constant_declaration"
            )
        }) else {
            return Ok(());
        };

        if is_primitive_declaration(declaration, node, context) {
            return Ok(());
        }

        let declarator = context.text(node);
        match context.solver().typed_variable(declaration, node) {
            Resolution::Resolved(ty) => match ty.element() {
                ResolvedType::Reference(handle) => {
                    context.write_type(ReportKind::Types, node, handle.qualified_name())
                }
                ResolvedType::Primitive(_) => Ok(()),
                ResolvedType::TypeVariable(name) => context.write_error(
                    ReportKind::Types,
                    node,
                    format!("Type variables not supported yet: {declarator}"),
                    format!("{name} is a type variable"),
                ),
                other => context.write_error(
                    ReportKind::Types,
                    node,
                    format!("Unresolvable symbol {declarator}"),
                    format!("{} has no declaring type", other.describe()),
                ),
            },
            Resolution::Unresolved(message) => context.write_error(
                ReportKind::Types,
                node,
                format!("Unresolved symbol {declarator}"),
                message,
            ),
            Resolution::Ambiguous(message) | Resolution::Unsupported(message) => context
                .write_error(
                    ReportKind::Types,
                    node,
                    format!("Unresolvable symbol {declarator}"),
                    message,
                ),
        }
    }
}

/// `int x` is skipped up front, `int x[]` is not.
fn is_primitive_declaration(
    declaration: Node<'_>,
    declarator: Node<'_>,
    context: &ExtractionContext<'_, '_>,
) -> bool {
    let declared = declaration
        .child_by_field_name("type")
        .and_then(|ty| TypeSyntax::from_node(ty, &context.unit().source));
    matches!(declared, Some(TypeSyntax::Primitive(_)))
        && declarator.child_by_field_name("dimensions").is_none()
}
