use crate::error::ExtractionError;
use crate::extraction::context::ExtractionContext;
use crate::extraction::walker::FactVisitor;
use crate::parsing::syntax::TypeKind;
use crate::report::ReportKind;
use tree_sitter::Node;

/// One `def` row per type declaration, at the start of the declaration.
pub struct DeclarationVisitor;

impl FactVisitor for DeclarationVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        context: &mut ExtractionContext<'_, '_>,
    ) -> Result<(), ExtractionError> {
        if TypeKind::from_node_kind(node.kind()).is_none() {
            return Ok(());
        }

        let declared = context
            .unit()
            .type_declared_at(node.start_byte())
            .map(|index| &context.unit().types[index]);
        let (name, qualified_name) = match declared {
            Some(decl) => (decl.name.clone(), decl.qualified_name.clone()),
            None => {
                let name = node
                    .child_by_field_name("name")
                    .map(|name| context.text(name))
                    .unwrap_or_default();
                (name, None)
            }
        };

        match qualified_name {
            Some(qualified_name) => {
                context.write_type(ReportKind::Definitions, node, qualified_name)
            }
            None => context.write_error(
                ReportKind::Definitions,
                node,
                name.clone(),
                format!("{name} is declared inside a method body and has no qualified name"),
            ),
        }
    }
}
