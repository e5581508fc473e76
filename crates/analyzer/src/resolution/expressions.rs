//! Static types of expressions.

use crate::parsing::declarations::formal_parameters;
use crate::parsing::syntax::{TypeSyntax, compact_text, count_dimensions};
use crate::resolution::symbols::{Scope, SymbolSolver};
use crate::resolution::types::{DeclarationHandle, Primitive, Resolution, ResolvedType};
use std::sync::Arc;
use tree_sitter::Node;

/// What the object of a member access denotes.
#[derive(Debug, Clone, PartialEq)]
pub enum Receiver {
    Value(ResolvedType),
    /// A type name, so members are accessed statically
    Type(DeclarationHandle),
}

impl SymbolSolver<'_> {
    pub fn expression_type(&self, node: Node<'_>) -> Resolution<ResolvedType> {
        match node.kind() {
            "identifier" | "field_access" => match self.receiver(node) {
                Resolution::Resolved(Receiver::Value(ty)) => Resolution::Resolved(ty),
                Resolution::Resolved(Receiver::Type(handle)) => Resolution::Unresolved(format!(
                    "{} denotes a type, not a value",
                    handle.qualified_name()
                )),
                Resolution::Unresolved(message) => Resolution::Unresolved(message),
                Resolution::Ambiguous(message) => Resolution::Ambiguous(message),
                Resolution::Unsupported(message) => Resolution::Unsupported(message),
            },
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal" => {
                let text = self.unit.text(node);
                primitive(if text.ends_with(['l', 'L']) {
                    Primitive::Long
                } else {
                    Primitive::Int
                })
            }
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                let text = self.unit.text(node);
                primitive(if text.ends_with(['f', 'F']) {
                    Primitive::Float
                } else {
                    Primitive::Double
                })
            }
            "true" | "false" => primitive(Primitive::Boolean),
            "character_literal" => primitive(Primitive::Char),
            "string_literal" | "text_block" => self.reference_named("java.lang.String"),
            "null_literal" => Resolution::Resolved(ResolvedType::Null),
            "this" => match self.enclosing_handle(node.start_byte()) {
                Some(handle) => Resolution::Resolved(ResolvedType::Reference(handle)),
                None => Resolution::Unresolved("this outside of a type".to_string()),
            },
            "super" => self.super_type(node),
            "parenthesized_expression" => match node.named_child(0) {
                Some(inner) => self.expression_type(inner),
                None => Resolution::Unresolved("Empty parentheses".to_string()),
            },
            "method_invocation" => self.call_return_type(node),
            "object_creation_expression" | "cast_expression" => {
                match node.child_by_field_name("type") {
                    Some(ty) => self.resolve_type_node(ty),
                    None => Resolution::Unresolved(format!(
                        "Missing type in {}",
                        compact_text(self.unit.text(node))
                    )),
                }
            }
            "array_access" => {
                let Some(array) = node.child_by_field_name("array") else {
                    return Resolution::Unresolved("Missing array".to_string());
                };
                self.expression_type(array).and_then(|ty| match ty {
                    ResolvedType::Array(component) => Resolution::Resolved(*component),
                    other => Resolution::Unresolved(format!(
                        "{} is not an array",
                        other.describe()
                    )),
                })
            }
            "array_creation_expression" => self.array_creation_type(node),
            "ternary_expression" => self.ternary_type(node),
            "unary_expression" => self.unary_type(node),
            "update_expression" => match node.named_child(0) {
                Some(operand) => self.expression_type(operand),
                None => Resolution::Unresolved("Missing operand".to_string()),
            },
            "binary_expression" => self.binary_type(node),
            "assignment_expression" => match node.child_by_field_name("left") {
                Some(left) => self.expression_type(left),
                None => Resolution::Unresolved("Missing assignment target".to_string()),
            },
            "instanceof_expression" => primitive(Primitive::Boolean),
            "class_literal" => self.reference_named("java.lang.Class"),
            "lambda_expression" => {
                Resolution::Unsupported("Lambda expressions are not typed".to_string())
            }
            "method_reference" => {
                Resolution::Unsupported("Method references are not typed".to_string())
            }
            kind => Resolution::Unsupported(format!("Unsupported expression {kind}")),
        }
    }

    /// Resolve the object of a member access, which may be a value or a type
    /// name used as a static receiver.
    pub fn receiver(&self, node: Node<'_>) -> Resolution<Receiver> {
        match node.kind() {
            "identifier" => {
                let name = self.unit.text(node);
                if let Some(variable) = self.variable_type(node, name) {
                    return variable.map(Receiver::Value);
                }
                self.type_receiver(node)
            }
            "field_access" => self.field_access_receiver(node),
            "scoped_identifier" | "type_identifier" => self.type_receiver(node),
            _ => self.expression_type(node).map(Receiver::Value),
        }
    }

    fn type_receiver(&self, node: Node<'_>) -> Resolution<Receiver> {
        let name: String = self
            .unit
            .text(node)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        match self.resolve_name_at(&name, node.start_byte()) {
            Resolution::Resolved(ResolvedType::Reference(handle)) => {
                Resolution::Resolved(Receiver::Type(handle))
            }
            Resolution::Resolved(other) => Resolution::Unsupported(format!(
                "Type variables not supported yet: {}",
                other.describe()
            )),
            Resolution::Ambiguous(message) => Resolution::Ambiguous(message),
            _ => Resolution::Unresolved(format!("Unsolved symbol : {name}")),
        }
    }

    fn field_access_receiver(&self, node: Node<'_>) -> Resolution<Receiver> {
        let (Some(object), Some(field)) = (
            node.child_by_field_name("object"),
            node.child_by_field_name("field"),
        ) else {
            return Resolution::Unresolved(format!(
                "Malformed access {}",
                compact_text(self.unit.text(node))
            ));
        };
        let field_name = self.unit.text(field);

        // Outer.this
        if field.kind() == "this" {
            return match self.type_receiver(object) {
                Resolution::Resolved(Receiver::Type(handle)) => {
                    Resolution::Resolved(Receiver::Value(ResolvedType::Reference(handle)))
                }
                other => other,
            };
        }

        match self.receiver(object) {
            Resolution::Resolved(Receiver::Value(ty)) => self
                .member_value(&ty, field_name)
                .map(Receiver::Value),
            Resolution::Resolved(Receiver::Type(owner)) => {
                match self.field_type(&owner, field_name) {
                    Some(field) => field.map(Receiver::Value),
                    None => match self.member_type(&owner, field_name) {
                        Some(member) => Resolution::Resolved(Receiver::Type(member)),
                        None => Resolution::Unresolved(format!(
                            "Unsolved symbol : {}.{field_name}",
                            owner.qualified_name()
                        )),
                    },
                }
            }
            // `a.b.C` where `a` is a package
            failure if is_name_chain(object) => match self.type_receiver(node) {
                Resolution::Resolved(receiver) => Resolution::Resolved(receiver),
                _ => failure,
            },
            failure => failure,
        }
    }

    fn member_value(&self, ty: &ResolvedType, name: &str) -> Resolution<ResolvedType> {
        match ty {
            ResolvedType::Array(_) if name == "length" => primitive(Primitive::Int),
            ResolvedType::Reference(owner) => match self.field_type(owner, name) {
                Some(field) => field,
                None => Resolution::Unresolved(format!(
                    "Unsolved symbol : {}.{name}",
                    owner.qualified_name()
                )),
            },
            ResolvedType::TypeVariable(variable) => Resolution::Unsupported(format!(
                "Type variables not supported yet: {variable}.{name}"
            )),
            other => Resolution::Unresolved(format!(
                "No field {name} in {}",
                other.describe()
            )),
        }
    }

    /// Type of a local variable, parameter or field visible from `node`.
    /// `None` when no variable of that name is in scope.
    pub fn variable_type(
        &self,
        node: Node<'_>,
        name: &str,
    ) -> Option<Resolution<ResolvedType>> {
        let mut current = node;
        while let Some(parent) = current.parent() {
            if let Some(found) = self.declared_in(parent, current, name) {
                return Some(found);
            }
            current = parent;
        }

        self.statically_imported_field(name)
    }

    /// Declarations introduced by `scope` that are visible to its child `from`.
    fn declared_in(
        &self,
        scope: Node<'_>,
        from: Node<'_>,
        name: &str,
    ) -> Option<Resolution<ResolvedType>> {
        match scope.kind() {
            "block" | "constructor_body" | "switch_block_statement_group" | "switch_rule" => {
                let mut cursor = scope.walk();
                let earlier: Vec<Node<'_>> = scope
                    .named_children(&mut cursor)
                    .take_while(|child| child.end_byte() <= from.start_byte())
                    .collect();
                earlier
                    .into_iter()
                    .rev()
                    .filter(|child| child.kind() == "local_variable_declaration")
                    .find_map(|declaration| self.declarator_named(declaration, name))
            }
            "for_statement" => {
                let mut cursor = scope.walk();
                let inits: Vec<Node<'_>> = scope
                    .children_by_field_name("init", &mut cursor)
                    .filter(|init| init.kind() == "local_variable_declaration")
                    .collect();
                inits
                    .into_iter()
                    .find_map(|declaration| self.declarator_named(declaration, name))
            }
            "enhanced_for_statement" => {
                let variable = scope.child_by_field_name("name")?;
                if self.unit.text(variable) != name
                    || scope.child_by_field_name("value") == Some(from)
                {
                    return None;
                }
                Some(self.enhanced_for_variable(scope))
            }
            "catch_clause" => {
                let mut cursor = scope.walk();
                let parameter = scope
                    .named_children(&mut cursor)
                    .find(|child| child.kind() == "catch_formal_parameter")?;
                let variable = parameter.child_by_field_name("name")?;
                if self.unit.text(variable) != name {
                    return None;
                }
                let mut inner = parameter.walk();
                let caught = parameter
                    .named_children(&mut inner)
                    .find(|child| child.kind() == "catch_type")?
                    .named_child(0)?;
                Some(self.resolve_type_node(caught))
            }
            "try_with_resources_statement" => {
                let resources = scope.child_by_field_name("resources")?;
                let mut cursor = resources.walk();
                let found = resources
                    .named_children(&mut cursor)
                    .filter(|resource| resource.kind() == "resource")
                    .find(|resource| {
                        resource
                            .child_by_field_name("name")
                            .is_some_and(|n| self.unit.text(n) == name)
                    });
                found.map(|resource| self.typed_variable(resource, resource))
            }
            "method_declaration" | "constructor_declaration" => {
                let parameters = scope.child_by_field_name("parameters")?;
                self.parameter_named(scope, parameters, name)
            }
            "lambda_expression" => {
                let parameters = scope.child_by_field_name("parameters")?;
                match parameters.kind() {
                    "identifier" if self.unit.text(parameters) == name => Some(
                        Resolution::Unsupported(format!("Lambda parameter {name} is not typed")),
                    ),
                    "inferred_parameters" => {
                        let mut cursor = parameters.walk();
                        let declared = parameters
                            .named_children(&mut cursor)
                            .any(|p| self.unit.text(p) == name);
                        declared.then(|| {
                            Resolution::Unsupported(format!(
                                "Lambda parameter {name} is not typed"
                            ))
                        })
                    }
                    "formal_parameters" => self.parameter_named(scope, parameters, name),
                    _ => None,
                }
            }
            kind if kind.ends_with("_declaration") && scope.child_by_field_name("body").is_some() => {
                let index = self.unit.type_declared_at(scope.start_byte())?;
                let owner = DeclarationHandle::Source {
                    unit: Arc::clone(&self.unit),
                    index,
                };
                self.field_type(&owner, name)
            }
            // Anonymous class bodies see the fields of their supertype
            "class_body" if scope.parent().is_some_and(|p| p.kind() == "object_creation_expression") => {
                let created = scope.parent()?.child_by_field_name("type")?;
                match self.resolve_type_node(created) {
                    Resolution::Resolved(ResolvedType::Reference(owner)) => {
                        self.field_type(&owner, name)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn declarator_named(
        &self,
        declaration: Node<'_>,
        name: &str,
    ) -> Option<Resolution<ResolvedType>> {
        let mut cursor = declaration.walk();
        let declarator = declaration
            .children_by_field_name("declarator", &mut cursor)
            .find(|declarator| {
                declarator
                    .child_by_field_name("name")
                    .is_some_and(|n| self.unit.text(n) == name)
            })?;
        Some(self.typed_variable(declaration, declarator))
    }

    /// Type of a declarator whose declared type lives on `declaration`.
    /// `var` takes the type of the initializer.
    pub(crate) fn typed_variable(
        &self,
        declaration: Node<'_>,
        declarator: Node<'_>,
    ) -> Resolution<ResolvedType> {
        let Some(type_node) = declaration.child_by_field_name("type") else {
            return Resolution::Unresolved(format!(
                "Missing type in {}",
                compact_text(self.unit.text(declaration))
            ));
        };
        let Some(syntax) = TypeSyntax::from_node(type_node, &self.unit.source) else {
            return Resolution::Unresolved(format!(
                "Unsolved symbol : {}",
                compact_text(self.unit.text(type_node))
            ));
        };

        if syntax == TypeSyntax::Inferred {
            return match declarator.child_by_field_name("value") {
                Some(value) => self.expression_type(value),
                None => Resolution::Unsupported(
                    "Cannot resolve var without an initializer".to_string(),
                ),
            };
        }

        let dimensions = declarator
            .child_by_field_name("dimensions")
            .map(|dims| count_dimensions(dims, &self.unit.source))
            .unwrap_or(0);
        let unit = Arc::clone(&self.unit);
        self.resolve_syntax(
            &Scope::at(&unit, type_node.start_byte()),
            &syntax.with_dimensions(dimensions),
        )
    }

    fn parameter_named(
        &self,
        owner: Node<'_>,
        parameters: Node<'_>,
        name: &str,
    ) -> Option<Resolution<ResolvedType>> {
        let (declared, _) = formal_parameters(parameters, &self.unit.source);
        let parameter = declared.into_iter().find(|p| p.name == name)?;
        let unit = Arc::clone(&self.unit);
        Some(self.resolve_syntax(&Scope::at(&unit, owner.start_byte()), &parameter.ty))
    }

    fn enhanced_for_variable(&self, statement: Node<'_>) -> Resolution<ResolvedType> {
        let Some(type_node) = statement.child_by_field_name("type") else {
            return Resolution::Unresolved("Missing loop variable type".to_string());
        };
        match TypeSyntax::from_node(type_node, &self.unit.source) {
            Some(TypeSyntax::Inferred) => {
                let Some(value) = statement.child_by_field_name("value") else {
                    return Resolution::Unresolved("Missing loop value".to_string());
                };
                self.expression_type(value).and_then(|iterated| match iterated {
                    ResolvedType::Array(component) => Resolution::Resolved(*component),
                    other => Resolution::Unsupported(format!(
                        "Cannot infer element type of {}",
                        other.describe()
                    )),
                })
            }
            Some(syntax) => {
                let dimensions = statement
                    .child_by_field_name("dimensions")
                    .map(|dims| count_dimensions(dims, &self.unit.source))
                    .unwrap_or(0);
                let unit = Arc::clone(&self.unit);
                self.resolve_syntax(
                    &Scope::at(&unit, type_node.start_byte()),
                    &syntax.with_dimensions(dimensions),
                )
            }
            None => Resolution::Unresolved(format!(
                "Unsolved symbol : {}",
                self.unit.text(type_node)
            )),
        }
    }

    fn statically_imported_field(&self, name: &str) -> Option<Resolution<ResolvedType>> {
        let imports = self.unit.imports.iter().filter(|import| import.is_static);
        for import in imports {
            let owner = if import.on_demand {
                Some(import.path.as_str())
            } else if import.simple_name() == name {
                import.container()
            } else {
                None
            };
            if let Some(owner) = owner
                && let Some(handle) = self.resolver.solve_type(owner).into_handle()
                && let Some(field) = self.field_type(&handle, name)
            {
                return Some(field);
            }
        }
        None
    }

    fn super_type(&self, node: Node<'_>) -> Resolution<ResolvedType> {
        let Some(enclosing) = self.enclosing_handle(node.start_byte()) else {
            return Resolution::Unresolved("super outside of a type".to_string());
        };
        match self.direct_supertypes(&enclosing).first() {
            Some(superclass) => Resolution::Resolved(ResolvedType::Reference(superclass.clone())),
            None => Resolution::Unresolved(format!(
                "No superclass of {}",
                enclosing.qualified_name()
            )),
        }
    }

    fn array_creation_type(&self, node: Node<'_>) -> Resolution<ResolvedType> {
        let Some(type_node) = node.child_by_field_name("type") else {
            return Resolution::Unresolved("Missing array element type".to_string());
        };
        let mut dimensions = 0;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "dimensions_expr" => dimensions += 1,
                "dimensions" => dimensions += count_dimensions(child, &self.unit.source),
                _ => {}
            }
        }
        self.resolve_type_node(type_node)
            .map(|element| ResolvedType::array_of(element, dimensions.max(1)))
    }

    fn ternary_type(&self, node: Node<'_>) -> Resolution<ResolvedType> {
        let (Some(consequence), Some(alternative)) = (
            node.child_by_field_name("consequence"),
            node.child_by_field_name("alternative"),
        ) else {
            return Resolution::Unresolved("Malformed conditional".to_string());
        };

        let first = match self.expression_type(consequence) {
            Resolution::Resolved(ResolvedType::Null) => return self.expression_type(alternative),
            Resolution::Resolved(first) => first,
            failed => return failed,
        };
        match self.expression_type(alternative) {
            Resolution::Resolved(second) => {
                match (numeric(&first), numeric(&second)) {
                    (Some(left), Some(right))
                        if left != right
                            && (matches!(first, ResolvedType::Primitive(_))
                                || matches!(second, ResolvedType::Primitive(_))) =>
                    {
                        primitive(Primitive::promote(left, right))
                    }
                    _ => Resolution::Resolved(first),
                }
            }
            _ => Resolution::Resolved(first),
        }
    }

    fn unary_type(&self, node: Node<'_>) -> Resolution<ResolvedType> {
        let operator = node
            .child_by_field_name("operator")
            .map(|op| self.unit.text(op))
            .unwrap_or_default();
        if operator == "!" {
            return primitive(Primitive::Boolean);
        }
        let Some(operand) = node.child_by_field_name("operand") else {
            return Resolution::Unresolved("Missing operand".to_string());
        };
        self.expression_type(operand)
            .and_then(|ty| match numeric(&ty) {
                Some(p) => primitive(Primitive::promote(p, p)),
                None => Resolution::Unresolved(format!(
                    "Bad operand type {} for {operator}",
                    ty.describe()
                )),
            })
    }

    fn binary_type(&self, node: Node<'_>) -> Resolution<ResolvedType> {
        let operator = node
            .child_by_field_name("operator")
            .map(|op| self.unit.text(op))
            .unwrap_or_default();
        if matches!(
            operator,
            "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||"
        ) {
            return primitive(Primitive::Boolean);
        }

        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return Resolution::Unresolved("Malformed binary expression".to_string());
        };

        let left = self.expression_type(left);
        if operator == "+" {
            if let Resolution::Resolved(ty) = &left
                && ty.is_qualified("java.lang.String")
            {
                return left;
            }
            let right = self.expression_type(right);
            if let Resolution::Resolved(ty) = &right
                && ty.is_qualified("java.lang.String")
            {
                return right;
            }
            return left.and_then(|l| right.and_then(|r| promoted(&l, &r, operator)));
        }

        let left = match left {
            Resolution::Resolved(left) => left,
            failed => return failed,
        };
        match operator {
            "<<" | ">>" | ">>>" => match numeric(&left) {
                Some(p) => primitive(Primitive::promote(p, p)),
                None => Resolution::Unresolved(format!("Bad shift operand {}", left.describe())),
            },
            "&" | "|" | "^"
                if matches!(left, ResolvedType::Primitive(Primitive::Boolean))
                    || left.is_qualified("java.lang.Boolean") =>
            {
                primitive(Primitive::Boolean)
            }
            _ => self
                .expression_type(right)
                .and_then(|right| promoted(&left, &right, operator)),
        }
    }

    fn reference_named(&self, qualified_name: &str) -> Resolution<ResolvedType> {
        match self.resolver.solve_type(qualified_name).into_handle() {
            Some(handle) => Resolution::Resolved(ResolvedType::Reference(handle)),
            None => Resolution::Unresolved(format!("Unsolved symbol : {qualified_name}")),
        }
    }
}

fn primitive(primitive: Primitive) -> Resolution<ResolvedType> {
    Resolution::Resolved(ResolvedType::Primitive(primitive))
}

/// Primitive value of a type after unboxing.
fn numeric(ty: &ResolvedType) -> Option<Primitive> {
    match ty {
        ResolvedType::Primitive(primitive) => Some(*primitive),
        ResolvedType::Reference(handle) => Primitive::unboxed(handle.qualified_name()),
        _ => None,
    }
}

fn promoted(left: &ResolvedType, right: &ResolvedType, operator: &str) -> Resolution<ResolvedType> {
    match (numeric(left), numeric(right)) {
        (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => {
            primitive(Primitive::promote(l, r))
        }
        _ => Resolution::Unresolved(format!(
            "Bad operand types {} {operator} {}",
            left.describe(),
            right.describe()
        )),
    }
}

fn is_name_chain(node: Node<'_>) -> bool {
    match node.kind() {
        "identifier" => true,
        "field_access" => node.child_by_field_name("object").is_some_and(is_name_chain),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::syntax::SyntaxUnit;
    use crate::project::roots::SourceRoots;
    use crate::resolution::external::PlatformTypes;
    use crate::resolution::index::{IndexOptions, SourceIndex};
    use crate::resolution::resolver::TypeResolver;
    use crate::resolution::store::UnitStore;
    use std::fs;
    use tempfile::TempDir;

    fn setup(source: &str) -> (TempDir, TypeResolver, Arc<SyntaxUnit>) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/Main.java"), source).unwrap();
        fs::write(
            dir.path().join("pkg/Point.java"),
            "package pkg; public class Point { public int x; public static Point ORIGIN; }",
        )
        .unwrap();

        let roots = SourceRoots::new([dir.path()]).unwrap();
        let path = roots.iter().next().unwrap().join("pkg/Main.java");
        let index = SourceIndex::new(roots, UnitStore::new(), IndexOptions::default());
        let resolver = TypeResolver::new(index, Box::new(PlatformTypes::jdk()));
        let unit = resolver.index().unit_for_file(&path).unwrap();
        (dir, resolver, unit)
    }

    /// Type of the initializer of the variable declared as `name`.
    fn initializer_type(source: &str, name: &str) -> String {
        let (_dir, resolver, unit) = setup(source);
        let solver = resolver.solver(Arc::clone(&unit));
        let needle = format!("{name} = ");
        let start = unit.source.find(&needle).unwrap() + needle.len();
        let node = unit
            .root()
            .named_descendant_for_byte_range(start, start)
            .unwrap();
        // Climb to the full initializer expression
        let mut expression = node;
        while let Some(parent) = expression.parent() {
            if parent.kind() == "variable_declarator" {
                break;
            }
            expression = parent;
        }
        match solver.expression_type(expression) {
            Resolution::Resolved(ty) => ty.describe(),
            other => format!("error: {}", other.message().unwrap_or_default()),
        }
    }

    #[test]
    fn test_literals_and_operators() {
        let source = "package pkg; class Main { void m() {\n\
            var a = 1L + 2;\n\
            var b = \"n=\" + 3;\n\
            var c = 1 < 2;\n\
            var d = 'c' + 1;\n\
            var e = 2.0f * 3;\n\
            var f = !c;\n\
            } }";
        assert_eq!(initializer_type(source, "a"), "long");
        assert_eq!(initializer_type(source, "b"), "java.lang.String");
        assert_eq!(initializer_type(source, "c"), "boolean");
        assert_eq!(initializer_type(source, "d"), "int");
        assert_eq!(initializer_type(source, "e"), "float");
        assert_eq!(initializer_type(source, "f"), "boolean");
    }

    #[test]
    fn test_variables_fields_and_static_receivers() {
        let source = "package pkg; class Main { Point p; int[] values;\n\
            void m(Point q) {\n\
            var a = q.x;\n\
            var b = Point.ORIGIN;\n\
            var c = this.p;\n\
            var d = values[0];\n\
            var e = values.length;\n\
            var f = new Point[2][];\n\
            var g = (Object) q;\n\
            var h = System.out;\n\
            } }";
        assert_eq!(initializer_type(source, "a"), "int");
        assert_eq!(initializer_type(source, "b"), "pkg.Point");
        assert_eq!(initializer_type(source, "c"), "pkg.Point");
        assert_eq!(initializer_type(source, "d"), "int");
        assert_eq!(initializer_type(source, "e"), "int");
        assert_eq!(initializer_type(source, "f"), "pkg.Point[][]");
        assert_eq!(initializer_type(source, "g"), "java.lang.Object");
        assert_eq!(initializer_type(source, "h"), "java.io.PrintStream");
    }

    #[test]
    fn test_scoped_locals() {
        let source = "package pkg; class Main { void m(String[] args) {\n\
            for (String arg : args) { var a = arg; }\n\
            try { } catch (IllegalStateException ex) { var b = ex; }\n\
            for (int i = 0; i < 1; i++) { var c = i; }\n\
            } }";
        assert_eq!(initializer_type(source, "a"), "java.lang.String");
        assert_eq!(initializer_type(source, "b"), "java.lang.IllegalStateException");
        assert_eq!(initializer_type(source, "c"), "int");
    }

    #[test]
    fn test_lambdas_are_unsupported() {
        let source = "package pkg; class Main { void m() { Runnable r = () -> {}; var a = r; var b = () -> 1; } }";
        assert_eq!(initializer_type(source, "a"), "java.lang.Runnable");
        assert_eq!(
            initializer_type(source, "b"),
            "error: Lambda expressions are not typed"
        );
    }
}
