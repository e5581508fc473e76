//! Builds the declaration table of a compilation unit: package, imports and
//! every type declaration with its members.

use crate::parsing::syntax::{
    FieldDecl, ImportDecl, MethodDecl, ParameterDecl, Position, TypeDecl, TypeKind,
    TypeParameterDecl, TypeSyntax, count_dimensions, node_text,
};
use tree_sitter::Node;

pub(crate) struct Declarations {
    pub package: String,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

struct Pending<'t> {
    node: Node<'t>,
    enclosing: Option<usize>,
    member_level: bool,
    local: bool,
}

pub(crate) fn collect(root: Node<'_>, source: &str) -> Declarations {
    let mut package = String::new();
    let mut imports = Vec::new();

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                if let Some(name) = qualified_identifier(child, source) {
                    package = name;
                }
            }
            "import_declaration" => {
                if let Some(import) = import_declaration(child, source) {
                    imports.push(import);
                }
            }
            _ => {}
        }
    }

    let types = collect_types(root, source, &package);
    Declarations {
        package,
        imports,
        types,
    }
}

fn qualified_identifier(node: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "identifier" | "scoped_identifier"))
        .map(|name| strip_whitespace(node_text(name, source)))
}

fn import_declaration(node: Node<'_>, source: &str) -> Option<ImportDecl> {
    let path = qualified_identifier(node, source)?;
    let mut is_static = false;
    let mut on_demand = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "asterisk" | "*" => on_demand = true,
            _ => {}
        }
    }

    Some(ImportDecl {
        path,
        is_static,
        on_demand,
    })
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn collect_types(root: Node<'_>, source: &str, package: &str) -> Vec<TypeDecl> {
    let mut types: Vec<TypeDecl> = Vec::new();
    let mut stack: Vec<Pending<'_>> = Vec::new();

    push_children(&mut stack, root, None, true, false);

    while let Some(pending) = stack.pop() {
        let node = pending.node;
        let Some(kind) = TypeKind::from_node_kind(node.kind()) else {
            push_children(
                &mut stack,
                node,
                pending.enclosing,
                false,
                pending.local,
            );
            continue;
        };

        let local = pending.local || !pending.member_level;
        let index = types.len();
        let mut decl = type_declaration(node, kind, source);
        decl.parent = pending.enclosing;

        if !local {
            let outer = pending.enclosing.and_then(|parent| types.get(parent));
            decl.type_path = match outer {
                Some(outer) => {
                    let mut path = outer.type_path.clone();
                    path.push(decl.name.clone());
                    path
                }
                None => vec![decl.name.clone()],
            };
            decl.qualified_name = Some(match outer.and_then(|o| o.qualified_name.as_deref()) {
                Some(outer_name) => format!("{outer_name}.{}", decl.name),
                None if package.is_empty() => decl.name.clone(),
                None => format!("{package}.{}", decl.name),
            });
            if let Some(parent) = pending.enclosing.and_then(|parent| types.get_mut(parent)) {
                parent.members.push(index);
            }
        }

        types.push(decl);

        if let Some(body) = node.child_by_field_name("body") {
            push_body(&mut stack, body, index, local);
        }
    }

    types
}

/// Push named children so they pop in document order.
fn push_children<'t>(
    stack: &mut Vec<Pending<'t>>,
    node: Node<'t>,
    enclosing: Option<usize>,
    member_level: bool,
    local: bool,
) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
    for child in children.into_iter().rev() {
        stack.push(Pending {
            node: child,
            enclosing,
            member_level,
            local,
        });
    }
}

fn push_body<'t>(stack: &mut Vec<Pending<'t>>, body: Node<'t>, owner: usize, local: bool) {
    let mut cursor = body.walk();
    let children: Vec<Node<'t>> = body.named_children(&mut cursor).collect();
    for child in children.into_iter().rev() {
        match child.kind() {
            // Members declared after the constants of an enum
            "enum_body_declarations" => push_children(stack, child, Some(owner), true, local),
            // Constant bodies are anonymous classes
            "enum_constant" => push_children(stack, child, Some(owner), false, local),
            _ => stack.push(Pending {
                node: child,
                enclosing: Some(owner),
                member_level: true,
                local,
            }),
        }
    }
}

fn type_declaration(node: Node<'_>, kind: TypeKind, source: &str) -> TypeDecl {
    let name_node = node.child_by_field_name("name");
    let name = name_node
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();
    let name_position = name_node
        .map(|n| Position::of(n, source))
        .unwrap_or_else(|| Position::of(node, source));

    let mut decl = TypeDecl {
        name: name.clone(),
        kind,
        qualified_name: None,
        type_path: vec![name],
        parent: None,
        members: Vec::new(),
        type_parameters: node
            .child_by_field_name("type_parameters")
            .map(|params| type_parameters(params, source))
            .unwrap_or_default(),
        superclass: None,
        interfaces: Vec::new(),
        methods: Vec::new(),
        fields: Vec::new(),
        byte_range: node.byte_range(),
        position: Position::of(node, source),
        name_position,
    };

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "superclass" => {
                decl.superclass = first_type(child, source);
            }
            "super_interfaces" | "extends_interfaces" => {
                decl.interfaces.extend(type_list(child, source));
            }
            _ => {}
        }
    }

    if kind == TypeKind::Record
        && let Some(components) = node.child_by_field_name("parameters")
    {
        record_components(&mut decl, components, source);
    }

    if let Some(body) = node.child_by_field_name("body") {
        type_body(&mut decl, body, source);
    }

    if kind == TypeKind::Enum {
        enum_members(&mut decl);
    }

    decl
}

fn type_body(decl: &mut TypeDecl, body: Node<'_>, source: &str) {
    let interface = decl.kind.is_interface();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "field_declaration" | "constant_declaration" => {
                let is_static = interface || has_modifier(member, "static");
                decl.fields.extend(field_declaration(member, source, is_static));
            }
            "method_declaration" | "annotation_type_element_declaration" => {
                if let Some(mut method) = method_declaration(member, source, false) {
                    method.is_static = has_modifier(member, "static");
                    decl.methods.push(method);
                }
            }
            "constructor_declaration" => {
                if let Some(constructor) = method_declaration(member, source, true) {
                    decl.methods.push(constructor);
                }
            }
            "enum_constant" => {
                if let Some(name) = member.child_by_field_name("name") {
                    decl.fields.push(FieldDecl {
                        name: node_text(name, source).to_string(),
                        ty: TypeSyntax::Named(vec![decl.name.clone()]),
                        is_static: true,
                        position: Position::of(name, source),
                    });
                }
            }
            "enum_body_declarations" => type_body(decl, member, source),
            _ => {}
        }
    }
}

fn field_declaration(node: Node<'_>, source: &str, is_static: bool) -> Vec<FieldDecl> {
    let Some(base) = node
        .child_by_field_name("type")
        .and_then(|ty| TypeSyntax::from_node(ty, source))
    else {
        return Vec::new();
    };

    let mut cursor = node.walk();
    node.children_by_field_name("declarator", &mut cursor)
        .filter_map(|declarator| {
            let name = declarator.child_by_field_name("name")?;
            let dimensions = declarator
                .child_by_field_name("dimensions")
                .map(|dims| count_dimensions(dims, source))
                .unwrap_or(0);
            Some(FieldDecl {
                name: node_text(name, source).to_string(),
                ty: base.clone().with_dimensions(dimensions),
                is_static,
                position: Position::of(name, source),
            })
        })
        .collect()
}

fn method_declaration(node: Node<'_>, source: &str, is_constructor: bool) -> Option<MethodDecl> {
    let name = node.child_by_field_name("name")?;
    let (parameters, varargs) = node
        .child_by_field_name("parameters")
        .map(|params| formal_parameters(params, source))
        .unwrap_or_default();

    let return_type = if is_constructor {
        None
    } else {
        let dimensions = node
            .child_by_field_name("dimensions")
            .map(|dims| count_dimensions(dims, source))
            .unwrap_or(0);
        node.child_by_field_name("type")
            .and_then(|ty| TypeSyntax::from_node(ty, source))
            .map(|ty| ty.with_dimensions(dimensions))
    };

    Some(MethodDecl {
        name: node_text(name, source).to_string(),
        parameters,
        varargs,
        return_type,
        type_parameters: node
            .child_by_field_name("type_parameters")
            .map(|params| type_parameters(params, source))
            .unwrap_or_default(),
        is_constructor,
        is_static: false,
        synthetic: false,
        name_position: Position::of(name, source),
        byte_range: node.byte_range(),
    })
}

/// Parameters of a method or lambda, plus whether the last one is variadic.
pub(crate) fn formal_parameters(node: Node<'_>, source: &str) -> (Vec<ParameterDecl>, bool) {
    let mut parameters = Vec::new();
    let mut varargs = false;

    let mut cursor = node.walk();
    for param in node.named_children(&mut cursor) {
        match param.kind() {
            "formal_parameter" => {
                let ty = param
                    .child_by_field_name("type")
                    .and_then(|ty| TypeSyntax::from_node(ty, source));
                let name = param.child_by_field_name("name");
                if let (Some(ty), Some(name)) = (ty, name) {
                    let dimensions = param
                        .child_by_field_name("dimensions")
                        .map(|dims| count_dimensions(dims, source))
                        .unwrap_or(0);
                    parameters.push(ParameterDecl {
                        name: node_text(name, source).to_string(),
                        ty: ty.with_dimensions(dimensions),
                    });
                }
            }
            "spread_parameter" => {
                if let Some(parameter) = spread_parameter(param, source) {
                    parameters.push(parameter);
                    varargs = true;
                }
            }
            _ => {}
        }
    }

    (parameters, varargs)
}

fn spread_parameter(node: Node<'_>, source: &str) -> Option<ParameterDecl> {
    let mut ty = None;
    let mut name = None;

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "modifiers" => {}
            "variable_declarator" => {
                name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string());
            }
            _ if ty.is_none() => ty = TypeSyntax::from_node(child, source),
            _ => {}
        }
    }

    Some(ParameterDecl {
        name: name?,
        ty: ty?.with_dimensions(1),
    })
}

pub(crate) fn type_parameters(node: Node<'_>, source: &str) -> Vec<TypeParameterDecl> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|param| param.kind() == "type_parameter")
        .filter_map(|param| {
            let mut inner = param.walk();
            let children: Vec<Node<'_>> = param.named_children(&mut inner).collect();
            let name = children
                .iter()
                .find(|child| matches!(child.kind(), "type_identifier" | "identifier"))?;
            let bounds = children
                .iter()
                .find(|child| child.kind() == "type_bound")
                .map(|bound| type_list(*bound, source))
                .unwrap_or_default();
            Some(TypeParameterDecl {
                name: node_text(*name, source).to_string(),
                bounds,
            })
        })
        .collect()
}

fn first_type(node: Node<'_>, source: &str) -> Option<TypeSyntax> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find_map(|child| TypeSyntax::from_node(child, source))
}

/// Types of a `type_list`, either the node itself or a direct child.
fn type_list(node: Node<'_>, source: &str) -> Vec<TypeSyntax> {
    let mut cursor = node.walk();
    let mut types = Vec::new();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "type_list" {
            types.extend(type_list(child, source));
        } else if let Some(ty) = TypeSyntax::from_node(child, source) {
            types.push(ty);
        }
    }
    types
}

pub(crate) fn has_modifier(node: Node<'_>, modifier: &str) -> bool {
    let mut cursor = node.walk();
    let Some(modifiers) = node
        .children(&mut cursor)
        .find(|child| child.kind() == "modifiers")
    else {
        return false;
    };

    let mut inner = modifiers.walk();
    let found = modifiers
        .children(&mut inner)
        .any(|child| child.kind() == modifier);
    found
}

fn record_components(decl: &mut TypeDecl, components: Node<'_>, source: &str) {
    let (parameters, varargs) = formal_parameters(components, source);

    for parameter in &parameters {
        let position = component_position(components, &parameter.name, source)
            .unwrap_or(decl.name_position);
        decl.fields.push(FieldDecl {
            name: parameter.name.clone(),
            ty: parameter.ty.clone(),
            is_static: false,
            position,
        });
        decl.methods.push(MethodDecl {
            name: parameter.name.clone(),
            parameters: Vec::new(),
            varargs: false,
            return_type: Some(parameter.ty.clone()),
            type_parameters: Vec::new(),
            is_constructor: false,
            is_static: false,
            synthetic: true,
            name_position: position,
            byte_range: components.byte_range(),
        });
    }

    decl.methods.push(MethodDecl {
        name: decl.name.clone(),
        parameters,
        varargs,
        return_type: None,
        type_parameters: Vec::new(),
        is_constructor: true,
        is_static: false,
        synthetic: true,
        name_position: decl.name_position,
        byte_range: components.byte_range(),
    });
}

fn component_position(components: Node<'_>, name: &str, source: &str) -> Option<Position> {
    let mut cursor = components.walk();
    components
        .named_children(&mut cursor)
        .filter_map(|param| param.child_by_field_name("name"))
        .find(|node| node_text(*node, source) == name)
        .map(|node| Position::of(node, source))
}

/// `values()` and `valueOf(String)` exist on every enum.
fn enum_members(decl: &mut TypeDecl) {
    let own_type = TypeSyntax::Named(vec![decl.name.clone()]);
    let position = decl.name_position;
    let range = decl.byte_range.start..decl.byte_range.start;

    decl.methods.push(MethodDecl {
        name: "values".to_string(),
        parameters: Vec::new(),
        varargs: false,
        return_type: Some(own_type.clone().with_dimensions(1)),
        type_parameters: Vec::new(),
        is_constructor: false,
        is_static: true,
        synthetic: true,
        name_position: position,
        byte_range: range.clone(),
    });
    decl.methods.push(MethodDecl {
        name: "valueOf".to_string(),
        parameters: vec![ParameterDecl {
            name: "name".to_string(),
            ty: TypeSyntax::Named(vec![
                "java".to_string(),
                "lang".to_string(),
                "String".to_string(),
            ]),
        }],
        varargs: false,
        return_type: Some(own_type),
        type_parameters: Vec::new(),
        is_constructor: false,
        is_static: true,
        synthetic: true,
        name_position: position,
        byte_range: range,
    });
}
