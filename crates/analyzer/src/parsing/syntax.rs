use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Tree};

/// 1-based line and column. Columns count characters, not bytes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn of(node: Node<'_>, source: &str) -> Self {
        let point = node.start_position();
        let start = node.start_byte();
        let line_start = start.saturating_sub(point.column);
        let column = source
            .get(line_start..start)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(point.column);

        Self {
            line: point.row as u32 + 1,
            column: column as u32 + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "class_declaration" => Some(TypeKind::Class),
            "interface_declaration" => Some(TypeKind::Interface),
            "enum_declaration" => Some(TypeKind::Enum),
            "record_declaration" => Some(TypeKind::Record),
            "annotation_type_declaration" => Some(TypeKind::Annotation),
            _ => None,
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Annotation)
    }
}

/// A type as written in source, with generic arguments erased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSyntax {
    Primitive(String),
    Void,
    Named(Vec<String>),
    Array {
        element: Box<TypeSyntax>,
        dimensions: usize,
    },
    /// `var`
    Inferred,
}

impl TypeSyntax {
    pub fn from_node(node: Node<'_>, source: &str) -> Option<Self> {
        match node.kind() {
            "integral_type" | "floating_point_type" | "boolean_type" => {
                Some(TypeSyntax::Primitive(node_text(node, source).to_string()))
            }
            "void_type" => Some(TypeSyntax::Void),
            "type_identifier" | "identifier" => {
                let text = node_text(node, source);
                if text == "var" {
                    Some(TypeSyntax::Inferred)
                } else {
                    Some(TypeSyntax::Named(vec![text.to_string()]))
                }
            }
            "scoped_type_identifier" | "generic_type" => {
                let segments = type_segments(node, source);
                (!segments.is_empty()).then_some(TypeSyntax::Named(segments))
            }
            "array_type" => {
                let element = node
                    .child_by_field_name("element")
                    .and_then(|element| TypeSyntax::from_node(element, source))?;
                let dimensions = node
                    .child_by_field_name("dimensions")
                    .map(|dims| count_dimensions(dims, source))
                    .unwrap_or(1);
                Some(element.with_dimensions(dimensions))
            }
            "annotated_type" => {
                let mut cursor = node.walk();
                node.named_children(&mut cursor)
                    .filter(|child| !is_annotation(child.kind()))
                    .find_map(|child| TypeSyntax::from_node(child, source))
            }
            _ => None,
        }
    }

    /// Parse a type written in a signature table, e.g. `java.lang.String[]`.
    pub fn parse_signature(signature: &str) -> Self {
        let trimmed = signature.trim();
        let mut dimensions = 0;
        let mut base = trimmed;
        while let Some(stripped) = base.strip_suffix("[]") {
            dimensions += 1;
            base = stripped.trim_end();
        }

        let element = match base {
            "void" => TypeSyntax::Void,
            "boolean" | "byte" | "short" | "char" | "int" | "long" | "float" | "double" => {
                TypeSyntax::Primitive(base.to_string())
            }
            _ => TypeSyntax::Named(base.split('.').map(str::to_string).collect()),
        };
        element.with_dimensions(dimensions)
    }

    /// Add array dimensions, folding into an existing array type.
    pub fn with_dimensions(self, dimensions: usize) -> Self {
        if dimensions == 0 {
            return self;
        }
        match self {
            TypeSyntax::Array {
                element,
                dimensions: inner,
            } => TypeSyntax::Array {
                element,
                dimensions: inner + dimensions,
            },
            other => TypeSyntax::Array {
                element: Box::new(other),
                dimensions,
            },
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeSyntax::Primitive(_))
    }
}

impl fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSyntax::Primitive(name) => f.write_str(name),
            TypeSyntax::Void => f.write_str("void"),
            TypeSyntax::Named(segments) => f.write_str(&segments.join(".")),
            TypeSyntax::Array {
                element,
                dimensions,
            } => {
                write!(f, "{element}")?;
                for _ in 0..*dimensions {
                    f.write_str("[]")?;
                }
                Ok(())
            }
            TypeSyntax::Inferred => f.write_str("var"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Imported name without the trailing `.*`
    pub path: String,
    pub is_static: bool,
    pub on_demand: bool,
}

impl ImportDecl {
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Everything before the last segment.
    pub fn container(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(container, _)| container)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameterDecl {
    pub name: String,
    pub bounds: Vec<TypeSyntax>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecl {
    pub name: String,
    pub ty: TypeSyntax,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub parameters: Vec<ParameterDecl>,
    /// The last parameter is `T...`; its type is stored as `T[]`
    pub varargs: bool,
    /// `None` for constructors
    pub return_type: Option<TypeSyntax>,
    pub type_parameters: Vec<TypeParameterDecl>,
    pub is_constructor: bool,
    pub is_static: bool,
    /// Implicit members such as enum `values()` or record accessors
    pub synthetic: bool,
    pub name_position: Position,
    pub byte_range: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeSyntax,
    pub is_static: bool,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    /// Absent for local types and anything nested inside them
    pub qualified_name: Option<String>,
    /// Names from the top-level type down to this one
    pub type_path: Vec<String>,
    pub parent: Option<usize>,
    pub members: Vec<usize>,
    pub type_parameters: Vec<TypeParameterDecl>,
    pub superclass: Option<TypeSyntax>,
    pub interfaces: Vec<TypeSyntax>,
    pub methods: Vec<MethodDecl>,
    pub fields: Vec<FieldDecl>,
    pub byte_range: Range<usize>,
    /// Start of the declaration, modifiers included
    pub position: Position,
    pub name_position: Position,
}

impl TypeDecl {
    pub fn is_local(&self) -> bool {
        self.qualified_name.is_none()
    }

    pub fn display_name(&self) -> &str {
        self.qualified_name.as_deref().unwrap_or(&self.name)
    }

    pub fn contains(&self, byte: usize) -> bool {
        self.byte_range.start <= byte && byte < self.byte_range.end
    }
}

/// One parsed source file together with its declaration table.
pub struct SyntaxUnit {
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
    pub package: String,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

impl fmt::Debug for SyntaxUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxUnit")
            .field("path", &self.path)
            .field("package", &self.package)
            .field("types", &self.types.len())
            .finish()
    }
}

impl SyntaxUnit {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text<'a>(&'a self, node: Node<'_>) -> &'a str {
        node_text(node, &self.source)
    }

    pub fn position(&self, node: Node<'_>) -> Position {
        Position::of(node, &self.source)
    }

    pub fn top_level_types(&self) -> impl Iterator<Item = (usize, &TypeDecl)> {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, decl)| decl.parent.is_none() && !decl.is_local())
    }

    /// Look up `Outer.Inner.Leaf` by walking member types from a top-level type.
    pub fn find_type<S: AsRef<str>>(&self, type_path: &[S]) -> Option<usize> {
        let (first, rest) = type_path.split_first()?;
        let (mut index, _) = self
            .top_level_types()
            .find(|(_, decl)| decl.name == first.as_ref())?;

        for segment in rest {
            index = self.member_named(index, segment.as_ref())?;
        }
        Some(index)
    }

    pub fn member_named(&self, index: usize, name: &str) -> Option<usize> {
        self.types
            .get(index)?
            .members
            .iter()
            .copied()
            .find(|member| self.types[*member].name == name)
    }

    /// Innermost type declaration whose range contains `byte`.
    pub fn enclosing_type(&self, byte: usize) -> Option<usize> {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, decl)| decl.contains(byte))
            .min_by_key(|(_, decl)| decl.byte_range.len())
            .map(|(index, _)| index)
    }

    pub fn type_declared_at(&self, start_byte: usize) -> Option<usize> {
        self.types
            .iter()
            .position(|decl| decl.byte_range.start == start_byte)
    }

    /// Method or constructor of `type_index` whose range contains `byte`.
    pub fn enclosing_method(&self, type_index: usize, byte: usize) -> Option<usize> {
        self.types.get(type_index)?.methods.iter().position(|method| {
            !method.synthetic && method.byte_range.start <= byte && byte < method.byte_range.end
        })
    }
}

pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Collapse runs of whitespace so node text fits on one report line.
pub fn compact_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn is_annotation(kind: &str) -> bool {
    matches!(kind, "annotation" | "marker_annotation")
}

/// Identifier segments of a (possibly scoped or generic) class type.
pub fn type_segments(node: Node<'_>, source: &str) -> Vec<String> {
    let mut segments = Vec::new();
    collect_type_segments(node, source, &mut segments);
    segments
}

fn collect_type_segments(node: Node<'_>, source: &str, segments: &mut Vec<String>) {
    match node.kind() {
        "type_identifier" | "identifier" => segments.push(node_text(node, source).to_string()),
        "scoped_type_identifier" | "scoped_identifier" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if !is_annotation(child.kind()) {
                    collect_type_segments(child, source, segments);
                }
            }
        }
        "generic_type" => {
            let mut cursor = node.walk();
            if let Some(base) = node
                .named_children(&mut cursor)
                .find(|child| child.kind() != "type_arguments")
            {
                collect_type_segments(base, source, segments);
            }
        }
        _ => {}
    }
}

pub(crate) fn count_dimensions(node: Node<'_>, source: &str) -> usize {
    node_text(node, source).matches('[').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signature() {
        assert_eq!(
            TypeSyntax::parse_signature("int"),
            TypeSyntax::Primitive("int".to_string())
        );
        assert_eq!(
            TypeSyntax::parse_signature("java.lang.String[][]").to_string(),
            "java.lang.String[][]"
        );
        assert_eq!(TypeSyntax::parse_signature("void"), TypeSyntax::Void);
    }

    #[test]
    fn test_with_dimensions_folds_arrays() {
        let ty = TypeSyntax::Primitive("int".to_string())
            .with_dimensions(1)
            .with_dimensions(2);
        assert_eq!(
            ty,
            TypeSyntax::Array {
                element: Box::new(TypeSyntax::Primitive("int".to_string())),
                dimensions: 3
            }
        );
    }

    #[test]
    fn test_compact_text() {
        assert_eq!(compact_text("foo(\n    a,\t b)"), "foo( a, b)");
    }
}
