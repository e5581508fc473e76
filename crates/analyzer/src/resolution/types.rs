use crate::parsing::syntax::{SyntaxUnit, TypeDecl, TypeKind};
use crate::resolution::external::ExternalType;
use std::fmt;
use std::sync::Arc;

/// A resolved type declaration, either from the analysed sources or from the
/// external symbol table.
#[derive(Clone)]
pub enum DeclarationHandle {
    Source { unit: Arc<SyntaxUnit>, index: usize },
    External(Arc<ExternalType>),
}

impl DeclarationHandle {
    pub fn qualified_name(&self) -> &str {
        match self {
            DeclarationHandle::Source { unit, index } => unit.types[*index].display_name(),
            DeclarationHandle::External(external) => &external.qualified_name,
        }
    }

    pub fn simple_name(&self) -> &str {
        match self {
            DeclarationHandle::Source { unit, index } => &unit.types[*index].name,
            DeclarationHandle::External(external) => external.simple_name(),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            DeclarationHandle::Source { unit, index } => unit.types[*index].kind,
            DeclarationHandle::External(external) => external.kind,
        }
    }

    pub fn source_decl(&self) -> Option<(&Arc<SyntaxUnit>, &TypeDecl)> {
        match self {
            DeclarationHandle::Source { unit, index } => Some((unit, &unit.types[*index])),
            DeclarationHandle::External(_) => None,
        }
    }

    /// Identity used to stop hierarchy walks from revisiting a type. Local
    /// types have no qualified name, so they are keyed by location.
    pub fn key(&self) -> String {
        match self {
            DeclarationHandle::Source { unit, index } => match &unit.types[*index].qualified_name {
                Some(name) => name.clone(),
                None => format!("{}#{index}", unit.path.display()),
            },
            DeclarationHandle::External(external) => external.qualified_name.clone(),
        }
    }
}

impl PartialEq for DeclarationHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Debug for DeclarationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationHandle::Source { unit, index } => f
                .debug_struct("Source")
                .field("type", &self.qualified_name())
                .field("path", &unit.path)
                .field("index", index)
                .finish(),
            DeclarationHandle::External(external) => f
                .debug_tuple("External")
                .field(&external.qualified_name)
                .finish(),
        }
    }
}

/// Outcome of a qualified-name lookup in the resolution index.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult {
    Resolved(DeclarationHandle),
    Unresolved,
}

impl ResolutionResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved(_))
    }

    pub fn handle(&self) -> Option<&DeclarationHandle> {
        match self {
            ResolutionResult::Resolved(handle) => Some(handle),
            ResolutionResult::Unresolved => None,
        }
    }

    pub fn into_handle(self) -> Option<DeclarationHandle> {
        match self {
            ResolutionResult::Resolved(handle) => Some(handle),
            ResolutionResult::Unresolved => None,
        }
    }
}

/// Outcome of resolving something inside a file. Failures carry the
/// diagnostic that ends up in the `errors` table.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    Unresolved(String),
    Ambiguous(String),
    Unsupported(String),
}

impl<T> Resolution<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::Unresolved(message) => Resolution::Unresolved(message),
            Resolution::Ambiguous(message) => Resolution::Ambiguous(message),
            Resolution::Unsupported(message) => Resolution::Unsupported(message),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Resolution<U>) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => f(value),
            Resolution::Unresolved(message) => Resolution::Unresolved(message),
            Resolution::Ambiguous(message) => Resolution::Ambiguous(message),
            Resolution::Unsupported(message) => Resolution::Unsupported(message),
        }
    }

    /// The diagnostic of a failed resolution.
    pub fn message(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(_) => None,
            Resolution::Unresolved(message)
            | Resolution::Ambiguous(message)
            | Resolution::Unsupported(message) => Some(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "boolean" => Some(Primitive::Boolean),
            "byte" => Some(Primitive::Byte),
            "short" => Some(Primitive::Short),
            "char" => Some(Primitive::Char),
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "float" => Some(Primitive::Float),
            "double" => Some(Primitive::Double),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn boxed(&self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Char => "java.lang.Character",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
        }
    }

    pub fn unboxed(qualified_name: &str) -> Option<Self> {
        [
            Primitive::Boolean,
            Primitive::Byte,
            Primitive::Short,
            Primitive::Char,
            Primitive::Int,
            Primitive::Long,
            Primitive::Float,
            Primitive::Double,
        ]
        .into_iter()
        .find(|primitive| primitive.boxed() == qualified_name)
    }

    fn rank(&self) -> u8 {
        match self {
            Primitive::Boolean => 0,
            Primitive::Byte => 1,
            Primitive::Short | Primitive::Char => 2,
            Primitive::Int => 3,
            Primitive::Long => 4,
            Primitive::Float => 5,
            Primitive::Double => 6,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Primitive::Boolean)
    }

    /// Identity or widening primitive conversion.
    pub fn widens_to(&self, target: Primitive) -> bool {
        if *self == target {
            return true;
        }
        match (self, target) {
            (Primitive::Boolean, _) | (_, Primitive::Boolean) => false,
            (_, Primitive::Char) => false,
            (Primitive::Char, Primitive::Short) => false,
            (source, target) => source.rank() < target.rank(),
        }
    }

    /// Binary numeric promotion.
    pub fn promote(left: Primitive, right: Primitive) -> Primitive {
        let widest = if left.rank() >= right.rank() {
            left
        } else {
            right
        };
        if widest.rank() < Primitive::Int.rank() {
            Primitive::Int
        } else {
            widest
        }
    }
}

/// Static type of an expression or declared type after resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Primitive(Primitive),
    Reference(DeclarationHandle),
    Array(Box<ResolvedType>),
    TypeVariable(String),
    Null,
    Void,
}

impl ResolvedType {
    pub fn array_of(element: ResolvedType, dimensions: usize) -> ResolvedType {
        (0..dimensions).fold(element, |ty, _| ResolvedType::Array(Box::new(ty)))
    }

    /// Strip every array level.
    pub fn element(&self) -> &ResolvedType {
        match self {
            ResolvedType::Array(component) => component.element(),
            other => other,
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            ResolvedType::Array(component) => 1 + component.dimensions(),
            _ => 0,
        }
    }

    pub fn as_reference(&self) -> Option<&DeclarationHandle> {
        match self {
            ResolvedType::Reference(handle) => Some(handle),
            _ => None,
        }
    }

    /// Name used in report rows: primitives as keywords, arrays as the
    /// element name followed by `[]` per dimension.
    pub fn describe(&self) -> String {
        match self {
            ResolvedType::Primitive(primitive) => primitive.keyword().to_string(),
            ResolvedType::Reference(handle) => handle.qualified_name().to_string(),
            ResolvedType::Array(component) => format!("{}[]", component.describe()),
            ResolvedType::TypeVariable(name) => name.clone(),
            ResolvedType::Null => "null".to_string(),
            ResolvedType::Void => "void".to_string(),
        }
    }

    pub fn is_qualified(&self, qualified_name: &str) -> bool {
        matches!(self, ResolvedType::Reference(handle) if handle.qualified_name() == qualified_name)
    }
}
