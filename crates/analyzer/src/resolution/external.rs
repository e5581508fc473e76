//! Types that are not part of the analysed sources, such as the JDK.
//!
//! The resolution index only knows about source files. Anything it cannot find
//! is offered to an [`ExternalTypeSolver`], which answers from a signature table.

use crate::parsing::syntax::TypeKind;
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalMethod {
    pub name: String,
    /// Parameter types as qualified names, `T[]` for arrays, or a type
    /// variable name
    pub parameters: Vec<String>,
    pub return_type: String,
    pub varargs: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalField {
    pub name: String,
    pub ty: String,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalType {
    pub qualified_name: String,
    pub kind: TypeKind,
    pub type_parameters: Vec<String>,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<ExternalField>,
    pub methods: Vec<ExternalMethod>,
}

impl ExternalType {
    fn new(qualified_name: &str, kind: TypeKind) -> Self {
        let superclass = match kind {
            TypeKind::Class if qualified_name != "java.lang.Object" => {
                Some("java.lang.Object".to_string())
            }
            _ => None,
        };
        Self {
            qualified_name: qualified_name.to_string(),
            kind,
            type_parameters: Vec::new(),
            superclass,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn class(qualified_name: &str) -> Self {
        Self::new(qualified_name, TypeKind::Class)
    }

    pub fn interface(qualified_name: &str) -> Self {
        Self::new(qualified_name, TypeKind::Interface)
    }

    pub fn annotation(qualified_name: &str) -> Self {
        Self::new(qualified_name, TypeKind::Annotation)
    }

    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    pub fn generic(mut self, parameters: &[&str]) -> Self {
        self.type_parameters = parameters.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn implements(mut self, interfaces: &[&str]) -> Self {
        self.interfaces
            .extend(interfaces.iter().map(|i| i.to_string()));
        self
    }

    pub fn method(mut self, name: &str, parameters: &[&str], return_type: &str) -> Self {
        self.methods.push(ExternalMethod {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            return_type: return_type.to_string(),
            varargs: false,
            is_static: false,
        });
        self
    }

    pub fn static_method(mut self, name: &str, parameters: &[&str], return_type: &str) -> Self {
        self = self.method(name, parameters, return_type);
        if let Some(method) = self.methods.last_mut() {
            method.is_static = true;
        }
        self
    }

    /// Method whose last parameter is variadic, given as `T[]`.
    pub fn varargs_method(mut self, name: &str, parameters: &[&str], return_type: &str) -> Self {
        self = self.method(name, parameters, return_type);
        if let Some(method) = self.methods.last_mut() {
            method.varargs = true;
        }
        self
    }

    pub fn static_varargs(mut self, name: &str, parameters: &[&str], return_type: &str) -> Self {
        self = self.varargs_method(name, parameters, return_type);
        if let Some(method) = self.methods.last_mut() {
            method.is_static = true;
        }
        self
    }

    pub fn field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(ExternalField {
            name: name.to_string(),
            ty: ty.to_string(),
            is_static: false,
        });
        self
    }

    pub fn static_field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(ExternalField {
            name: name.to_string(),
            ty: ty.to_string(),
            is_static: true,
        });
        self
    }
}

pub trait ExternalTypeSolver: Send + Sync {
    fn solve_external(&self, qualified_name: &str) -> Option<Arc<ExternalType>>;
}

/// Solver that knows nothing.
#[derive(Debug, Default)]
pub struct NoExternalTypes;

impl ExternalTypeSolver for NoExternalTypes {
    fn solve_external(&self, _qualified_name: &str) -> Option<Arc<ExternalType>> {
        None
    }
}

/// Signature table of commonly used platform types.
#[derive(Debug, Default)]
pub struct PlatformTypes {
    types: FxHashMap<String, Arc<ExternalType>>,
}

impl PlatformTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, ty: ExternalType) -> Self {
        self.insert(ty);
        self
    }

    pub fn insert(&mut self, ty: ExternalType) {
        self.types.insert(ty.qualified_name.clone(), Arc::new(ty));
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn jdk() -> Self {
        let mut table = Self::new();
        for ty in java_lang().into_iter().chain(java_util()).chain(java_io()) {
            table.insert(ty);
        }
        table
    }
}

impl ExternalTypeSolver for PlatformTypes {
    fn solve_external(&self, qualified_name: &str) -> Option<Arc<ExternalType>> {
        self.types.get(qualified_name).cloned()
    }
}

const OBJECT: &str = "java.lang.Object";
const STRING: &str = "java.lang.String";

fn java_lang() -> Vec<ExternalType> {
    vec![
        ExternalType::class(OBJECT)
            .method("toString", &[], STRING)
            .method("equals", &[OBJECT], "boolean")
            .method("hashCode", &[], "int")
            .method("getClass", &[], "java.lang.Class")
            .method("notify", &[], "void")
            .method("notifyAll", &[], "void")
            .method("wait", &[], "void")
            .method("wait", &["long"], "void"),
        ExternalType::class(STRING)
            .implements(&[
                "java.lang.CharSequence",
                "java.lang.Comparable",
                "java.io.Serializable",
            ])
            .method("length", &[], "int")
            .method("isEmpty", &[], "boolean")
            .method("isBlank", &[], "boolean")
            .method("charAt", &["int"], "char")
            .method("substring", &["int"], STRING)
            .method("substring", &["int", "int"], STRING)
            .method("indexOf", &[STRING], "int")
            .method("indexOf", &["int"], "int")
            .method("lastIndexOf", &[STRING], "int")
            .method("contains", &["java.lang.CharSequence"], "boolean")
            .method("startsWith", &[STRING], "boolean")
            .method("endsWith", &[STRING], "boolean")
            .method("equalsIgnoreCase", &[STRING], "boolean")
            .method("compareTo", &[STRING], "int")
            .method("trim", &[], STRING)
            .method("strip", &[], STRING)
            .method("toLowerCase", &[], STRING)
            .method("toUpperCase", &[], STRING)
            .method("replace", &["java.lang.CharSequence", "java.lang.CharSequence"], STRING)
            .method("split", &[STRING], "java.lang.String[]")
            .method("toCharArray", &[], "char[]")
            .method("getBytes", &[], "byte[]")
            .method("concat", &[STRING], STRING)
            .method("intern", &[], STRING)
            .static_method("valueOf", &[OBJECT], STRING)
            .static_method("valueOf", &["int"], STRING)
            .static_method("valueOf", &["long"], STRING)
            .static_method("valueOf", &["char"], STRING)
            .static_method("valueOf", &["boolean"], STRING)
            .static_method("valueOf", &["double"], STRING)
            .static_varargs("format", &[STRING, "java.lang.Object[]"], STRING)
            .static_varargs(
                "join",
                &["java.lang.CharSequence", "java.lang.CharSequence[]"],
                STRING,
            ),
        ExternalType::interface("java.lang.CharSequence")
            .method("length", &[], "int")
            .method("charAt", &["int"], "char")
            .method("toString", &[], STRING),
        ExternalType::interface("java.lang.Comparable")
            .generic(&["T"])
            .method("compareTo", &["T"], "int"),
        ExternalType::interface("java.lang.Iterable")
            .generic(&["T"])
            .method("iterator", &[], "java.util.Iterator"),
        ExternalType::interface("java.lang.Runnable").method("run", &[], "void"),
        ExternalType::interface("java.lang.AutoCloseable").method("close", &[], "void"),
        ExternalType::interface("java.lang.Cloneable"),
        ExternalType::class("java.lang.StringBuilder")
            .implements(&["java.lang.CharSequence"])
            .method("append", &[OBJECT], "java.lang.StringBuilder")
            .method("append", &[STRING], "java.lang.StringBuilder")
            .method("append", &["int"], "java.lang.StringBuilder")
            .method("append", &["long"], "java.lang.StringBuilder")
            .method("append", &["char"], "java.lang.StringBuilder")
            .method("append", &["boolean"], "java.lang.StringBuilder")
            .method("append", &["double"], "java.lang.StringBuilder")
            .method("length", &[], "int")
            .method("reverse", &[], "java.lang.StringBuilder")
            .method("insert", &["int", STRING], "java.lang.StringBuilder")
            .method("toString", &[], STRING),
        ExternalType::class("java.lang.System")
            .static_field("out", "java.io.PrintStream")
            .static_field("err", "java.io.PrintStream")
            .static_method("currentTimeMillis", &[], "long")
            .static_method("nanoTime", &[], "long")
            .static_method("getProperty", &[STRING], STRING)
            .static_method("getenv", &[STRING], STRING)
            .static_method("exit", &["int"], "void")
            .static_method("lineSeparator", &[], STRING)
            .static_method(
                "arraycopy",
                &[OBJECT, "int", OBJECT, "int", "int"],
                "void",
            ),
        ExternalType::class("java.lang.Math")
            .static_field("PI", "double")
            .static_method("abs", &["int"], "int")
            .static_method("abs", &["long"], "long")
            .static_method("abs", &["double"], "double")
            .static_method("max", &["int", "int"], "int")
            .static_method("max", &["long", "long"], "long")
            .static_method("max", &["double", "double"], "double")
            .static_method("min", &["int", "int"], "int")
            .static_method("min", &["long", "long"], "long")
            .static_method("min", &["double", "double"], "double")
            .static_method("sqrt", &["double"], "double")
            .static_method("pow", &["double", "double"], "double")
            .static_method("floor", &["double"], "double")
            .static_method("ceil", &["double"], "double")
            .static_method("round", &["double"], "long")
            .static_method("random", &[], "double"),
        ExternalType::class("java.lang.Number")
            .implements(&["java.io.Serializable"])
            .method("intValue", &[], "int")
            .method("longValue", &[], "long")
            .method("doubleValue", &[], "double")
            .method("floatValue", &[], "float"),
        boxed("java.lang.Integer", "int")
            .static_field("MAX_VALUE", "int")
            .static_field("MIN_VALUE", "int")
            .static_method("parseInt", &[STRING], "int")
            .static_method("toString", &["int"], STRING),
        boxed("java.lang.Long", "long")
            .static_field("MAX_VALUE", "long")
            .static_field("MIN_VALUE", "long")
            .static_method("parseLong", &[STRING], "long"),
        boxed("java.lang.Double", "double")
            .static_method("parseDouble", &[STRING], "double"),
        boxed("java.lang.Float", "float"),
        boxed("java.lang.Short", "short"),
        boxed("java.lang.Byte", "byte"),
        ExternalType::class("java.lang.Boolean")
            .implements(&["java.io.Serializable", "java.lang.Comparable"])
            .method("booleanValue", &[], "boolean")
            .static_method("valueOf", &["boolean"], "java.lang.Boolean")
            .static_method("parseBoolean", &[STRING], "boolean"),
        ExternalType::class("java.lang.Character")
            .implements(&["java.io.Serializable", "java.lang.Comparable"])
            .method("charValue", &[], "char")
            .static_method("isDigit", &["char"], "boolean")
            .static_method("isLetter", &["char"], "boolean")
            .static_method("isWhitespace", &["char"], "boolean"),
        ExternalType::class("java.lang.Enum")
            .generic(&["E"])
            .implements(&["java.lang.Comparable", "java.io.Serializable"])
            .method("name", &[], STRING)
            .method("ordinal", &[], "int"),
        ExternalType::class("java.lang.Record"),
        ExternalType::class("java.lang.Class")
            .generic(&["T"])
            .method("getName", &[], STRING)
            .method("getSimpleName", &[], STRING),
        ExternalType::class("java.lang.Thread")
            .implements(&["java.lang.Runnable"])
            .method("start", &[], "void")
            .method("join", &[], "void")
            .method("interrupt", &[], "void")
            .method("getName", &[], STRING)
            .static_method("currentThread", &[], "java.lang.Thread")
            .static_method("sleep", &["long"], "void"),
        ExternalType::class("java.lang.Throwable")
            .implements(&["java.io.Serializable"])
            .method("getMessage", &[], STRING)
            .method("getCause", &[], "java.lang.Throwable")
            .method("printStackTrace", &[], "void")
            .method("addSuppressed", &["java.lang.Throwable"], "void"),
        ExternalType::class("java.lang.Exception").extends("java.lang.Throwable"),
        ExternalType::class("java.lang.Error").extends("java.lang.Throwable"),
        ExternalType::class("java.lang.RuntimeException").extends("java.lang.Exception"),
        ExternalType::class("java.lang.IllegalArgumentException")
            .extends("java.lang.RuntimeException"),
        ExternalType::class("java.lang.IllegalStateException")
            .extends("java.lang.RuntimeException"),
        ExternalType::class("java.lang.NullPointerException")
            .extends("java.lang.RuntimeException"),
        ExternalType::class("java.lang.UnsupportedOperationException")
            .extends("java.lang.RuntimeException"),
        ExternalType::class("java.lang.IndexOutOfBoundsException")
            .extends("java.lang.RuntimeException"),
        ExternalType::class("java.lang.InterruptedException").extends("java.lang.Exception"),
        ExternalType::annotation("java.lang.Override"),
        ExternalType::annotation("java.lang.Deprecated"),
        ExternalType::annotation("java.lang.SuppressWarnings"),
        ExternalType::annotation("java.lang.FunctionalInterface"),
        ExternalType::annotation("java.lang.SafeVarargs"),
    ]
}

fn boxed(qualified_name: &str, primitive: &str) -> ExternalType {
    ExternalType::class(qualified_name)
        .extends("java.lang.Number")
        .implements(&["java.lang.Comparable"])
        .method(&format!("{primitive}Value"), &[], primitive)
        .method("compareTo", &[qualified_name], "int")
        .static_method("valueOf", &[primitive], qualified_name)
        .static_method("valueOf", &[STRING], qualified_name)
        .static_method("compare", &[primitive, primitive], "int")
}

fn java_util() -> Vec<ExternalType> {
    vec![
        ExternalType::interface("java.util.Collection")
            .generic(&["E"])
            .implements(&["java.lang.Iterable"])
            .method("size", &[], "int")
            .method("isEmpty", &[], "boolean")
            .method("contains", &[OBJECT], "boolean")
            .method("add", &["E"], "boolean")
            .method("remove", &[OBJECT], "boolean")
            .method("addAll", &["java.util.Collection"], "boolean")
            .method("clear", &[], "void")
            .method("stream", &[], "java.util.stream.Stream")
            .method("toArray", &[], "java.lang.Object[]"),
        ExternalType::interface("java.util.List")
            .generic(&["E"])
            .implements(&["java.util.Collection"])
            .method("get", &["int"], "E")
            .method("set", &["int", "E"], "E")
            .method("add", &["int", "E"], "void")
            .method("remove", &["int"], "E")
            .method("indexOf", &[OBJECT], "int")
            .method("subList", &["int", "int"], "java.util.List")
            .static_varargs("of", &["java.lang.Object[]"], "java.util.List"),
        ExternalType::class("java.util.ArrayList")
            .generic(&["E"])
            .implements(&["java.util.List", "java.io.Serializable"])
            .method("ensureCapacity", &["int"], "void")
            .method("trimToSize", &[], "void"),
        ExternalType::class("java.util.LinkedList")
            .generic(&["E"])
            .implements(&["java.util.List", "java.io.Serializable"])
            .method("addFirst", &["E"], "void")
            .method("addLast", &["E"], "void"),
        ExternalType::interface("java.util.Set")
            .generic(&["E"])
            .implements(&["java.util.Collection"]),
        ExternalType::class("java.util.HashSet")
            .generic(&["E"])
            .implements(&["java.util.Set", "java.io.Serializable"]),
        ExternalType::interface("java.util.Map")
            .generic(&["K", "V"])
            .method("get", &[OBJECT], "V")
            .method("put", &["K", "V"], "V")
            .method("remove", &[OBJECT], "V")
            .method("containsKey", &[OBJECT], "boolean")
            .method("containsValue", &[OBJECT], "boolean")
            .method("getOrDefault", &[OBJECT, "V"], "V")
            .method("size", &[], "int")
            .method("isEmpty", &[], "boolean")
            .method("keySet", &[], "java.util.Set")
            .method("values", &[], "java.util.Collection")
            .method("entrySet", &[], "java.util.Set")
            .method("clear", &[], "void"),
        ExternalType::class("java.util.HashMap")
            .generic(&["K", "V"])
            .implements(&["java.util.Map", "java.io.Serializable"]),
        ExternalType::interface("java.util.Iterator")
            .generic(&["E"])
            .method("hasNext", &[], "boolean")
            .method("next", &[], "E")
            .method("remove", &[], "void"),
        ExternalType::class("java.util.Objects")
            .static_method("equals", &[OBJECT, OBJECT], "boolean")
            .static_method("hashCode", &[OBJECT], "int")
            .static_method("requireNonNull", &["T"], "T")
            .static_method("requireNonNull", &["T", STRING], "T")
            .static_method("isNull", &[OBJECT], "boolean")
            .static_method("nonNull", &[OBJECT], "boolean")
            .static_method("toString", &[OBJECT], STRING)
            .static_varargs("hash", &["java.lang.Object[]"], "int"),
        ExternalType::class("java.util.Optional")
            .generic(&["T"])
            .method("isPresent", &[], "boolean")
            .method("isEmpty", &[], "boolean")
            .method("get", &[], "T")
            .method("orElse", &["T"], "T")
            .static_method("of", &["T"], "java.util.Optional")
            .static_method("ofNullable", &["T"], "java.util.Optional")
            .static_method("empty", &[], "java.util.Optional"),
        ExternalType::class("java.util.Arrays")
            .static_varargs("asList", &["java.lang.Object[]"], "java.util.List")
            .static_method("toString", &["java.lang.Object[]"], STRING)
            .static_method("toString", &["int[]"], STRING)
            .static_method("sort", &["java.lang.Object[]"], "void")
            .static_method("sort", &["int[]"], "void")
            .static_method("fill", &["int[]", "int"], "void"),
        ExternalType::class("java.util.Collections")
            .static_method("emptyList", &[], "java.util.List")
            .static_method("emptyMap", &[], "java.util.Map")
            .static_method("emptySet", &[], "java.util.Set")
            .static_method("unmodifiableList", &["java.util.List"], "java.util.List")
            .static_method("singletonList", &["T"], "java.util.List")
            .static_method("sort", &["java.util.List"], "void"),
    ]
}

fn java_io() -> Vec<ExternalType> {
    vec![
        ExternalType::interface("java.io.Serializable"),
        ExternalType::interface("java.io.Closeable")
            .implements(&["java.lang.AutoCloseable"])
            .method("close", &[], "void"),
        ExternalType::class("java.io.PrintStream")
            .implements(&["java.io.Closeable"])
            .method("println", &[], "void")
            .method("println", &[STRING], "void")
            .method("println", &[OBJECT], "void")
            .method("println", &["int"], "void")
            .method("println", &["long"], "void")
            .method("println", &["char"], "void")
            .method("println", &["boolean"], "void")
            .method("println", &["double"], "void")
            .method("print", &[STRING], "void")
            .method("print", &[OBJECT], "void")
            .method("print", &["int"], "void")
            .method("flush", &[], "void")
            .varargs_method("printf", &[STRING, "java.lang.Object[]"], "java.io.PrintStream"),
        ExternalType::class("java.io.IOException").extends("java.lang.Exception"),
        ExternalType::class("java.io.UncheckedIOException")
            .extends("java.lang.RuntimeException"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jdk_table_contains_core_types() {
        let jdk = PlatformTypes::jdk();

        let string = jdk.solve_external("java.lang.String").expect("String");
        assert_eq!(string.superclass.as_deref(), Some("java.lang.Object"));
        assert!(string.methods.iter().any(|m| m.name == "length"));

        let system = jdk.solve_external("java.lang.System").expect("System");
        assert!(system.fields.iter().any(|f| f.name == "out" && f.is_static));

        assert!(jdk.solve_external("java.lang.Nope").is_none());
    }

    #[test]
    fn test_object_has_no_superclass() {
        let jdk = PlatformTypes::jdk();
        let object = jdk.solve_external(OBJECT).unwrap();
        assert!(object.superclass.is_none());

        let list = jdk.solve_external("java.util.List").unwrap();
        assert_eq!(list.kind, TypeKind::Interface);
        assert!(list.superclass.is_none());
    }
}
