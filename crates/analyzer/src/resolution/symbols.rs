//! Name resolution inside one compilation unit.
//!
//! A [`SymbolSolver`] answers the questions the extraction visitors ask about
//! a file: what a type name denotes at some position, what the static type of
//! an expression is, and which method a call binds to. Everything it needs
//! comes from the unit itself and the shared [`TypeResolver`].

use crate::parsing::syntax::{MethodDecl, SyntaxUnit, TypeKind, TypeSyntax};
use crate::resolution::resolver::TypeResolver;
use crate::resolution::types::{DeclarationHandle, Primitive, Resolution, ResolvedType};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::Arc;
use tree_sitter::Node;

const MAX_NESTING: u32 = 32;

/// Where a name is being looked up.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub unit: &'a Arc<SyntaxUnit>,
    /// Innermost type declaration around the position
    pub enclosing: Option<usize>,
    /// Method of `enclosing` around the position
    pub method: Option<usize>,
    pub byte: Option<usize>,
    /// Resolving the header of `enclosing`: its own members are not visible
    pub header: bool,
}

impl<'a> Scope<'a> {
    pub fn at(unit: &'a Arc<SyntaxUnit>, byte: usize) -> Self {
        let enclosing = unit.enclosing_type(byte);
        let method = enclosing.and_then(|index| unit.enclosing_method(index, byte));
        Self {
            unit,
            enclosing,
            method,
            byte: Some(byte),
            header: false,
        }
    }

    pub fn body(unit: &'a Arc<SyntaxUnit>, index: usize) -> Self {
        Self {
            unit,
            enclosing: Some(index),
            method: None,
            byte: None,
            header: false,
        }
    }

    pub fn header(unit: &'a Arc<SyntaxUnit>, index: usize) -> Self {
        Self {
            header: true,
            ..Self::body(unit, index)
        }
    }

    pub fn method_signature(unit: &'a Arc<SyntaxUnit>, index: usize, method: usize) -> Self {
        Self {
            method: Some(method),
            byte: unit.types[index]
                .methods
                .get(method)
                .map(|m| m.byte_range.start),
            ..Self::body(unit, index)
        }
    }

    fn method_decl(&self) -> Option<&'a MethodDecl> {
        let index = self.enclosing?;
        self.unit.types.get(index)?.methods.get(self.method?)
    }

    /// Enclosing type indices, innermost first.
    fn chain(&self) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = self.enclosing;
        while let Some(index) = current {
            chain.push(index);
            current = self.unit.types.get(index).and_then(|decl| decl.parent);
        }
        chain
    }
}

pub struct SymbolSolver<'r> {
    pub(crate) resolver: &'r TypeResolver,
    pub(crate) unit: Arc<SyntaxUnit>,
    supertypes: RefCell<FxHashMap<String, Arc<Vec<DeclarationHandle>>>>,
    depth: Cell<u32>,
}

impl<'r> SymbolSolver<'r> {
    pub fn new(resolver: &'r TypeResolver, unit: Arc<SyntaxUnit>) -> Self {
        Self {
            resolver,
            unit,
            supertypes: RefCell::new(FxHashMap::default()),
            depth: Cell::new(0),
        }
    }

    pub fn unit(&self) -> &Arc<SyntaxUnit> {
        &self.unit
    }

    /// Resolve a type node (simple, scoped, generic or array type) in the
    /// scope of its position.
    pub fn resolve_type_node(&self, node: Node<'_>) -> Resolution<ResolvedType> {
        let text = self.unit.text(node);
        match TypeSyntax::from_node(node, &self.unit.source) {
            Some(syntax) => {
                let unit = Arc::clone(&self.unit);
                self.resolve_syntax(&Scope::at(&unit, node.start_byte()), &syntax)
            }
            None => Resolution::Unresolved(format!("Unsolved symbol : {text}")),
        }
    }

    /// Resolve a possibly qualified type name as seen at `byte` in this unit.
    pub fn resolve_name_at(&self, name: &str, byte: usize) -> Resolution<ResolvedType> {
        let unit = Arc::clone(&self.unit);
        let segments: Vec<String> = name.split('.').map(str::to_string).collect();
        self.resolve_type_name(&Scope::at(&unit, byte), &segments)
    }

    pub(crate) fn resolve_syntax(
        &self,
        scope: &Scope<'_>,
        syntax: &TypeSyntax,
    ) -> Resolution<ResolvedType> {
        match syntax {
            TypeSyntax::Primitive(keyword) => match Primitive::from_keyword(keyword) {
                Some(primitive) => Resolution::Resolved(ResolvedType::Primitive(primitive)),
                None => Resolution::Unresolved(format!("Unknown primitive {keyword}")),
            },
            TypeSyntax::Void => Resolution::Resolved(ResolvedType::Void),
            TypeSyntax::Array {
                element,
                dimensions,
            } => self
                .resolve_syntax(scope, element)
                .map(|element| ResolvedType::array_of(element, *dimensions)),
            TypeSyntax::Named(segments) => self.resolve_type_name(scope, segments),
            TypeSyntax::Inferred => {
                Resolution::Unsupported("Cannot resolve var without an initializer".to_string())
            }
        }
    }

    pub(crate) fn resolve_type_name(
        &self,
        scope: &Scope<'_>,
        segments: &[String],
    ) -> Resolution<ResolvedType> {
        let Some((first, rest)) = segments.split_first() else {
            return Resolution::Unresolved("Unsolved symbol : ".to_string());
        };
        let full_name = segments.join(".");

        match self.resolve_simple_name(scope, first) {
            Resolution::Resolved(ResolvedType::Reference(mut handle)) => {
                for segment in rest {
                    match self.member_type(&handle, segment) {
                        Some(member) => handle = member,
                        None => {
                            return Resolution::Unresolved(format!(
                                "Unsolved symbol : {full_name}"
                            ));
                        }
                    }
                }
                Resolution::Resolved(ResolvedType::Reference(handle))
            }
            Resolution::Resolved(ResolvedType::TypeVariable(name)) if rest.is_empty() => {
                Resolution::Resolved(ResolvedType::TypeVariable(name))
            }
            Resolution::Ambiguous(message) => Resolution::Ambiguous(message),
            _ if rest.is_empty() => Resolution::Unresolved(format!("Unsolved symbol : {first}")),
            _ => match self.resolver.solve_type(&full_name).into_handle() {
                Some(handle) => Resolution::Resolved(ResolvedType::Reference(handle)),
                None => Resolution::Unresolved(format!("Unsolved symbol : {full_name}")),
            },
        }
    }

    /// Single identifier lookup, innermost scope first.
    fn resolve_simple_name(&self, scope: &Scope<'_>, name: &str) -> Resolution<ResolvedType> {
        if self.is_type_variable(scope, name) {
            return Resolution::Resolved(ResolvedType::TypeVariable(name.to_string()));
        }

        let unit = scope.unit;
        for index in scope.chain() {
            let decl = &unit.types[index];
            let own_header = scope.header && Some(index) == scope.enclosing;
            if !own_header {
                if let Some(local) = self.visible_local_type(scope, index, name) {
                    return reference(Arc::clone(unit), local);
                }
                let handle = DeclarationHandle::Source {
                    unit: Arc::clone(unit),
                    index,
                };
                if let Some(member) = self.member_type(&handle, name) {
                    return Resolution::Resolved(ResolvedType::Reference(member));
                }
            }
            if decl.name == name {
                return reference(Arc::clone(unit), index);
            }
        }

        if let Some((index, _)) = unit.top_level_types().find(|(_, decl)| decl.name == name) {
            return reference(Arc::clone(unit), index);
        }

        for import in unit.imports.iter().filter(|import| !import.on_demand) {
            if import.simple_name() == name
                && let Some(handle) = self.resolver.solve_type(&import.path).into_handle()
            {
                return Resolution::Resolved(ResolvedType::Reference(handle));
            }
        }

        let same_package = if unit.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", unit.package)
        };
        if let Some(handle) = self.resolver.solve_type(&same_package).into_handle() {
            return Resolution::Resolved(ResolvedType::Reference(handle));
        }

        let mut matches: Vec<DeclarationHandle> = Vec::new();
        for import in unit.imports.iter().filter(|import| import.on_demand) {
            let candidate = self
                .resolver
                .solve_type(&format!("{}.{name}", import.path))
                .into_handle()
                .or_else(|| {
                    let container = self.resolver.solve_type(&import.path).into_handle()?;
                    self.member_type(&container, name)
                });
            if let Some(handle) = candidate
                && !matches.contains(&handle)
            {
                matches.push(handle);
            }
        }
        match matches.len() {
            0 => {}
            1 => {
                if let Some(handle) = matches.pop() {
                    return Resolution::Resolved(ResolvedType::Reference(handle));
                }
            }
            _ => {
                let names: Vec<&str> = matches.iter().map(|h| h.qualified_name()).collect();
                return Resolution::Ambiguous(format!(
                    "Ambiguous name {name}: {}",
                    names.join(", ")
                ));
            }
        }

        match self
            .resolver
            .solve_type(&format!("java.lang.{name}"))
            .into_handle()
        {
            Some(handle) => Resolution::Resolved(ResolvedType::Reference(handle)),
            None => Resolution::Unresolved(format!("Unsolved symbol : {name}")),
        }
    }

    fn is_type_variable(&self, scope: &Scope<'_>, name: &str) -> bool {
        if let Some(method) = scope.method_decl()
            && method.type_parameters.iter().any(|p| p.name == name)
        {
            return true;
        }

        for index in scope.chain() {
            let decl = &scope.unit.types[index];
            if decl.type_parameters.iter().any(|p| p.name == name) {
                return true;
            }
            // Generic methods around a local type
            if let Some(byte) = scope.byte
                && Some(index) != scope.enclosing
                && let Some(method) = scope.unit.enclosing_method(index, byte)
                && decl.methods[method]
                    .type_parameters
                    .iter()
                    .any(|p| p.name == name)
            {
                return true;
            }
        }
        false
    }

    /// A local type declared in the method of `owner` around the position,
    /// before the position.
    fn visible_local_type(&self, scope: &Scope<'_>, owner: usize, name: &str) -> Option<usize> {
        let byte = scope.byte?;
        let unit = scope.unit;
        let method = unit.enclosing_method(owner, byte)?;
        unit.types.iter().enumerate().find_map(|(index, decl)| {
            (decl.is_local()
                && decl.parent == Some(owner)
                && decl.name == name
                && decl.byte_range.start < byte
                && unit.enclosing_method(owner, decl.byte_range.start) == Some(method))
            .then_some(index)
        })
    }

    /// Member type of `owner` or of one of its supertypes.
    pub fn member_type(&self, owner: &DeclarationHandle, name: &str) -> Option<DeclarationHandle> {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([owner.clone()]);

        while let Some(handle) = queue.pop_front() {
            if !visited.insert(handle.key()) {
                continue;
            }
            if let DeclarationHandle::Source { unit, index } = &handle
                && let Some(member) = unit.member_named(*index, name)
            {
                return Some(DeclarationHandle::Source {
                    unit: Arc::clone(unit),
                    index: member,
                });
            }
            queue.extend(self.direct_supertypes(&handle).iter().cloned());
        }
        None
    }

    /// Declared supertypes, with the implicit superclass of classes, enums and
    /// records filled in.
    pub fn direct_supertypes(&self, handle: &DeclarationHandle) -> Arc<Vec<DeclarationHandle>> {
        let key = handle.key();
        if let Some(cached) = self.supertypes.borrow().get(&key) {
            return Arc::clone(cached);
        }
        if self.depth.get() >= MAX_NESTING {
            return Arc::new(Vec::new());
        }

        self.depth.set(self.depth.get() + 1);
        let supertypes = Arc::new(self.compute_supertypes(handle));
        self.depth.set(self.depth.get() - 1);

        self.supertypes
            .borrow_mut()
            .insert(key, Arc::clone(&supertypes));
        supertypes
    }

    fn compute_supertypes(&self, handle: &DeclarationHandle) -> Vec<DeclarationHandle> {
        let mut supertypes = Vec::new();
        match handle {
            DeclarationHandle::Source { unit, index } => {
                let decl = &unit.types[*index];
                let scope = Scope::header(unit, *index);
                for syntax in decl.superclass.iter().chain(decl.interfaces.iter()) {
                    if let Resolution::Resolved(ResolvedType::Reference(resolved)) =
                        self.resolve_syntax(&scope, syntax)
                    {
                        supertypes.push(resolved);
                    }
                }
                if decl.superclass.is_none() {
                    let implicit = match decl.kind {
                        TypeKind::Class => Some("java.lang.Object"),
                        TypeKind::Enum => Some("java.lang.Enum"),
                        TypeKind::Record => Some("java.lang.Record"),
                        TypeKind::Interface | TypeKind::Annotation => None,
                    };
                    if let Some(implicit) = implicit
                        && decl.qualified_name.as_deref() != Some(implicit)
                        && let Some(resolved) = self.resolver.solve_type(implicit).into_handle()
                    {
                        supertypes.push(resolved);
                    }
                }
            }
            DeclarationHandle::External(external) => {
                for name in external.superclass.iter().chain(external.interfaces.iter()) {
                    if let Some(resolved) = self.resolver.solve_type(name).into_handle() {
                        supertypes.push(resolved);
                    }
                }
            }
        }
        supertypes
    }

    /// `handle` followed by all of its supertypes, breadth first, ending with
    /// `java.lang.Object` when it is known.
    pub fn hierarchy(&self, handle: &DeclarationHandle) -> Vec<DeclarationHandle> {
        let mut visited = FxHashSet::default();
        let mut ordered = Vec::new();
        let mut queue = VecDeque::from([handle.clone()]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.key()) {
                continue;
            }
            queue.extend(self.direct_supertypes(&current).iter().cloned());
            ordered.push(current);
        }

        if !visited.contains("java.lang.Object")
            && let Some(object) = self.resolver.solve_type("java.lang.Object").into_handle()
        {
            ordered.push(object);
        }
        ordered
    }

    pub fn is_subtype(&self, sub: &DeclarationHandle, sup: &DeclarationHandle) -> bool {
        sup.qualified_name() == "java.lang.Object"
            || self
                .hierarchy(sub)
                .iter()
                .any(|ancestor| ancestor == sup)
    }

    /// Type written in an external signature. Single-segment names that are
    /// not primitives are type variables.
    pub(crate) fn resolve_signature(&self, signature: &str) -> Resolution<ResolvedType> {
        match TypeSyntax::parse_signature(signature) {
            TypeSyntax::Array {
                element,
                dimensions,
            } => self
                .resolve_signature(&element.to_string())
                .map(|element| ResolvedType::array_of(element, dimensions)),
            TypeSyntax::Named(segments) if segments.len() == 1 => {
                Resolution::Resolved(ResolvedType::TypeVariable(segments.join(".")))
            }
            TypeSyntax::Named(segments) => {
                let name = segments.join(".");
                match self.resolver.solve_type(&name).into_handle() {
                    Some(handle) => Resolution::Resolved(ResolvedType::Reference(handle)),
                    None => Resolution::Unresolved(format!("Unsolved symbol : {name}")),
                }
            }
            TypeSyntax::Primitive(keyword) => Primitive::from_keyword(&keyword)
                .map(|p| Resolution::Resolved(ResolvedType::Primitive(p)))
                .unwrap_or_else(|| Resolution::Unresolved(format!("Unknown primitive {keyword}"))),
            TypeSyntax::Void => Resolution::Resolved(ResolvedType::Void),
            TypeSyntax::Inferred => Resolution::Unsupported("var in signature".to_string()),
        }
    }

    /// Static type of field `name` in `owner` or its supertypes.
    pub fn field_type(
        &self,
        owner: &DeclarationHandle,
        name: &str,
    ) -> Option<Resolution<ResolvedType>> {
        for handle in self.hierarchy(owner) {
            match &handle {
                DeclarationHandle::Source { unit, index } => {
                    if let Some(field) = unit.types[*index].fields.iter().find(|f| f.name == name)
                    {
                        return Some(self.resolve_syntax(&Scope::body(unit, *index), &field.ty));
                    }
                }
                DeclarationHandle::External(external) => {
                    if let Some(field) = external.fields.iter().find(|f| f.name == name) {
                        return Some(self.resolve_signature(&field.ty));
                    }
                }
            }
        }
        None
    }

    /// The type whose body encloses `byte`, as a handle.
    pub fn enclosing_handle(&self, byte: usize) -> Option<DeclarationHandle> {
        self.unit
            .enclosing_type(byte)
            .map(|index| DeclarationHandle::Source {
                unit: Arc::clone(&self.unit),
                index,
            })
    }

    /// Enclosing types around `byte`, innermost first.
    pub(crate) fn enclosing_handles(&self, byte: usize) -> Vec<DeclarationHandle> {
        Scope::at(&self.unit, byte)
            .chain()
            .into_iter()
            .map(|index| DeclarationHandle::Source {
                unit: Arc::clone(&self.unit),
                index,
            })
            .collect()
    }
}

fn reference(unit: Arc<SyntaxUnit>, index: usize) -> Resolution<ResolvedType> {
    Resolution::Resolved(ResolvedType::Reference(DeclarationHandle::Source {
        unit,
        index,
    }))
}
