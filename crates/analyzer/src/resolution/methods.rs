//! Binding method invocations to declarations.
//!
//! Overload selection follows the three applicability phases of Java: strict
//! invocation, loose invocation (boxing), then variable arity. Within the
//! first phase that finds anything, the most specific method wins. Generic
//! types are erased, so type variables accept any argument.

use crate::parsing::syntax::{Position, SyntaxUnit, compact_text};
use crate::resolution::expressions::Receiver;
use crate::resolution::symbols::{Scope, SymbolSolver};
use crate::resolution::types::{DeclarationHandle, Resolution, ResolvedType};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tree_sitter::Node;

/// The declaration a call binds to, as written into the `lines` report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub parameter_types: Vec<String>,
    /// Name position of a source declaration; `None` for external methods
    pub declaration_position: Option<Position>,
}

enum Origin {
    Source {
        unit: Arc<SyntaxUnit>,
        type_index: usize,
        method_index: usize,
    },
    External {
        return_type: String,
    },
}

struct Candidate {
    owner: DeclarationHandle,
    name: String,
    parameters: Vec<Resolution<ResolvedType>>,
    varargs: bool,
    origin: Origin,
}

impl Candidate {
    fn signature(&self) -> String {
        self.parameters
            .iter()
            .map(|parameter| match parameter {
                Resolution::Resolved(ty) => ty.describe(),
                _ => "?".to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Declared parameter for argument `position`, expanding a variadic tail
    /// when `expanded` is set.
    fn parameter_for(&self, position: usize, expanded: bool) -> Option<Resolution<ResolvedType>> {
        let last = self.parameters.len().checked_sub(1)?;
        if expanded && self.varargs && position >= last {
            return Some(match &self.parameters[last] {
                Resolution::Resolved(ResolvedType::Array(component)) => {
                    Resolution::Resolved((**component).clone())
                }
                other => other.clone(),
            });
        }
        self.parameters.get(position).cloned()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Strict,
    Loose,
    Variable,
}

impl SymbolSolver<'_> {
    /// Resolve the callee of a `method_invocation` node.
    pub fn resolve_call(&self, call: Node<'_>) -> Resolution<MethodRef> {
        self.select_method(call).and_then(|candidate| {
            let mut parameter_types = Vec::with_capacity(candidate.parameters.len());
            for parameter in &candidate.parameters {
                match parameter {
                    Resolution::Resolved(ty) => parameter_types.push(ty.describe()),
                    failed => {
                        return Resolution::Unresolved(
                            failed.message().unwrap_or("Unresolved parameter").to_string(),
                        );
                    }
                }
            }
            let declaration_position = match &candidate.origin {
                Origin::Source {
                    unit,
                    type_index,
                    method_index,
                } => Some(unit.types[*type_index].methods[*method_index].name_position),
                Origin::External { .. } => None,
            };
            Resolution::Resolved(MethodRef {
                owner: candidate.owner.qualified_name().to_string(),
                name: candidate.name,
                parameter_types,
                declaration_position,
            })
        })
    }

    pub fn call_return_type(&self, call: Node<'_>) -> Resolution<ResolvedType> {
        self.select_method(call)
            .and_then(|candidate| match &candidate.origin {
                Origin::Source {
                    unit,
                    type_index,
                    method_index,
                } => {
                    let method = &unit.types[*type_index].methods[*method_index];
                    match &method.return_type {
                        Some(return_type) => self.resolve_syntax(
                            &Scope::method_signature(unit, *type_index, *method_index),
                            return_type,
                        ),
                        None => Resolution::Resolved(ResolvedType::Void),
                    }
                }
                Origin::External { return_type } => self.resolve_signature(return_type),
            })
    }

    /// Owner type of the receiver of a call, for the receiver row.
    pub fn receiver_owner(&self, object: Node<'_>) -> Resolution<String> {
        match object.kind() {
            "class_literal" => match object.named_child(0) {
                Some(ty) => self.resolve_type_node(ty).and_then(reference_name),
                None => Resolution::Unresolved("Malformed class literal".to_string()),
            },
            _ => self.receiver(object).and_then(|receiver| match receiver {
                Receiver::Type(handle) => {
                    Resolution::Resolved(handle.qualified_name().to_string())
                }
                Receiver::Value(ty) => reference_name(ty),
            }),
        }
    }

    fn select_method(&self, call: Node<'_>) -> Resolution<Candidate> {
        let Some(name_node) = call.child_by_field_name("name") else {
            return Resolution::Unresolved(format!(
                "Malformed call {}",
                compact_text(self.unit.text(call))
            ));
        };
        let name = self.unit.text(name_node);

        let arguments: Vec<Option<ResolvedType>> = call
            .child_by_field_name("arguments")
            .map(|list| {
                let mut cursor = list.walk();
                list.named_children(&mut cursor)
                    .filter(|argument| !argument.is_extra())
                    .map(|argument| self.expression_type(argument).ok())
                    .collect()
            })
            .unwrap_or_default();

        let owners = match call.child_by_field_name("object") {
            Some(object) if object.kind() == "super" => {
                match self.expression_type(object) {
                    Resolution::Resolved(ResolvedType::Reference(superclass)) => vec![superclass],
                    other => return other.and_then(|_| unknown_receiver(name)),
                }
            }
            Some(object) => match self.receiver(object) {
                Resolution::Resolved(Receiver::Type(owner)) => vec![owner],
                Resolution::Resolved(Receiver::Value(ty)) => match ty {
                    ResolvedType::Reference(owner) => vec![owner],
                    ResolvedType::Array(_) => {
                        match self.resolver.solve_type("java.lang.Object").into_handle() {
                            Some(object) => vec![object],
                            None => return unknown_receiver(name),
                        }
                    }
                    ResolvedType::TypeVariable(variable) => {
                        return Resolution::Unsupported(format!(
                            "Type variables not supported yet: {variable}.{name}"
                        ));
                    }
                    other => {
                        return Resolution::Unresolved(format!(
                            "Cannot call {name} on {}",
                            other.describe()
                        ));
                    }
                },
                Resolution::Unresolved(message) => return Resolution::Unresolved(message),
                Resolution::Ambiguous(message) => return Resolution::Ambiguous(message),
                Resolution::Unsupported(message) => return Resolution::Unsupported(message),
            },
            None => self.unqualified_owners(call, name),
        };
        if owners.is_empty() {
            return unknown_receiver(name);
        }

        let candidates = self.candidates(&owners, name, arguments.len());
        if candidates.is_empty() {
            return Resolution::Unresolved(format!("Unsolved method {name}"));
        }

        for phase in [Phase::Strict, Phase::Loose, Phase::Variable] {
            let applicable: Vec<&Candidate> = candidates
                .iter()
                .filter(|candidate| self.is_applicable(candidate, &arguments, phase))
                .collect();
            if applicable.is_empty() {
                continue;
            }
            return self.most_specific(applicable, arguments.len(), phase, name);
        }

        Resolution::Unresolved(format!(
            "No applicable method {name}({})",
            arguments
                .iter()
                .map(|argument| argument
                    .as_ref()
                    .map(ResolvedType::describe)
                    .unwrap_or_else(|| "?".to_string()))
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    /// Types searched for an unqualified call: the innermost enclosing type
    /// with a method of that name, else statically imported owners.
    fn unqualified_owners(&self, call: Node<'_>, name: &str) -> Vec<DeclarationHandle> {
        for enclosing in self.enclosing_handles(call.start_byte()) {
            if self.has_method_named(&enclosing, name) {
                return vec![enclosing];
            }
        }

        let mut owners = Vec::new();
        for import in self.unit.imports.iter().filter(|import| import.is_static) {
            let owner = if import.on_demand {
                Some(import.path.as_str())
            } else if import.simple_name() == name {
                import.container()
            } else {
                None
            };
            if let Some(owner) = owner
                && let Some(handle) = self.resolver.solve_type(owner).into_handle()
                && self.has_method_named(&handle, name)
                && !owners.contains(&handle)
            {
                owners.push(handle);
            }
        }
        owners
    }

    fn has_method_named(&self, owner: &DeclarationHandle, name: &str) -> bool {
        self.hierarchy(owner).iter().any(|handle| match handle {
            DeclarationHandle::Source { unit, index } => unit.types[*index]
                .methods
                .iter()
                .any(|method| !method.is_constructor && method.name == name),
            DeclarationHandle::External(external) => {
                external.methods.iter().any(|method| method.name == name)
            }
        })
    }

    /// Methods named `name` that accept `arity` arguments, most derived
    /// first, overridden signatures dropped.
    fn candidates(
        &self,
        owners: &[DeclarationHandle],
        name: &str,
        arity: usize,
    ) -> Vec<Candidate> {
        let mut seen = FxHashSet::default();
        let mut candidates = Vec::new();

        for owner in owners {
            for handle in self.hierarchy(owner) {
                for candidate in self.declared_methods(&handle, name) {
                    let count = candidate.parameters.len();
                    let arity_matches = if candidate.varargs {
                        arity + 1 >= count
                    } else {
                        arity == count
                    };
                    if arity_matches && seen.insert(candidate.signature()) {
                        candidates.push(candidate);
                    }
                }
            }
        }
        candidates
    }

    fn declared_methods(&self, handle: &DeclarationHandle, name: &str) -> Vec<Candidate> {
        match handle {
            DeclarationHandle::Source { unit, index } => unit.types[*index]
                .methods
                .iter()
                .enumerate()
                .filter(|(_, method)| !method.is_constructor && method.name == name)
                .map(|(method_index, method)| {
                    let scope = Scope::method_signature(unit, *index, method_index);
                    Candidate {
                        owner: handle.clone(),
                        name: method.name.clone(),
                        parameters: method
                            .parameters
                            .iter()
                            .map(|parameter| self.resolve_syntax(&scope, &parameter.ty))
                            .collect(),
                        varargs: method.varargs,
                        origin: Origin::Source {
                            unit: Arc::clone(unit),
                            type_index: *index,
                            method_index,
                        },
                    }
                })
                .collect(),
            DeclarationHandle::External(external) => external
                .methods
                .iter()
                .filter(|method| method.name == name)
                .map(|method| Candidate {
                    owner: handle.clone(),
                    name: method.name.clone(),
                    parameters: method
                        .parameters
                        .iter()
                        .map(|parameter| self.resolve_signature(parameter))
                        .collect(),
                    varargs: method.varargs,
                    origin: Origin::External {
                        return_type: method.return_type.clone(),
                    },
                })
                .collect(),
        }
    }

    fn is_applicable(
        &self,
        candidate: &Candidate,
        arguments: &[Option<ResolvedType>],
        phase: Phase,
    ) -> bool {
        let expanded = phase == Phase::Variable;
        if expanded {
            if !candidate.varargs || arguments.len() + 1 < candidate.parameters.len() {
                return false;
            }
        } else if arguments.len() != candidate.parameters.len() {
            return false;
        }

        let loose = phase != Phase::Strict;
        arguments.iter().enumerate().all(|(position, argument)| {
            match candidate.parameter_for(position, expanded) {
                Some(parameter) => self.is_assignable(argument.as_ref(), &parameter, loose),
                None => false,
            }
        })
    }

    /// Whether a value of type `argument` may be passed as `parameter`.
    /// Unknown types on either side are accepted.
    fn is_assignable(
        &self,
        argument: Option<&ResolvedType>,
        parameter: &Resolution<ResolvedType>,
        loose: bool,
    ) -> bool {
        let (Some(argument), Resolution::Resolved(parameter)) = (argument, parameter) else {
            return true;
        };
        self.assignable(argument, parameter, loose)
    }

    fn assignable(&self, argument: &ResolvedType, parameter: &ResolvedType, loose: bool) -> bool {
        use ResolvedType::*;

        match (argument, parameter) {
            (_, TypeVariable(_)) | (TypeVariable(_), _) => true,
            (Void, _) | (_, Void) => false,
            (Null, Primitive(_)) => false,
            (Null, _) => true,
            (Primitive(from), Primitive(to)) => from.widens_to(*to),
            (Primitive(from), Reference(to)) => {
                loose
                    && match self.resolver.solve_type(from.boxed()).into_handle() {
                        Some(boxed) => self.is_subtype(&boxed, to),
                        None => to.qualified_name() == "java.lang.Object",
                    }
            }
            (Reference(from), Primitive(to)) => {
                loose
                    && crate::resolution::types::Primitive::unboxed(from.qualified_name())
                        .is_some_and(|unboxed| unboxed.widens_to(*to))
            }
            (Reference(from), Reference(to)) => self.is_subtype(from, to),
            (Array(from), Array(to)) => match (from.as_ref(), to.as_ref()) {
                (Primitive(a), Primitive(b)) => a == b,
                (Primitive(_), _) | (_, Primitive(_)) => false,
                (from, to) => self.assignable(from, to, false),
            },
            (Array(_), Reference(to)) => matches!(
                to.qualified_name(),
                "java.lang.Object" | "java.lang.Cloneable" | "java.io.Serializable"
            ),
            _ => false,
        }
    }

    fn most_specific(
        &self,
        applicable: Vec<&Candidate>,
        arity: usize,
        phase: Phase,
        name: &str,
    ) -> Resolution<Candidate> {
        let expanded = phase == Phase::Variable;
        let more_specific = |a: &Candidate, b: &Candidate| {
            let width = if expanded {
                arity.max(a.parameters.len()).max(b.parameters.len())
            } else {
                a.parameters.len()
            };
            (0..width).all(|position| {
                match (
                    a.parameter_for(position, expanded),
                    b.parameter_for(position, expanded),
                ) {
                    (Some(Resolution::Resolved(left)), Some(right)) => {
                        self.is_assignable(Some(&left), &right, false)
                    }
                    (Some(_), Some(_)) => true,
                    _ => false,
                }
            })
        };

        let maximal: Vec<&Candidate> = applicable
            .iter()
            .copied()
            .filter(|candidate| {
                applicable
                    .iter()
                    .all(|other| std::ptr::eq(*candidate, *other) || more_specific(*candidate, *other))
            })
            .collect();

        match maximal.as_slice() {
            [single] => Resolution::Resolved(self.detach(single)),
            _ => {
                let signatures: Vec<String> = applicable
                    .iter()
                    .map(|c| format!("{}.{name}({})", c.owner.qualified_name(), c.signature()))
                    .collect();
                Resolution::Ambiguous(format!(
                    "Ambiguous method call {name}: {}",
                    signatures.join(" | ")
                ))
            }
        }
    }

    fn detach(&self, candidate: &Candidate) -> Candidate {
        Candidate {
            owner: candidate.owner.clone(),
            name: candidate.name.clone(),
            parameters: candidate.parameters.clone(),
            varargs: candidate.varargs,
            origin: match &candidate.origin {
                Origin::Source {
                    unit,
                    type_index,
                    method_index,
                } => Origin::Source {
                    unit: Arc::clone(unit),
                    type_index: *type_index,
                    method_index: *method_index,
                },
                Origin::External { return_type } => Origin::External {
                    return_type: return_type.clone(),
                },
            },
        }
    }
}

fn reference_name(ty: ResolvedType) -> Resolution<String> {
    match ty {
        ResolvedType::Reference(handle) => Resolution::Resolved(handle.qualified_name().to_string()),
        ResolvedType::TypeVariable(variable) => Resolution::Unsupported(format!(
            "Type variables not supported yet: {variable}"
        )),
        other => Resolution::Unresolved(format!(
            "{} is not a reference type",
            other.describe()
        )),
    }
}

fn unknown_receiver<T>(name: &str) -> Resolution<T> {
    Resolution::Unresolved(format!("Unsolved symbol : {name}"))
}
