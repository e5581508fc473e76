use crate::parsing::syntax::SyntaxUnit;
use crate::resolution::external::ExternalTypeSolver;
use crate::resolution::index::SourceIndex;
use crate::resolution::symbols::SymbolSolver;
use crate::resolution::types::{DeclarationHandle, ResolutionResult};
use std::sync::Arc;

/// Joins the source index and the external symbol table into one resolver.
///
/// Both are peers: a name found in the sources wins, anything else is offered
/// to the external solver. The resolver is built once before extraction
/// starts and shared by reference.
pub struct TypeResolver {
    index: SourceIndex,
    external: Box<dyn ExternalTypeSolver>,
}

impl TypeResolver {
    pub fn new(index: SourceIndex, external: Box<dyn ExternalTypeSolver>) -> Self {
        Self { index, external }
    }

    pub fn index(&self) -> &SourceIndex {
        &self.index
    }

    pub fn solve_type(&self, qualified_name: &str) -> ResolutionResult {
        match self.index.resolve(qualified_name) {
            ResolutionResult::Unresolved => self
                .external
                .solve_external(qualified_name)
                .map(|external| ResolutionResult::Resolved(DeclarationHandle::External(external)))
                .unwrap_or(ResolutionResult::Unresolved),
            resolved => resolved,
        }
    }

    pub fn solver(&self, unit: Arc<SyntaxUnit>) -> SymbolSolver<'_> {
        SymbolSolver::new(self, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::roots::SourceRoots;
    use crate::resolution::external::{NoExternalTypes, PlatformTypes};
    use crate::resolution::index::IndexOptions;
    use crate::resolution::store::UnitStore;
    use tempfile::TempDir;

    fn resolver(dir: &TempDir, external: Box<dyn ExternalTypeSolver>) -> TypeResolver {
        let index = SourceIndex::new(
            SourceRoots::new([dir.path()]).unwrap(),
            UnitStore::new(),
            IndexOptions::default(),
        );
        TypeResolver::new(index, external)
    }

    #[test]
    fn test_sources_take_precedence_over_platform() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("java/lang")).unwrap();
        std::fs::write(
            temp_dir.path().join("java/lang/String.java"),
            "package java.lang; public final class String {}",
        )
        .unwrap();

        let resolver = resolver(&temp_dir, Box::new(PlatformTypes::jdk()));
        let result = resolver.solve_type("java.lang.String");

        assert!(matches!(
            result,
            ResolutionResult::Resolved(DeclarationHandle::Source { .. })
        ));
    }

    #[test]
    fn test_platform_types_answer_misses() {
        let temp_dir = TempDir::new().unwrap();

        let with_jdk = resolver(&temp_dir, Box::new(PlatformTypes::jdk()));
        assert!(matches!(
            with_jdk.solve_type("java.util.List"),
            ResolutionResult::Resolved(DeclarationHandle::External(_))
        ));

        let without = resolver(&temp_dir, Box::new(NoExternalTypes));
        assert_eq!(
            without.solve_type("java.util.List"),
            ResolutionResult::Unresolved
        );
    }
}
