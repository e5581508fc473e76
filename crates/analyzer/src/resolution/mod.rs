pub mod cache;
pub mod expressions;
pub mod external;
pub mod index;
pub mod methods;
pub mod resolver;
pub mod store;
pub mod symbols;
pub mod types;

pub use cache::{CacheSizes, Lookup, ResolutionCache};
pub use expressions::Receiver;
pub use external::{ExternalType, ExternalTypeSolver, NoExternalTypes, PlatformTypes};
pub use index::{IndexOptions, SourceIndex};
pub use methods::MethodRef;
pub use resolver::TypeResolver;
pub use store::UnitStore;
pub use symbols::SymbolSolver;
pub use types::{DeclarationHandle, Primitive, Resolution, ResolutionResult, ResolvedType};
