pub mod declarations;
pub mod parser;
pub mod processor;
pub mod syntax;

pub use parser::parse_java;
pub use processor::{FileProcessor, ProcessingResult};
pub use syntax::{Position, SyntaxUnit, TypeDecl, TypeKind, TypeSyntax};
