pub mod file_info;
pub mod io;
pub mod layout;
pub mod roots;
pub mod source;

pub use file_info::FileInfo;
pub use layout::OutputLayout;
pub use roots::SourceRoots;
pub use source::{FileSource, PathFileSource};
