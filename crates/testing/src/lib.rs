pub mod source_tree;

pub use source_tree::{TestSourceTree, copy_dir_all, fixtures_dir};
