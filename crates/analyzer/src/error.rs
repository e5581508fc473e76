//! Error types for the analyzer crate

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the run setup. These are fatal and are raised before any
/// work is dispatched to the worker pool.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Source root does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("Source root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No source roots configured")]
    NoRoots,

    /// Two files declare the same fully qualified type
    #[error("{name} mapped by {second} was already mapped in {first}")]
    DuplicateType {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Unknown library: {0}")]
    UnknownLibrary(String),

    #[error("Failed to read configuration file {path:?}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path:?}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Failure to turn one file into a syntax tree. Isolated to that file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to load the Java grammar: {0}")]
    Language(String),

    #[error("Parser produced no tree for {0}")]
    NoTree(PathBuf),

    #[error("Syntax error in {path} at {line}:{column}")]
    Syntax {
        path: PathBuf,
        line: u32,
        column: u32,
    },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// The output location of a source file is only defined when exactly one
    /// source root contains it
    #[error("{path:?} is contained in {matches} source roots, expected exactly one")]
    OutputLayout { path: PathBuf, matches: usize },

    #[error("Report for {0:?} was already closed")]
    Closed(PathBuf),

    #[error("{category} row does not belong in a {kind} report")]
    UnexpectedRow {
        kind: &'static str,
        category: &'static str,
    },
}

/// Fatal error for the extraction of a single file.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Malformed {kind} node at {line}:{column}: {text}")]
    MalformedNode {
        kind: String,
        line: u32,
        column: u32,
        text: String,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to enumerate source files: {0}")]
    FileSource(String),
}
