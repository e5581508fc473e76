pub mod config;
pub mod executor;

pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use executor::{AnalysisExecutor, AnalysisResult, ExtractionOutcome};
