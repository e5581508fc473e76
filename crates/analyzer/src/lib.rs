pub mod config;
pub mod error;
pub mod execution;
pub mod extraction;
pub mod parsing;
pub mod project;
pub mod report;
pub mod resolution;
pub mod runner;
pub mod stats;

#[cfg(test)]
mod tests;
