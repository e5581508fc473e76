pub mod analyze;
pub mod resolve;
