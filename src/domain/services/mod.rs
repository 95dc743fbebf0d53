//! Domain services containing core business logic interfaces.

mod analyzer;

pub use analyzer::*;
