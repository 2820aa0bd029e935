//! Foundational data structures, error types, and open options.

pub mod error;
pub mod models;
pub mod options;
