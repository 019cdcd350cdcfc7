//! CLI command implementations

pub mod config;
pub mod find;
pub mod remove;
pub mod rotate;
pub mod simulate;
pub mod snap;
