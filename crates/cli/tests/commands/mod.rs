//! Command integration tests

pub mod errors;
pub mod inventory;
pub mod rotate;
pub mod snap;
