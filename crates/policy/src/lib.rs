//! Retention policy and rotation for snapkeep
//!
//! This crate provides:
//! - The tiered retention engine (leafs, days, weeks, months, years)
//! - Rotation actions and the dispatcher that applies them

pub mod retention;
pub mod rotation;

// Re-exports
pub use retention::{evaluate, Decision, Evaluation, RetentionPolicy, Tier};
pub use rotation::{
    build_action, dispatch, Archive, DispatchSummary, Outcome, Relocate, Remove, Report,
    RotationAction,
};
