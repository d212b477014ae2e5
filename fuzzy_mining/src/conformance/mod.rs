//! Conformance Checking
//!
//! Scores comparing a discovered [`ProcessGraph`](crate::ProcessGraph) with the event data
//! it was discovered from.

/// Loss-based fitness and the activity dependency structure
pub mod fitness;
/// Per-trace replayability
pub mod replayability;

pub use fitness::{ActivityDependencyStructure, Dependency, DependencyClassifier};
