//! Fuzzy Miner
//!
//! Discovers a [`ProcessGraph`](crate::ProcessGraph) by significance-based filtering of the
//! directly-follows relation, with automatic threshold selection, cycle aggregation into
//! meta-states and connectivity repair.

/// Cycle aggregation into meta-states
pub mod aggregation;
/// Parameters of aggregation and optimization
pub mod config;
/// Reconnecting retained activities to start and end
pub mod connectivity;
/// Cycle detection on traces
pub mod cycles;
/// Error type of fuzzy discovery
pub mod error;
/// Significance-based filtering of nodes and edges
pub mod graph_filter;
/// Grid search for the filtering thresholds
pub mod optimizer;
/// Node and edge significance
pub mod significance;

pub use aggregation::reconstruct_log;
pub use config::{AggregationConfig, AggregationHeuristic, AggregationType, Grid, OptimizerConfig};
pub use cycles::Cycle;
pub use error::FuzzyMinerError;
pub use optimizer::{GridPoint, OptimalRates};
