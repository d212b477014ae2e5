#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]
#![doc = include_str!("../README.md")]

/// Event data, IO and process graphs
pub mod core;

/// Conformance checking of process graphs against event logs
pub mod conformance;

/// Process discovery
pub mod discovery;

/// Util module with smaller helper functions
pub mod utils;

#[doc(inline)]
pub use crate::core::{
    event_data::{csv_import::import_csv, Activity, EventLog, Frequency, TransitionTable},
    io::Importable,
    process_models::process_graph::ProcessGraph,
};

#[doc(inline)]
pub use discovery::fuzzy::{
    AggregationConfig, AggregationHeuristic, AggregationType, FuzzyMinerError, Grid,
    OptimalRates, OptimizerConfig,
};

#[doc(inline)]
pub use conformance::{ActivityDependencyStructure, Dependency, DependencyClassifier};
