//! Core modules for fuzzy process discovery

pub mod event_data;

/// IO Traits
pub mod io;

pub mod process_models;

pub use event_data::{Activity, EventLog, Frequency, TransitionTable};
pub use process_models::process_graph::ProcessGraph;
