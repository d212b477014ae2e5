//! Process Models
//!
//! Graph-based process models produced by discovery
pub mod process_graph;
