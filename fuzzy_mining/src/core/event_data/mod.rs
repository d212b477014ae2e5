//! Event Data
//!
//! Event logs reduced to activity sequences and their directly-follows tally
pub mod csv_import;
pub(crate) mod event_log_struct;
pub mod transition_table;

#[doc(inline)]
pub use event_log_struct::*;
#[doc(inline)]
pub use transition_table::{Frequency, TransitionTable};
