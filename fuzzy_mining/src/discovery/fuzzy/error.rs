use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::core::event_data::Activity;

///
/// Errors that can occur during fuzzy discovery
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FuzzyMinerError {
    /// A parameter is out of range or could not be parsed
    InvalidParameter(String),
    /// No model connecting every retained activity to start and end exists for the chosen thresholds
    InfeasibleModel {
        /// Activity that could not be connected
        activity: Activity,
        /// Which direction of connectivity failed
        reason: String,
    },
}

impl Display for FuzzyMinerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuzzyMinerError::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            FuzzyMinerError::InfeasibleModel { activity, reason } => {
                write!(f, "Infeasible model: activity '{activity}' {reason}")
            }
        }
    }
}

impl std::error::Error for FuzzyMinerError {}

/// Check that a filtering rate lies within `[0, 100]`
pub(crate) fn check_rate(name: &str, rate: f64) -> Result<(), FuzzyMinerError> {
    if (0.0..=100.0).contains(&rate) {
        Ok(())
    } else {
        Err(FuzzyMinerError::InvalidParameter(format!(
            "{name} must be within [0, 100], got {rate}"
        )))
    }
}

/// Check that a ratio lies within `[0, 1]`
pub(crate) fn check_ratio(name: &str, value: f64) -> Result<(), FuzzyMinerError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FuzzyMinerError::InvalidParameter(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}
