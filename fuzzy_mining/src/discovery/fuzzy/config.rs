use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::{check_ratio, FuzzyMinerError};

/// How meta-states are placed into the model during aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    /// Meta-states are added next to their constituent activities
    #[default]
    Outer,
    /// Constituent activities are absorbed by their meta-states
    Inner,
}

/// Which meta-states absorb their constituents in [`AggregationType::Inner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationHeuristic {
    /// Every meta-state
    #[default]
    All,
    /// Only meta-states covering at least as many cases as each of their constituents
    Frequent,
}

impl FromStr for AggregationType {
    type Err = FuzzyMinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outer" => Ok(Self::Outer),
            "inner" => Ok(Self::Inner),
            _ => Err(FuzzyMinerError::InvalidParameter(format!(
                "Invalid aggregation type '{s}'"
            ))),
        }
    }
}

impl FromStr for AggregationHeuristic {
    type Err = FuzzyMinerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "frequent" => Ok(Self::Frequent),
            _ => Err(FuzzyMinerError::InvalidParameter(format!(
                "Invalid heuristic '{s}'"
            ))),
        }
    }
}

impl Display for AggregationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outer => write!(f, "outer"),
            Self::Inner => write!(f, "inner"),
        }
    }
}

impl Display for AggregationHeuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Frequent => write!(f, "frequent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Parameters for cycle aggregation
pub struct AggregationConfig {
    /// Placement of meta-states
    pub agg_type: AggregationType,
    /// Selection of absorbing meta-states (only used for [`AggregationType::Inner`])
    pub heuristic: AggregationHeuristic,
    /// Choose the rotation of a cycle by traversing the model from start
    pub pre_traverse: bool,
    /// Orient cycles by traversal order and only rewrite that exact sequence (not its rotations)
    pub ordered: bool,
    /// Minimal share of cases a cycle must occur in to become a meta-state
    pub cycle_rel: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            agg_type: AggregationType::Outer,
            heuristic: AggregationHeuristic::All,
            pre_traverse: false,
            ordered: false,
            cycle_rel: 0.5,
        }
    }
}

impl AggregationConfig {
    /// Validate parameter ranges
    pub fn validate(&self) -> Result<(), FuzzyMinerError> {
        check_ratio("cycle_rel", self.cycle_rel)
    }
    /// Serialize aggregation parameters to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
    /// Deserialize aggregation parameters from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Search space of the quality optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grid {
    /// Rates `0, step, 2 * step, ...` up to `100`
    Step(u32),
    /// Explicit list of rates
    Points(Vec<f64>),
}

impl Grid {
    /// Rates of this grid (used for both activity and path rates)
    pub fn rates(&self) -> Result<Vec<f64>, FuzzyMinerError> {
        let rates: Vec<f64> = match self {
            Grid::Step(0) => {
                return Err(FuzzyMinerError::InvalidParameter(
                    "grid step must be positive".to_string(),
                ))
            }
            Grid::Step(step) => (0..=100).step_by(*step as usize).map(f64::from).collect(),
            Grid::Points(points) => points.clone(),
        };
        if rates.is_empty() {
            return Err(FuzzyMinerError::InvalidParameter(
                "grid must contain at least one rate".to_string(),
            ));
        }
        Ok(rates)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Parameters for the quality optimizer
pub struct OptimizerConfig {
    /// Weight of the complexity term (`0`: only replayability, `1`: only simplicity)
    pub lambda: f64,
    /// Grid of candidate rates
    pub grid: Grid,
    /// Print progress to stdout
    pub verbose: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            lambda: 0.5,
            grid: Grid::Step(10),
            verbose: false,
        }
    }
}

impl OptimizerConfig {
    /// Serialize optimizer parameters to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
    /// Deserialize optimizer parameters from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
