use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::core::{
    event_data::{Activity, EventLog, TransitionTable},
    process_models::process_graph::ProcessGraph,
};

/// How a transition relates to the cases of a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dependency {
    /// Observed in every case
    Always,
    /// Observed in some, but not all cases
    Sometimes,
    /// Never observed
    Never,
}

/// Classifies pairs of activities into a [`Dependency`]
pub trait DependencyClassifier {
    /// Classify the transition `from -> to`
    fn classify(&self, from: &Activity, to: &Activity) -> Dependency;
}

///
/// Activity dependency structure (ADS) of an event log
///
/// Classifies transitions (including those from [`Activity::Start`] and to [`Activity::End`])
/// by the share of cases they are observed in.
///
#[derive(Debug, Clone, Default)]
pub struct ActivityDependencyStructure {
    dependencies: HashMap<(Activity, Activity), Dependency>,
}

impl ActivityDependencyStructure {
    /// Build the ADS of `log` from its transition table (without virtual boundaries)
    pub fn from_log(log: &EventLog, table: &TransitionTable) -> Self {
        Self::from_extended_table(&table.with_boundaries(log), log.num_cases())
    }

    fn from_extended_table(table: &TransitionTable, case_cnt: usize) -> Self {
        let dependencies = table
            .iter()
            .map(|(from, to, freq)| {
                let dependency = if freq.cases as usize == case_cnt {
                    Dependency::Always
                } else if freq.cases > 0 {
                    Dependency::Sometimes
                } else {
                    Dependency::Never
                };
                ((from.clone(), to.clone()), dependency)
            })
            .collect();
        Self { dependencies }
    }
}

impl DependencyClassifier for ActivityDependencyStructure {
    fn classify(&self, from: &Activity, to: &Activity) -> Dependency {
        self.dependencies
            .get(&(from.clone(), to.clone()))
            .copied()
            .unwrap_or(Dependency::Never)
    }
}

/// Source or target of an edge as the activities it stands for
fn endpoint_activities(act: &Activity) -> Vec<&Activity> {
    if act.is_meta() {
        act.constituents().iter().collect()
    } else {
        vec![act]
    }
}

/// Internal cyclic transitions of a meta-state (chain plus closing transition)
fn internal_edges(meta: &Activity) -> Vec<(Activity, Activity)> {
    let constituents = meta.constituents();
    let (Some(first), Some(last)) = (constituents.first(), constituents.last()) else {
        return Vec::new();
    };
    constituents
        .iter()
        .tuple_windows()
        .map(|(a, b)| (a.clone(), b.clone()))
        .chain(std::iter::once((last.clone(), first.clone())))
        .collect()
}

impl ProcessGraph {
    ///
    /// Edges of the graph with meta-state endpoints expanded into the transitions between
    /// their constituent activities
    ///
    pub fn expanded_edges(&self) -> HashSet<(Activity, Activity)> {
        let mut expanded = HashSet::new();
        for (from, to) in self.edges.keys() {
            for (a, b) in endpoint_activities(from)
                .into_iter()
                .cartesian_product(endpoint_activities(to))
            {
                expanded.insert((a.clone(), b.clone()));
            }
            for endpoint in [from, to] {
                if endpoint.is_meta() {
                    expanded.extend(internal_edges(endpoint));
                }
            }
        }
        expanded
    }

    ///
    /// Loss-based fitness of the graph on `log` (0 means perfect replay)
    ///
    /// Every transition of a trace (including those from start and to end) that is not an
    /// edge of the graph adds a loss, and so does every edge of the graph. The loss of a
    /// transition is `1` if the `ads` classifies it as [`Dependency::Always`], its share of
    /// cases if [`Dependency::Sometimes`] and a small epsilon (`10^-digits(|cases|)`) otherwise.
    ///
    /// `table` is the transition table of `log` and `ads` defaults to the
    /// [`ActivityDependencyStructure`] of `log`.
    ///
    pub fn fitness(
        &self,
        log: &EventLog,
        table: Option<&TransitionTable>,
        ads: Option<&dyn DependencyClassifier>,
    ) -> f64 {
        let case_cnt = log.num_cases();
        let table = match table {
            Some(table) => table.with_boundaries(log),
            None => TransitionTable::from_log(log).with_boundaries(log),
        };
        let default_ads;
        let ads: &dyn DependencyClassifier = match ads {
            Some(ads) => ads,
            None => {
                default_ads = ActivityDependencyStructure::from_extended_table(&table, case_cnt);
                &default_ads
            }
        };
        let eps = 10f64.powi(-(case_cnt.to_string().len() as i32));
        let loss = |from: &Activity, to: &Activity| match ads.classify(from, to) {
            Dependency::Always => 1.0,
            Dependency::Sometimes => table
                .get(from, to)
                .map_or(0.0, |freq| freq.cases as f64 / case_cnt as f64),
            Dependency::Never => eps,
        };

        let expanded = self.expanded_edges();
        let mut losses = 0.0;
        for trace in log.traces() {
            let (Some(first), Some(last)) = (trace.first(), trace.last()) else {
                continue;
            };
            let start = (Activity::Start, first.clone());
            let end = (last.clone(), Activity::End);
            let inner = trace.iter().cloned().tuple_windows::<(_, _)>();
            for (a, b) in std::iter::once(start).chain(inner).chain(std::iter::once(end)) {
                if !expanded.contains(&(a.clone(), b.clone())) {
                    losses += loss(&a, &b);
                }
            }
        }
        // Sorted, so that the sum does not depend on hash order
        for (a, b) in expanded.iter().sorted() {
            losses += loss(a, b);
        }
        tracing::debug!(losses, edges = expanded.len(), "Computed fitness");
        losses
    }
}
