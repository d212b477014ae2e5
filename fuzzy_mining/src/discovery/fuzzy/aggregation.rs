use std::collections::{HashMap, HashSet};

use itertools::Itertools;

use super::{
    config::{AggregationConfig, AggregationHeuristic, AggregationType},
    cycles::{rotations, Cycle},
    error::{check_rate, FuzzyMinerError},
    significance::NodeSignificance,
};
use crate::core::{
    event_data::{Activity, EventLog, Trace, TransitionTable},
    process_models::process_graph::ProcessGraph,
};

///
/// Rewrite the traces of `log`, replacing every occurrence of a meta-state's activity sequence
/// by a single [`Activity::Meta`]
///
/// If not `ordered`, any rotation of a meta-state's sequence is replaced as well. Otherwise only
/// the exact sequence (the rotation chosen by [`ProcessGraph::find_cycles`]) is replaced.
/// Longer meta-states are matched first. `log` itself is not changed.
///
pub fn reconstruct_log(log: &EventLog, states: &[Cycle], ordered: bool) -> EventLog {
    let patterns: Vec<(Cycle, Activity)> = states
        .iter()
        .flat_map(|state| {
            let meta = Activity::Meta(state.clone());
            let variants = if ordered {
                vec![state.clone()]
            } else {
                rotations(state)
            };
            variants.into_iter().map(move |v| (v, meta.clone()))
        })
        .sorted_by_key(|(pattern, _)| std::cmp::Reverse(pattern.len()))
        .collect();

    EventLog::from_traces(log.flat_log.iter().map(|(case_id, trace)| {
        let mut rewritten: Trace = Vec::with_capacity(trace.len());
        let mut i = 0;
        while i < trace.len() {
            match patterns
                .iter()
                .find(|(pattern, _)| trace[i..].starts_with(pattern))
            {
                Some((pattern, meta)) => {
                    rewritten.push(meta.clone());
                    i += pattern.len();
                }
                None => {
                    rewritten.push(trace[i].clone());
                    i += 1;
                }
            }
        }
        (case_id.clone(), rewritten)
    }))
}

/// Meta-states absorbing their constituents, chosen by `heuristic` on an unfiltered reference graph
fn select_meta_states(
    reference: &ProcessGraph,
    metas: &[Activity],
    heuristic: AggregationHeuristic,
) -> Vec<Activity> {
    match heuristic {
        AggregationHeuristic::All => metas.to_vec(),
        AggregationHeuristic::Frequent => metas
            .iter()
            .filter(|meta| {
                let Some(meta_freq) = reference.nodes.get(*meta) else {
                    return false;
                };
                meta.constituents().iter().all(|c| {
                    reference
                        .nodes
                        .get(c)
                        .map_or(true, |freq| meta_freq.cases >= freq.cases)
                })
            })
            .cloned()
            .collect(),
    }
}

impl ProcessGraph {
    ///
    /// Aggregate significant cycles into meta-states and rediscover the graph
    ///
    /// Meta-states are found on the current graph (see [`ProcessGraph::find_states`]), the log is
    /// rewritten (see [`reconstruct_log`]) and the graph is discovered again with the given rates.
    /// `log` is not changed. The graph is only changed if aggregation succeeds.
    ///
    pub fn aggregate(
        &mut self,
        log: &EventLog,
        activity_rate: f64,
        path_rate: f64,
        config: &AggregationConfig,
    ) -> Result<(), FuzzyMinerError> {
        check_rate("activity_rate", activity_rate)?;
        check_rate("path_rate", path_rate)?;
        config.validate()?;

        let states = self.find_states(log, config.pre_traverse, config.ordered, config.cycle_rel);
        tracing::debug!(meta_states = states.len(), agg_type = %config.agg_type, "Aggregating cycles");
        let log_agg = reconstruct_log(log, &states, config.ordered);
        let table = TransitionTable::from_log(&log_agg);

        match config.agg_type {
            AggregationType::Outer => self.update(&log_agg, activity_rate, path_rate, &table, None),
            AggregationType::Inner => {
                let graph = aggregate_inner(
                    &log_agg,
                    &table,
                    &states,
                    activity_rate,
                    path_rate,
                    config.heuristic,
                )?;
                *self = graph;
                Ok(())
            }
        }
    }
}

fn aggregate_inner(
    log_agg: &EventLog,
    table: &TransitionTable,
    states: &[Cycle],
    activity_rate: f64,
    path_rate: f64,
    heuristic: AggregationHeuristic,
) -> Result<ProcessGraph, FuzzyMinerError> {
    let mut reference = ProcessGraph::new();
    reference.update(log_agg, 100.0, 100.0, table, None)?;

    let metas: Vec<Activity> = states.iter().cloned().map(Activity::Meta).collect();
    let selected = select_meta_states(&reference, &metas, heuristic);
    let absorbed: HashSet<&Activity> = selected.iter().flat_map(|m| m.constituents()).collect();

    // Filter connections: absorbed activities only live on inside their meta-states
    let mut standalone: HashMap<&Activity, u64> = HashMap::new();
    for act in log_agg.traces().flatten().filter(|a| absorbed.contains(*a)) {
        *standalone.entry(act).or_default() += 1;
    }
    let log_inner = EventLog::from_traces(log_agg.flat_log.iter().map(|(case_id, trace)| {
        (
            case_id.clone(),
            trace
                .iter()
                .filter(|a| !absorbed.contains(*a))
                .cloned()
                .collect::<Trace>(),
        )
    }));

    // A meta-state covers every case containing it or one of its absorbed constituents.
    // Cases consisting only of absorbed activities are not part of `log_inner`, so coverage is
    // counted on `log_agg`.
    let covered: HashMap<&Activity, u64> = log_inner
        .activities
        .iter()
        .map(|act| {
            let cases = if selected.contains(act) {
                let members: HashSet<&Activity> = act
                    .constituents()
                    .iter()
                    .chain(std::iter::once(act))
                    .collect();
                log_agg
                    .traces()
                    .filter(|t| t.iter().any(|a| members.contains(a)))
                    .count()
            } else {
                log_agg.traces().filter(|t| t.contains(act)).count()
            };
            (act, cases as u64)
        })
        .collect();
    let case_cnt = log_agg.num_cases() as f64;
    let significance: NodeSignificance = covered
        .iter()
        .map(|(act, cases)| ((*act).clone(), *cases as f64 / case_cnt))
        .collect();

    let mut graph = ProcessGraph::new();
    graph.update(
        &log_inner,
        activity_rate,
        path_rate,
        &TransitionTable::from_log(&log_inner),
        Some(&significance),
    )?;

    for (node, freq) in graph.nodes.iter_mut() {
        if let Some(cases) = covered.get(node) {
            freq.cases = *cases;
        }
        if !selected.contains(node) {
            continue;
        }
        freq.absolute += node
            .constituents()
            .iter()
            .map(|c| standalone.get(c).copied().unwrap_or_default())
            .sum::<u64>();
    }
    Ok(graph)
}
