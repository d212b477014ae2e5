use std::collections::{BTreeSet, HashMap};

use super::{
    connectivity::repair_connectivity,
    error::{check_rate, FuzzyMinerError},
    significance::{
        edge_significance, loop_significance, node_significance, relative_significance,
        resolve_conflicts, Direction, EdgeSignificance, NodeSignificance,
    },
};
use crate::{
    core::{
        event_data::{Activity, EventLog, Frequency, TransitionTable},
        process_models::process_graph::ProcessGraph,
    },
    utils::normalization::{normalize, normalize_nested},
};

/// Tolerance subtracted from normalized self-loop significance before comparing it to the cutoff
pub const LOOP_TOLERANCE: f64 = 0.01;

/// Add every edge whose normalized directional significance reaches the cutoff `co`
fn filter_edges(
    sig_norm: &EdgeSignificance,
    transitions: &mut BTreeSet<(Activity, Activity)>,
    co: f64,
    direction: Direction,
) {
    for (row, cols) in sig_norm {
        for (col, sig) in cols {
            if *sig >= co {
                let edge = match direction {
                    Direction::Out => (row.clone(), col.clone()),
                    Direction::In => (col.clone(), row.clone()),
                };
                transitions.insert(edge);
            }
        }
    }
}

impl ProcessGraph {
    ///
    /// Discover nodes and edges by significance-based filtering
    ///
    /// `activity_rate` and `path_rate` (both in `[0, 100]`) are inverse thresholds: the higher
    /// they are, the more activities and transitions are kept.
    /// `table` is the directly-follows tally of `log` (without virtual boundaries).
    /// `node_significance` replaces the case-coverage significance of activities, if given.
    ///
    /// The graph is only changed if the whole pipeline succeeds.
    ///
    pub fn update(
        &mut self,
        log: &EventLog,
        activity_rate: f64,
        path_rate: f64,
        table: &TransitionTable,
        node_significance: Option<&NodeSignificance>,
    ) -> Result<(), FuzzyMinerError> {
        check_rate("activity_rate", activity_rate)?;
        check_rate("path_rate", path_rate)?;
        let case_cnt = log.num_cases();

        // 1. Node filtering
        let s_node = match node_significance {
            Some(s) => s.clone(),
            None => self::node_significance(log),
        };
        let s_node_norm = normalize(&s_node);
        let retained: BTreeSet<Activity> = s_node_norm
            .iter()
            .filter(|(_, sig)| **sig >= 1.0 - activity_rate / 100.0)
            .map(|(act, _)| act.clone())
            .collect();

        // 2. Edge filtering
        let table = table.with_boundaries(log);
        let with_virtual = |extra: &[Activity]| -> BTreeSet<Activity> {
            retained.iter().chain(extra.iter()).cloned().collect()
        };
        let s_out = edge_significance(
            &table,
            &with_virtual(&[Activity::Start]),
            &with_virtual(&[Activity::End]),
            Direction::Out,
        );
        let s_in = edge_significance(
            &table,
            &with_virtual(&[Activity::End]),
            &with_virtual(&[Activity::Start]),
            Direction::In,
        );
        let s_loop = loop_significance(&table, &retained, case_cnt);
        let rel_sig = relative_significance(&s_out, &s_in);
        let s_out_norm = normalize_nested(&s_out);
        let s_in_norm = normalize_nested(&s_in);
        let s_loop_norm = normalize(&s_loop);

        let allowed = with_virtual(&[Activity::Start, Activity::End]);
        let mut transitions: BTreeSet<(Activity, Activity)> = if path_rate == 100.0 {
            table
                .iter()
                .filter(|(a, b, _)| allowed.contains(*a) && allowed.contains(*b))
                .map(|(a, b, _)| (a.clone(), b.clone()))
                .collect()
        } else {
            let co = 1.0 - path_rate / 100.0;
            let mut transitions = resolve_conflicts(&rel_sig);
            filter_edges(&s_in_norm, &mut transitions, co, Direction::In);
            filter_edges(&s_out_norm, &mut transitions, co, Direction::Out);
            for (act, sig) in &s_loop_norm {
                if sig - LOOP_TOLERANCE >= co || co == 0.0 {
                    transitions.insert((act.clone(), act.clone()));
                }
            }
            transitions
        };

        // 3. Connectivity
        let repaired = repair_connectivity(log, &retained, &mut transitions, &table, &s_out_norm)?;

        let nodes: HashMap<Activity, Frequency> = retained
            .iter()
            .map(|act| {
                let case_weighted =
                    (s_node.get(act).copied().unwrap_or_default() * case_cnt as f64).round();
                (
                    act.clone(),
                    Frequency::new(table.outgoing_absolute(act), case_weighted as u64),
                )
            })
            .collect();
        let edges: HashMap<(Activity, Activity), Frequency> = transitions
            .into_iter()
            .map(|(a, b)| {
                let freq = table.get_or_imaginary(&a, &b);
                ((a, b), freq)
            })
            .collect();

        tracing::debug!(
            activity_rate,
            path_rate,
            nodes = nodes.len(),
            edges = edges.len(),
            repaired = repaired.len(),
            "Updated process graph"
        );
        self.nodes = nodes;
        self.edges = edges;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log;

    fn act(s: &str) -> Activity {
        Activity::from(s)
    }

    fn e(a: Activity, b: Activity) -> (Activity, Activity) {
        (a, b)
    }

    fn loops_log() -> EventLog {
        event_log!("A" => ["x", "y", "x", "y"], "B" => ["x", "y"])
    }

    #[test]
    fn permissive_rates_keep_all_transitions() {
        let log = loops_log();
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        graph.update(&log, 100.0, 100.0, &table, None).unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[&act("x")], Frequency::new(3, 2));
        assert_eq!(graph.nodes[&act("y")], Frequency::new(3, 2));
        let expected: HashMap<(Activity, Activity), Frequency> = [
            (e(Activity::Start, act("x")), Frequency::new(2, 2)),
            (e(act("x"), act("y")), Frequency::new(3, 2)),
            (e(act("y"), act("x")), Frequency::new(1, 1)),
            (e(act("y"), Activity::End), Frequency::new(2, 2)),
        ]
        .into();
        assert_eq!(graph.edges, expected);
    }

    #[test]
    fn strict_path_rate_drops_weak_back_edge() {
        let log = loops_log();
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        graph.update(&log, 100.0, 0.0, &table, None).unwrap();

        assert_eq!(graph.edges.len(), 3);
        assert!(graph.contains_edge(&Activity::Start, &act("x")));
        assert!(graph.contains_edge(&act("x"), &act("y")));
        assert!(graph.contains_edge(&act("y"), &Activity::End));
        assert!(!graph.contains_edge(&act("y"), &act("x")));
    }

    #[test]
    fn nodes_never_contain_virtual_activities() {
        let log = event_log!("1" => ["a", "b", "c"], "2" => ["a", "c"], "3" => ["b", "b", "d"]);
        let table = TransitionTable::from_log(&log);
        for (ar, pr) in [(0.0, 0.0), (50.0, 50.0), (100.0, 30.0), (100.0, 100.0)] {
            let mut graph = ProcessGraph::new();
            graph.update(&log, ar, pr, &table, None).unwrap();
            assert!(graph.nodes.keys().all(|a| !a.is_virtual()));
            assert!(graph.edges.keys().any(|(a, _)| *a == Activity::Start));
        }
    }

    #[test]
    fn activity_rate_filters_rare_activities() {
        let log = event_log!("1" => ["a", "b"], "2" => ["a", "b"], "3" => ["a", "n", "b"]);
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        graph.update(&log, 50.0, 100.0, &table, None).unwrap();
        assert!(!graph.contains_node(&act("n")));
        assert!(graph.contains_node(&act("a")));
        assert!(graph.contains_node(&act("b")));
        // a -> n -> b is projected onto a -> b, which is observed
        assert!(graph.contains_edge(&act("a"), &act("b")));
    }

    #[test]
    fn repaired_edges_can_be_imaginary() {
        let log = event_log!("1" => ["n", "b"], "2" => ["a", "b"], "3" => ["a", "b"]);
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        // Keeps only b (coverage 1.0)
        graph.update(&log, 0.0, 100.0, &table, None).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(
            graph.edges[&(Activity::Start, act("b"))],
            Frequency::imaginary()
        );
        assert_eq!(graph.edges[&(act("b"), Activity::End)], Frequency::new(3, 3));
    }

    #[test]
    fn self_loops_respect_tolerance() {
        let log = event_log!("1" => ["a", "a", "b"], "2" => ["a", "b"]);
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        // Single loop normalizes to 1.0; 1.0 - 0.01 < 1.0 (cutoff at path rate 0)
        graph.update(&log, 100.0, 0.0, &table, None).unwrap();
        assert!(!graph.contains_edge(&act("a"), &act("a")));
        graph.update(&log, 100.0, 1.0, &table, None).unwrap();
        assert!(graph.contains_edge(&act("a"), &act("a")));
    }

    #[test]
    fn update_is_idempotent() {
        let log = event_log!("1" => ["a", "b", "c", "b"], "2" => ["a", "c"], "3" => ["b", "a", "d"]);
        let table = TransitionTable::from_log(&log);
        let mut g1 = ProcessGraph::new();
        let mut g2 = ProcessGraph::new();
        g1.update(&log, 60.0, 40.0, &table, None).unwrap();
        g2.update(&log, 60.0, 40.0, &table, None).unwrap();
        g2.update(&log, 60.0, 40.0, &table, None).unwrap();
        assert_eq!(g1, g2);
    }

    #[test]
    fn invalid_rates_leave_graph_untouched() {
        let log = loops_log();
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        graph.update(&log, 100.0, 100.0, &table, None).unwrap();
        let before = graph.clone();
        let res = graph.update(&log, 101.0, 50.0, &table, None);
        assert!(matches!(res, Err(FuzzyMinerError::InvalidParameter(_))));
        assert_eq!(graph, before);
    }

    #[test]
    fn infeasible_model_is_reported() {
        let mut log = event_log!("1" => ["a"]);
        log.activities.insert(act("ghost"));
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        let res = graph.update(&log, 100.0, 100.0, &table, None);
        assert!(matches!(
            res,
            Err(FuzzyMinerError::InfeasibleModel { activity, .. }) if activity == act("ghost")
        ));
        assert!(graph.nodes.is_empty());
    }

    #[test]
    fn external_node_significance_is_used() {
        let log = event_log!("1" => ["a", "b"], "2" => ["a"]);
        let table = TransitionTable::from_log(&log);
        let significance: NodeSignificance = [(act("a"), 0.1), (act("b"), 1.0)].into();
        let mut graph = ProcessGraph::new();
        graph
            .update(&log, 0.0, 100.0, &table, Some(&significance))
            .unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[&act("b")], Frequency::new(1, 2));
    }
}
