use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;

use crate::core::{
    event_data::{Activity, EventLog, Frequency},
    process_models::process_graph::ProcessGraph,
};

/// Activities of a cycle, in the order of occurrence
pub type Cycle = Vec<Activity>;

/// All rotations of a cycle, starting with the cycle itself
pub fn rotations(cycle: &[Activity]) -> Vec<Cycle> {
    (0..cycle.len())
        .map(|i| [&cycle[i..], &cycle[..i]].concat())
        .collect()
}

///
/// Canonical representative of the rotation class of a cycle
///
/// With a node order (from [`ProcessGraph::find_nodes_order`]), the rotation starting with the
/// activity discovered first wins. Otherwise (and on ties) the lexically smallest rotation is used.
///
pub fn canonical_rotation(cycle: &[Activity], node_order: Option<&HashMap<&Activity, usize>>) -> Cycle {
    rotations(cycle)
        .into_iter()
        .min_by_key(|rot| {
            let position = node_order
                .map(|order| order.get(&rot[0]).copied().unwrap_or(usize::MAX))
                .unwrap_or_default();
            (position, rot.clone())
        })
        .unwrap_or_default()
}

/// No transition in `bad_edges` (sorted indices of transitions missing in the model) lies in `[start, end)`
fn check_edges(bad_edges: &[usize], start: usize, end: usize) -> bool {
    !bad_edges.iter().any(|ind| (start..end).contains(ind))
}

impl ProcessGraph {
    ///
    /// Search cycles in the traces of `log` and count their occurrences
    ///
    /// A cycle is the sub-sequence between two consecutive occurrences of a node, if it contains
    /// no activity twice and all of its transitions (including the one closing it) are edges of
    /// the graph.
    ///
    /// All rotations of a cycle are merged into one canonical entry (counts summed, cases counted
    /// once per case). With `ordered` or `pre_traverse`, the canonical rotation starts at the
    /// activity discovered first from start (see [`ProcessGraph::find_nodes_order`]), otherwise
    /// it is the lexically smallest rotation.
    ///
    pub fn find_cycles(
        &self,
        log: &EventLog,
        pre_traverse: bool,
        ordered: bool,
    ) -> BTreeMap<Cycle, Frequency> {
        let by_traversal = ordered || pre_traverse;
        let nodes_order = if by_traversal {
            self.find_nodes_order()
        } else {
            Vec::new()
        };
        let position: HashMap<&Activity, usize> =
            nodes_order.iter().enumerate().map(|(i, a)| (a, i)).collect();
        let canonical_order = by_traversal.then_some(&position);
        let mut canonical_cache: HashMap<Cycle, Cycle> = HashMap::new();

        let mut cycles: BTreeMap<Cycle, Frequency> = BTreeMap::new();
        for trace in log.traces() {
            let bad_edges: Vec<usize> = trace
                .iter()
                .tuple_windows()
                .enumerate()
                .filter(|(_, (a, b))| !self.contains_edge(a, b))
                .map(|(i, _)| i)
                .collect();

            let mut case_cycles: HashSet<Cycle> = HashSet::new();
            for node in self.nodes.keys() {
                let indices: Vec<usize> = trace.iter().positions(|a| a == node).collect();
                for (&s_i, &f_i) in indices.iter().tuple_windows() {
                    let cycle = &trace[s_i..f_i];
                    let distinct: HashSet<&Activity> = cycle.iter().collect();
                    if f_i - s_i != distinct.len() || !check_edges(&bad_edges, s_i, f_i) {
                        continue;
                    }
                    let key = canonical_cache
                        .entry(cycle.to_vec())
                        .or_insert_with(|| canonical_rotation(cycle, canonical_order))
                        .clone();
                    let freq = cycles.entry(key.clone()).or_default();
                    freq.absolute += 1;
                    if case_cycles.insert(key) {
                        freq.cases += 1;
                    }
                }
            }
        }
        tracing::debug!(cycles = cycles.len(), ordered, pre_traverse, "Found cycles");
        cycles
    }

    ///
    /// Significant cycles (meta-states)
    ///
    /// A cycle of length > 1 is significant, if the share of cases it occurs in is at least `cycle_rel`.
    ///
    pub fn find_states(
        &self,
        log: &EventLog,
        pre_traverse: bool,
        ordered: bool,
        cycle_rel: f64,
    ) -> Vec<Cycle> {
        let case_cnt = log.num_cases() as f64;
        self.find_cycles(log, pre_traverse, ordered)
            .into_iter()
            .filter(|(c, freq)| c.len() > 1 && freq.cases as f64 / case_cnt >= cycle_rel)
            .map(|(c, _)| c)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::event_data::TransitionTable, event_log};

    fn act(s: &str) -> Activity {
        Activity::from(s)
    }

    fn cycle(acts: &[&str]) -> Cycle {
        acts.iter().map(|a| act(a)).collect()
    }

    fn full_graph(log: &EventLog) -> ProcessGraph {
        let mut graph = ProcessGraph::new();
        graph
            .update(log, 100.0, 100.0, &TransitionTable::from_log(log), None)
            .unwrap();
        graph
    }

    #[test]
    fn rotations_collapse_in_every_mode() {
        let log = event_log!("A" => ["x", "y", "x", "y"], "B" => ["x", "y"]);
        let graph = full_graph(&log);
        for pre_traverse in [false, true] {
            for ordered in [false, true] {
                let cycles = graph.find_cycles(&log, pre_traverse, ordered);
                assert_eq!(cycles.len(), 1);
                assert_eq!(cycles[&cycle(&["x", "y"])], Frequency::new(2, 1));
            }
        }
    }

    #[test]
    fn meta_state_boundary() {
        let log = event_log!("A" => ["x", "y", "x", "y"], "B" => ["x", "y"]);
        let graph = full_graph(&log);
        // 1 of 2 cases: significant at exactly 0.5
        assert_eq!(
            graph.find_states(&log, false, false, 0.5),
            vec![cycle(&["x", "y"])]
        );
        assert!(graph.find_states(&log, false, false, 0.51).is_empty());
        assert_eq!(
            graph.find_states(&log, false, true, 0.5),
            vec![cycle(&["x", "y"])]
        );
    }

    #[test]
    fn missing_edges_break_cycles() {
        let log = event_log!("A" => ["x", "y", "x", "y"], "B" => ["x", "y"]);
        let mut graph = full_graph(&log);
        graph.edges.remove(&(act("y"), act("x")));
        assert!(graph.find_cycles(&log, false, false).is_empty());
    }

    #[test]
    fn repeated_activities_are_not_cycles() {
        // a b b a: b repeats inside the a..a window
        let log = event_log!("1" => ["a", "b", "b", "a"]);
        let graph = full_graph(&log);
        let cycles = graph.find_cycles(&log, false, true);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[&cycle(&["b"])], Frequency::new(1, 1));
        assert!(graph.find_states(&log, false, true, 0.0).is_empty());
    }

    #[test]
    fn pre_traversal_picks_rotation_closest_to_start() {
        // start -> c -> b -> a -> c ...: c is discovered before a and b
        let log = event_log!("1" => ["c", "b", "a", "c", "b", "a"], "2" => ["c", "b", "a"]);
        let graph = full_graph(&log);
        let traversed = graph.find_cycles(&log, true, false);
        assert_eq!(traversed.len(), 1);
        assert!(traversed.contains_key(&cycle(&["c", "b", "a"])));
        assert_eq!(traversed[&cycle(&["c", "b", "a"])], Frequency::new(3, 1));

        // ordered cycles are oriented by traversal as well
        let ordered = graph.find_cycles(&log, false, true);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[&cycle(&["c", "b", "a"])], Frequency::new(3, 1));

        let lexical = graph.find_cycles(&log, false, false);
        assert!(lexical.contains_key(&cycle(&["a", "c", "b"])));
    }

    #[test]
    fn rotations_of_cycle() {
        let rots = rotations(&cycle(&["a", "b", "c"]));
        assert_eq!(
            rots,
            vec![
                cycle(&["a", "b", "c"]),
                cycle(&["b", "c", "a"]),
                cycle(&["c", "a", "b"])
            ]
        );
    }
}
