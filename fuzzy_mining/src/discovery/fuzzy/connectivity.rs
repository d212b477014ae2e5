use std::collections::{BTreeSet, HashMap, HashSet};

use ordered_float::OrderedFloat;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::{Dfs, Reversed},
};

use super::{error::FuzzyMinerError, significance::EdgeSignificance};
use crate::core::event_data::{Activity, EventLog, TransitionTable};

type Edge = (Activity, Activity);

/// Which end of the model a retained activity has to be connected to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reachability {
    /// Reachable from [`Activity::Start`]
    FromStart,
    /// Able to reach [`Activity::End`]
    ToEnd,
}

/// Filtered model as a petgraph graph over the retained activities and the virtual boundaries
struct FilteredGraph {
    graph: DiGraph<Activity, ()>,
    index: HashMap<Activity, NodeIndex>,
}

impl FilteredGraph {
    fn new(retained: &BTreeSet<Activity>, transitions: &BTreeSet<Edge>) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for act in [Activity::Start, Activity::End]
            .iter()
            .chain(retained.iter())
        {
            index.insert(act.clone(), graph.add_node(act.clone()));
        }
        let mut g = Self { graph, index };
        for (a, b) in transitions {
            g.add_edge(a, b);
        }
        g
    }

    fn add_edge(&mut self, from: &Activity, to: &Activity) {
        if let (Some(a), Some(b)) = (self.index.get(from), self.index.get(to)) {
            self.graph.add_edge(*a, *b, ());
        }
    }

    fn reachable(&self, direction: Reachability) -> HashSet<Activity> {
        let mut reached = HashSet::new();
        match direction {
            Reachability::FromStart => {
                let mut dfs = Dfs::new(&self.graph, self.index[&Activity::Start]);
                while let Some(nx) = dfs.next(&self.graph) {
                    reached.insert(self.graph[nx].clone());
                }
            }
            Reachability::ToEnd => {
                let reversed = Reversed(&self.graph);
                let mut dfs = Dfs::new(reversed, self.index[&Activity::End]);
                while let Some(nx) = dfs.next(reversed) {
                    reached.insert(self.graph[nx].clone());
                }
            }
        }
        reached
    }
}

///
/// Transitions of the log projected onto the retained activities (including the boundaries)
///
/// These are the transitions a replay over only the retained activities would need; they may be
/// absent from the transition table (imaginary edges).
///
fn projected_transitions(log: &EventLog, retained: &BTreeSet<Activity>) -> BTreeSet<Edge> {
    let mut projected = BTreeSet::new();
    for trace in log.traces() {
        let mut prev = Activity::Start;
        for act in trace.iter().filter(|a| retained.contains(*a)) {
            projected.insert((prev, act.clone()));
            prev = act.clone();
        }
        projected.insert((prev, Activity::End));
    }
    projected.retain(|(a, b)| !(a.is_virtual() && b.is_virtual()));
    projected
}

///
/// Ensure every retained activity is reachable from start and can reach end
///
/// Missing connections are added to `transitions`, one edge at a time:
/// first the transition-table edge with the highest normalized outgoing significance (`s_out_norm`)
/// bridging the connected part to an unconnected activity (ties: higher case count, then
/// [`Activity`] order), otherwise the bridging transition implied by the log projected on the
/// retained activities.
///
/// `table` is expected to contain the virtual boundaries.
/// Returns the added edges, or [`FuzzyMinerError::InfeasibleModel`] if an activity cannot be connected.
///
pub fn repair_connectivity(
    log: &EventLog,
    retained: &BTreeSet<Activity>,
    transitions: &mut BTreeSet<Edge>,
    table: &TransitionTable,
    s_out_norm: &EdgeSignificance,
) -> Result<Vec<Edge>, FuzzyMinerError> {
    let mut graph = FilteredGraph::new(retained, transitions);
    let mut projected: Option<BTreeSet<Edge>> = None;
    let mut added = Vec::new();

    for direction in [Reachability::FromStart, Reachability::ToEnd] {
        loop {
            let connected = graph.reachable(direction);
            let unconnected: BTreeSet<&Activity> = retained
                .iter()
                .filter(|a| !connected.contains(*a))
                .collect();
            let Some(first_unconnected) = unconnected.first() else {
                break;
            };
            let bridges = |(a, b): &(&Activity, &Activity)| match direction {
                Reachability::FromStart => connected.contains(*a) && unconnected.contains(*b),
                Reachability::ToEnd => unconnected.contains(*a) && connected.contains(*b),
            };

            let from_table = table
                .iter()
                .filter(|(a, b, _)| bridges(&(*a, *b)))
                .max_by(|(a1, b1, f1), (a2, b2, f2)| {
                    let sig = |a: &Activity, b: &Activity| {
                        OrderedFloat(
                            s_out_norm
                                .get(a)
                                .and_then(|row| row.get(b))
                                .copied()
                                .unwrap_or_default(),
                        )
                    };
                    sig(*a1, *b1)
                        .cmp(&sig(*a2, *b2))
                        .then(f1.cases.cmp(&f2.cases))
                        .then((a2, b2).cmp(&(a1, b1)))
                })
                .map(|(a, b, _)| (a.clone(), b.clone()));

            let repair = match from_table {
                Some(edge) => Some(edge),
                None => projected
                    .get_or_insert_with(|| projected_transitions(log, retained))
                    .iter()
                    .find(|(a, b)| bridges(&(a, b)))
                    .cloned(),
            };

            match repair {
                Some((a, b)) => {
                    tracing::trace!(from = %a, to = %b, ?direction, "Repairing connectivity");
                    graph.add_edge(&a, &b);
                    transitions.insert((a.clone(), b.clone()));
                    added.push((a, b));
                }
                None => {
                    return Err(FuzzyMinerError::InfeasibleModel {
                        activity: (*first_unconnected).clone(),
                        reason: match direction {
                            Reachability::FromStart => "is not reachable from start".to_string(),
                            Reachability::ToEnd => "cannot reach end".to_string(),
                        },
                    });
                }
            }
        }
    }
    Ok(added)
}
