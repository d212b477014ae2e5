use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::core::event_data::{Activity, Frequency};

/// A process model discovered by fuzzy mining.
///
/// Nodes are the retained activities (including meta-states), annotated with their total
/// observed frequency and case-weighted count.
/// Edges are the retained transitions, annotated with their absolute and case frequency.
/// The virtual [`Activity::Start`] and [`Activity::End`] are never nodes, but edges may
/// reference them.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessGraph {
    /// Activities
    #[serde_as(as = "Vec<(_, _)>")]
    pub nodes: HashMap<Activity, Frequency>,
    /// Transitions
    #[serde_as(as = "Vec<(_, _)>")]
    pub edges: HashMap<(Activity, Activity), Frequency>,
}

impl ProcessGraph {
    /// Create new [`ProcessGraph`] with no nodes and edges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if an activity is a node of the graph.
    pub fn contains_node(&self, activity: &Activity) -> bool {
        self.nodes.contains_key(activity)
    }

    /// Checks if a transition is an edge of the graph.
    pub fn contains_edge(&self, from: &Activity, to: &Activity) -> bool {
        self.edges.contains_key(&(from.clone(), to.clone()))
    }

    /// Targets of all outgoing edges of an activity, in [`Activity`] order.
    pub fn successors(&self, activity: &Activity) -> Vec<&Activity> {
        let mut succ: Vec<&Activity> = self
            .edges
            .keys()
            .filter_map(|(a, b)| if a == activity { Some(b) } else { None })
            .collect();
        succ.sort();
        succ
    }

    /// Sources of all incoming edges of an activity, in [`Activity`] order.
    pub fn predecessors(&self, activity: &Activity) -> Vec<&Activity> {
        let mut pred: Vec<&Activity> = self
            .edges
            .keys()
            .filter_map(|(a, b)| if b == activity { Some(a) } else { None })
            .collect();
        pred.sort();
        pred
    }

    /// Average degree including the two virtual boundary nodes: `|edges| / (|nodes| + 2)`.
    pub fn complexity(&self) -> f64 {
        self.edges.len() as f64 / (self.nodes.len() + 2) as f64
    }

    ///
    /// Traverse the graph from [`Activity::Start`] in preorder
    ///
    /// Returns all reachable nodes (including the virtual ones) in the order in which they are
    /// first discovered. Successors are visited in [`Activity`] order.
    ///
    pub fn find_nodes_order(&self) -> Vec<Activity> {
        let mut ordered_nodes: Vec<Activity> = Vec::new();
        let mut visited: HashSet<&Activity> = HashSet::new();
        let start = Activity::Start;
        let mut stack: Vec<&Activity> = vec![&start];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            ordered_nodes.push(node.clone());
            // Reversed, so that the smallest successor is expanded first
            for succ in self.successors(node).into_iter().rev() {
                if !visited.contains(succ) {
                    stack.push(succ);
                }
            }
        }
        ordered_nodes
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str) -> (Activity, Activity) {
        let conv = |s: &str| match s {
            "start" => Activity::Start,
            "end" => Activity::End,
            other => Activity::from(other),
        };
        (conv(a), conv(b))
    }

    fn graph(edges: &[(&str, &str)]) -> ProcessGraph {
        let mut g = ProcessGraph::new();
        for (a, b) in edges {
            let e = edge(a, b);
            for act in [&e.0, &e.1] {
                if !act.is_virtual() {
                    g.nodes.insert(act.clone(), Frequency::new(1, 1));
                }
            }
            g.edges.insert(e, Frequency::new(1, 1));
        }
        g
    }

    #[test]
    fn preorder_is_first_discovered_order() {
        // start -> b -> c -> end, start -> d -> a -> end, a -> c
        let g = graph(&[
            ("start", "b"),
            ("start", "d"),
            ("b", "c"),
            ("c", "end"),
            ("d", "a"),
            ("a", "c"),
            ("a", "end"),
        ]);
        let order: Vec<String> = g.find_nodes_order().iter().map(|a| a.to_string()).collect();
        assert_eq!(order, vec!["start", "b", "c", "end", "d", "a"]);
    }

    #[test]
    fn preorder_skips_unreachable_nodes() {
        let mut g = graph(&[("start", "a"), ("a", "end")]);
        g.nodes.insert(Activity::from("z"), Frequency::new(1, 1));
        let order = g.find_nodes_order();
        assert_eq!(order.len(), 3);
        assert!(!order.contains(&Activity::from("z")));
    }

    #[test]
    fn preorder_handles_cycles() {
        let g = graph(&[("start", "a"), ("a", "b"), ("b", "a"), ("b", "end")]);
        let order: Vec<String> = g.find_nodes_order().iter().map(|a| a.to_string()).collect();
        assert_eq!(order, vec!["start", "a", "b", "end"]);
    }

    #[test]
    fn complexity_counts_virtual_nodes() {
        let g = graph(&[("start", "a"), ("a", "b"), ("b", "end")]);
        assert!((g.complexity() - 3.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn process_graph_json_roundtrip() {
        let mut g = graph(&[("start", "a"), ("a", "end")]);
        g.nodes.insert(
            Activity::Meta(vec!["x".into(), "y".into()]),
            Frequency::new(4, 2),
        );
        let back = ProcessGraph::from_json(&g.to_json()).unwrap();
        assert_eq!(g, back);
    }
}
