use crate::core::{
    event_data::{Activity, EventLog},
    process_models::process_graph::ProcessGraph,
};

impl ProcessGraph {
    ///
    /// Average replayability of the traces of `log` on the graph
    ///
    /// Replay of a trace starts at its first event that is a node of the graph (a trace without
    /// any such event scores 0). Each later event is either a node reached over an edge from the
    /// current position, a node without such an edge (a forced transition, the position is kept)
    /// or skipped (not a node).
    ///
    /// Trace score: `|z / len - alpha * skipped - beta * forced / len|` with `z` the number of
    /// replayed events and `skipped` being `1` if any event after the first replayed one was
    /// skipped.
    ///
    pub fn replayability_score(&self, log: &EventLog, alpha: f64, beta: f64) -> f64 {
        let case_cnt = log.num_cases();
        if case_cnt == 0 {
            return 0.0;
        }
        let total: f64 = log
            .traces()
            .map(|trace| self.trace_replayability(trace, alpha, beta))
            .sum();
        total / case_cnt as f64
    }

    fn trace_replayability(&self, trace: &[Activity], alpha: f64, beta: f64) -> f64 {
        let Some(first) = trace.iter().position(|act| self.contains_node(act)) else {
            return 0.0;
        };
        let mut replayed = 1_u64;
        let mut skipped = 0_u64;
        let mut forced = 0_u64;
        let mut position = &trace[first];
        for act in &trace[first + 1..] {
            if !self.contains_node(act) {
                skipped = 1;
                continue;
            }
            replayed += 1;
            if self.contains_edge(position, act) {
                position = act;
            } else {
                forced += 1;
            }
        }
        let len = trace.len() as f64;
        (replayed as f64 / len - alpha * skipped as f64 - beta * forced as f64 / len).abs()
    }
}
