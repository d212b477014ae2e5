use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::event_data::{Activity, EventLog, TransitionTable};

/// Significance per activity
pub type NodeSignificance = HashMap<Activity, f64>;

/// Significance matrix: row activity -> column activity -> significance
///
/// For [`Direction::Out`], rows are sources and columns targets of the edge.
/// For [`Direction::In`], rows are targets and columns sources of the edge.
pub type EdgeSignificance = HashMap<Activity, HashMap<Activity, f64>>;

/// Direction in which an edge significance matrix is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Share of the source's outgoing case frequency
    Out,
    /// Share of the target's incoming case frequency
    In,
}

///
/// Node significance: share of cases containing each activity of `log`
///
pub fn node_significance(log: &EventLog) -> NodeSignificance {
    let mut case_cover: HashMap<&Activity, usize> = HashMap::new();
    for trace in log.traces() {
        let distinct: HashSet<&Activity> = trace.iter().collect();
        for act in distinct {
            *case_cover.entry(act).or_default() += 1;
        }
    }
    let case_cnt = log.num_cases() as f64;
    log.activities
        .iter()
        .map(|act| {
            let cover = case_cover.get(act).copied().unwrap_or_default();
            (act.clone(), cover as f64 / case_cnt)
        })
        .collect()
}

///
/// Directional edge significance
///
/// `rows` are the activities a row is computed for (sources for [`Direction::Out`],
/// targets for [`Direction::In`]), `columns` the admissible opposite endpoints.
/// The significance of an edge is the share of the row activity's case frequency (over all
/// admissible non-loop edges) that this edge captures.
///
/// `table` is expected to contain the virtual boundaries (see [`TransitionTable::with_boundaries`]).
///
pub fn edge_significance(
    table: &TransitionTable,
    rows: &BTreeSet<Activity>,
    columns: &BTreeSet<Activity>,
    direction: Direction,
) -> EdgeSignificance {
    let mut sig: EdgeSignificance = rows.iter().map(|r| (r.clone(), HashMap::new())).collect();
    for (from, to, freq) in table.iter() {
        if from == to {
            continue;
        }
        let (row, col) = match direction {
            Direction::Out => (from, to),
            Direction::In => (to, from),
        };
        if !columns.contains(col) {
            continue;
        }
        if let Some(row_sig) = sig.get_mut(row) {
            row_sig.insert(col.clone(), freq.cases as f64);
        }
    }
    for row_sig in sig.values_mut() {
        let total: f64 = row_sig.values().sum();
        if total > 0.0 {
            row_sig.values_mut().for_each(|v| *v /= total);
        }
    }
    sig
}

///
/// Self-loop significance: share of cases with a self-transition on a retained activity
///
pub fn loop_significance(
    table: &TransitionTable,
    retained: &BTreeSet<Activity>,
    case_cnt: usize,
) -> NodeSignificance {
    retained
        .iter()
        .filter_map(|act| {
            table
                .get(act, act)
                .map(|freq| (act.clone(), freq.cases as f64 / case_cnt as f64))
        })
        .collect()
}

///
/// Relative significance of every edge present in both matrices
///
/// `rS(a, b) = 0.5 * S_out[a][b] + 0.5 * S_in[b][a]`
///
pub fn relative_significance(
    s_out: &EdgeSignificance,
    s_in: &EdgeSignificance,
) -> HashMap<(Activity, Activity), f64> {
    s_out
        .iter()
        .flat_map(|(a, row)| row.iter().map(move |(b, sig_out)| (a, b, *sig_out)))
        .filter_map(|(a, b, sig_out)| {
            s_in.get(b)
                .and_then(|row| row.get(a))
                .map(|sig_in| ((a.clone(), b.clone()), 0.5 * sig_out + 0.5 * sig_in))
        })
        .collect()
}

///
/// Resolve two-way (conflicting) relations
///
/// For every pair of activities connected in both directions, the edge with the higher relative
/// significance is kept. On an exact tie, the edge that is smaller in [`Activity`] order wins.
/// Edges without a reverse counterpart are not part of the result.
///
pub fn resolve_conflicts(
    rel_sig: &HashMap<(Activity, Activity), f64>,
) -> BTreeSet<(Activity, Activity)> {
    let mut preserved = BTreeSet::new();
    for ((a, b), sig) in rel_sig {
        if a == b {
            continue;
        }
        let Some(reverse_sig) = rel_sig.get(&(b.clone(), a.clone())) else {
            continue;
        };
        let wins = sig > reverse_sig || (sig == reverse_sig && (a, b) < (b, a));
        if wins {
            preserved.insert((a.clone(), b.clone()));
        }
    }
    preserved
}
