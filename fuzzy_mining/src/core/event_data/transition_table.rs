use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::event_log_struct::{Activity, EventLog};

///
/// Pair of counts annotated on transitions and nodes
///
/// For transitions: number of occurrences and number of distinct cases containing it.
/// For process graph nodes: total observed frequency and case-weighted count.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frequency {
    /// Absolute number of occurrences
    pub absolute: u64,
    /// Number of distinct cases
    pub cases: u64,
}

impl Frequency {
    /// Create a new [`Frequency`]
    pub fn new(absolute: u64, cases: u64) -> Self {
        Self { absolute, cases }
    }

    /// Frequency of a transition that was never observed
    pub fn imaginary() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing was observed
    pub fn is_imaginary(&self) -> bool {
        self.absolute == 0 && self.cases == 0
    }
}

///
/// Directly-follows tally of an [`EventLog`]
///
/// Maps source activity to target activity to the [`Frequency`] of that transition.
///
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionTable {
    /// Transitions: source -> target -> frequency
    #[serde_as(as = "Vec<(_, Vec<(_, _)>)>")]
    pub transitions: HashMap<Activity, HashMap<Activity, Frequency>>,
}

impl TransitionTable {
    /// Create an empty [`TransitionTable`]
    pub fn new() -> Self {
        Self::default()
    }

    ///
    /// Tally all adjacent activity pairs of the log
    ///
    /// The absolute count is incremented for every adjacency, the case count at most once
    /// per case and pair.
    ///
    pub fn from_log(log: &EventLog) -> Self {
        let transitions = log
            .flat_log
            .par_iter()
            .map(|(_, trace)| {
                let mut case_counts: HashMap<(&Activity, &Activity), Frequency> = HashMap::new();
                for (a, b) in trace.iter().zip(trace.iter().skip(1)) {
                    case_counts
                        .entry((a, b))
                        .or_insert(Frequency::new(0, 1))
                        .absolute += 1;
                }
                case_counts
                    .into_iter()
                    .map(|((a, b), f)| ((a.clone(), b.clone()), f))
                    .collect::<Vec<_>>()
            })
            .flatten()
            .fold(
                HashMap::<Activity, HashMap<Activity, Frequency>>::new,
                |mut map, ((a, b), f)| {
                    let entry = map.entry(a).or_default().entry(b).or_default();
                    entry.absolute += f.absolute;
                    entry.cases += f.cases;
                    map
                },
            )
            .reduce_with(|mut m1, m2| {
                for (a, row) in m2 {
                    let target_row = m1.entry(a).or_default();
                    for (b, f) in row {
                        let entry = target_row.entry(b).or_default();
                        entry.absolute += f.absolute;
                        entry.cases += f.cases;
                    }
                }
                m1
            })
            .unwrap_or_default();
        Self { transitions }
    }

    ///
    /// Extend the table with the virtual boundaries of every trace of `log`
    ///
    /// Adds one occurrence (and one case) of [`Activity::Start`] -> first activity and
    /// last activity -> [`Activity::End`] per case.
    ///
    pub fn with_boundaries(&self, log: &EventLog) -> Self {
        let mut extended = self.clone();
        for trace in log.traces() {
            if let (Some(first), Some(last)) = (trace.first(), trace.last()) {
                extended.add(Activity::Start, first.clone(), Frequency::new(1, 1));
                extended.add(last.clone(), Activity::End, Frequency::new(1, 1));
            }
        }
        extended
    }

    /// Add `frequency` to the transition `from` -> `to`
    pub fn add(&mut self, from: Activity, to: Activity, frequency: Frequency) {
        let entry = self
            .transitions
            .entry(from)
            .or_default()
            .entry(to)
            .or_default();
        entry.absolute += frequency.absolute;
        entry.cases += frequency.cases;
    }

    /// Frequency of the transition `from` -> `to`, if it was observed
    pub fn get(&self, from: &Activity, to: &Activity) -> Option<Frequency> {
        self.transitions.get(from).and_then(|row| row.get(to)).copied()
    }

    /// Frequency of the transition `from` -> `to`, or an imaginary `(0, 0)` frequency
    pub fn get_or_imaginary(&self, from: &Activity, to: &Activity) -> Frequency {
        self.get(from, to).unwrap_or_else(Frequency::imaginary)
    }

    /// Checks if the transition `from` -> `to` was observed
    pub fn contains(&self, from: &Activity, to: &Activity) -> bool {
        self.get(from, to).is_some()
    }

    /// Outgoing transitions of an activity
    pub fn successors<'a>(
        &'a self,
        from: &Activity,
    ) -> impl Iterator<Item = (&'a Activity, &'a Frequency)> + 'a {
        self.transitions.get(from).into_iter().flatten()
    }

    /// Sum of absolute frequencies of all outgoing transitions of an activity
    pub fn outgoing_absolute(&self, from: &Activity) -> u64 {
        self.successors(from).map(|(_, f)| f.absolute).sum()
    }

    /// Iterate over all transitions as `(source, target, frequency)`
    pub fn iter(&self) -> impl Iterator<Item = (&Activity, &Activity, &Frequency)> {
        self.transitions
            .iter()
            .flat_map(|(a, row)| row.iter().map(move |(b, f)| (a, b, f)))
    }

    /// Number of distinct transitions
    pub fn len(&self) -> usize {
        self.transitions.values().map(|row| row.len()).sum()
    }

    /// Checks if no transition was recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}
