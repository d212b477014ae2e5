use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt::Display,
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

///
/// Activity label of an event, a virtual boundary of every trace, or an aggregated meta-state
///
/// The derived order (`Start < End < Simple < Meta`, labels compared lexically) is used as the
/// deterministic tie-break throughout discovery.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Activity {
    /// Virtual activity preceding the first event of every trace
    Start,
    /// Virtual activity following the last event of every trace
    End,
    /// Activity with a label as recorded in the event log
    Simple(String),
    /// Meta-state: a significant cycle collapsed into a single activity
    Meta(Vec<Activity>),
}

impl Activity {
    /// Returns `true` for the virtual [`Activity::Start`] and [`Activity::End`]
    pub fn is_virtual(&self) -> bool {
        matches!(self, Activity::Start | Activity::End)
    }

    /// Returns `true` for meta-states
    pub fn is_meta(&self) -> bool {
        matches!(self, Activity::Meta(_))
    }

    /// Activities a meta-state is composed of
    ///
    /// For all other activities, the activity itself is returned as a single-element slice.
    pub fn constituents(&self) -> &[Activity] {
        match self {
            Activity::Meta(acts) => acts.as_slice(),
            other => std::slice::from_ref(other),
        }
    }
}

impl Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activity::Start => write!(f, "start"),
            Activity::End => write!(f, "end"),
            Activity::Simple(label) => write!(f, "{label}"),
            Activity::Meta(acts) => write!(f, "({})", acts.iter().join(", ")),
        }
    }
}

impl From<&str> for Activity {
    fn from(label: &str) -> Self {
        Activity::Simple(label.to_string())
    }
}

impl From<String> for Activity {
    fn from(label: String) -> Self {
        Activity::Simple(label)
    }
}

/// Ordered sequence of activities of one case
pub type Trace = Vec<Activity>;

///
/// Event log reduced to what discovery needs: case identifiers, activity labels and
/// the activity sequence (trace) of every case
///
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    /// Case identifiers
    pub cases: BTreeSet<String>,
    /// Distinct activities
    pub activities: HashSet<Activity>,
    /// Trace per case (ordered by case identifier)
    pub flat_log: BTreeMap<String, Trace>,
}

impl EventLog {
    /// Create an empty [`EventLog`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an [`EventLog`] from `(case identifier, trace)` pairs
    ///
    /// Cases without any event are skipped. If a case identifier occurs more than once,
    /// the later trace replaces the earlier one.
    pub fn from_traces<I, S>(traces: I) -> Self
    where
        I: IntoIterator<Item = (S, Trace)>,
        S: Into<String>,
    {
        let mut log = Self::new();
        for (case_id, trace) in traces {
            log.add_trace(case_id.into(), trace);
        }
        log.activities = log.flat_log.values().flatten().cloned().collect();
        log
    }

    fn add_trace(&mut self, case_id: String, trace: Trace) {
        if trace.is_empty() {
            return;
        }
        self.cases.insert(case_id.clone());
        self.flat_log.insert(case_id, trace);
    }

    /// Number of cases
    pub fn num_cases(&self) -> usize {
        self.cases.len()
    }

    /// Iterate over all traces (ordered by case identifier)
    pub fn traces(&self) -> impl Iterator<Item = &Trace> {
        self.flat_log.values()
    }

    /// Length of the longest trace
    pub fn max_trace_len(&self) -> usize {
        self.traces().map(|t| t.len()).max().unwrap_or(0)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

///
/// Convenience macro for building an [`EventLog`] from string labels
///
/// ```
/// use fuzzy_mining::event_log;
/// let log = event_log!("c1" => ["a", "b"], "c2" => ["a", "c"]);
/// assert_eq!(log.num_cases(), 2);
/// ```
#[macro_export]
macro_rules! event_log {
    ($($case:expr => [$($act:expr),* $(,)?]),* $(,)?) => {
        $crate::core::event_data::EventLog::from_traces(vec![
            $(($case, vec![$($crate::core::event_data::Activity::from($act)),*])),*
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_order_puts_boundaries_first() {
        let mut acts = vec![
            Activity::Meta(vec!["a".into(), "b".into()]),
            Activity::from("b"),
            Activity::End,
            Activity::from("a"),
            Activity::Start,
        ];
        acts.sort();
        assert_eq!(acts[0], Activity::Start);
        assert_eq!(acts[1], Activity::End);
        assert_eq!(acts[2], Activity::from("a"));
        assert!(acts[4].is_meta());
    }

    #[test]
    fn meta_display_and_constituents() {
        let meta = Activity::Meta(vec!["x".into(), "y".into()]);
        assert_eq!(meta.to_string(), "(x, y)");
        assert_eq!(meta.constituents().len(), 2);
        assert_eq!(Activity::from("x").constituents(), &[Activity::from("x")]);
    }

    #[test]
    fn empty_traces_are_dropped() {
        let log = EventLog::from_traces(vec![
            ("1", vec![Activity::from("a")]),
            ("2", vec![]),
        ]);
        assert_eq!(log.num_cases(), 1);
        assert_eq!(log.activities.len(), 1);
        assert_eq!(log.max_trace_len(), 1);
    }

    #[test]
    fn event_log_json_roundtrip() {
        let log = crate::event_log!("A" => ["x", "y"], "B" => ["y"]);
        let json = log.to_json();
        let back: EventLog = serde_json::from_str(&json).unwrap();
        assert_eq!(log, back);
    }
}
