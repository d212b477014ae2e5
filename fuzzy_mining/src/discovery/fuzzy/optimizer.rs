use std::io::Write;

use serde::{Deserialize, Serialize};

use super::{
    config::{Grid, OptimizerConfig},
    error::{check_rate, check_ratio, FuzzyMinerError},
};
use crate::core::{
    event_data::{EventLog, TransitionTable},
    process_models::process_graph::ProcessGraph,
};

/// Thresholds selected by [`ProcessGraph::optimize`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimalRates {
    /// Activity rate
    pub activities: f64,
    /// Path rate
    pub paths: f64,
}

/// Scores of one evaluated grid point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Activity rate
    pub activity_rate: f64,
    /// Path rate
    pub path_rate: f64,
    /// See [`ProcessGraph::replayability_score`]
    pub replayability: f64,
    /// See [`ProcessGraph::complexity`]
    pub complexity: f64,
    /// `(1 - lambda) * replayability + lambda * (1 - complexity / max_complexity)`
    pub quality: f64,
}

impl ProcessGraph {
    ///
    /// Find the rates maximizing the quality of the model and rediscover the graph with them
    ///
    /// Every `(activity_rate, path_rate)` pair of `grid` is evaluated (activity rate in the
    /// outer loop). `lambda` in `[0, 1]` weights the penalty for complexity against
    /// replayability. On ties, the first pair in grid order wins.
    /// With `verbose`, progress is printed to stdout.
    ///
    pub fn optimize(
        &mut self,
        log: &EventLog,
        table: &TransitionTable,
        lambda: f64,
        grid: &Grid,
        verbose: bool,
    ) -> Result<OptimalRates, FuzzyMinerError> {
        self.optimize_with_scores(log, table, lambda, grid, verbose)
            .map(|(rates, _)| rates)
    }

    /// [`ProcessGraph::optimize`] with parameters from an [`OptimizerConfig`]
    pub fn optimize_with_config(
        &mut self,
        log: &EventLog,
        table: &TransitionTable,
        config: &OptimizerConfig,
    ) -> Result<OptimalRates, FuzzyMinerError> {
        self.optimize(log, table, config.lambda, &config.grid, config.verbose)
    }

    ///
    /// Same as [`ProcessGraph::optimize`], additionally returning the scores of every grid point
    /// (in grid order)
    ///
    pub fn optimize_with_scores(
        &mut self,
        log: &EventLog,
        table: &TransitionTable,
        lambda: f64,
        grid: &Grid,
        verbose: bool,
    ) -> Result<(OptimalRates, Vec<GridPoint>), FuzzyMinerError> {
        check_ratio("lambda", lambda)?;
        let rates = grid.rates()?;
        for rate in &rates {
            check_rate("grid rate", *rate)?;
        }
        if log.activities.is_empty() {
            return Err(FuzzyMinerError::InvalidParameter(
                "cannot optimize on a log without activities".to_string(),
            ));
        }
        let act_cnt = log.activities.len() as f64;
        let (alpha, beta) = (0.5 / act_cnt, 1.0 / act_cnt);

        let mut graph = ProcessGraph::new();
        let per_step = 100.0 / (rates.len() * rates.len()) as f64;
        let mut per_done = 0.0;
        let mut points = Vec::with_capacity(rates.len() * rates.len());
        for &activity_rate in &rates {
            for &path_rate in &rates {
                graph.update(log, activity_rate, path_rate, table, None)?;
                points.push(GridPoint {
                    activity_rate,
                    path_rate,
                    replayability: graph.replayability_score(log, alpha, beta),
                    complexity: graph.complexity(),
                    quality: 0.0,
                });
                if verbose {
                    per_done += per_step;
                    print!("\rOptimization ..... {:.2}%", per_done);
                    let _ = std::io::stdout().flush();
                }
            }
        }

        graph.update(log, 100.0, 100.0, table, None)?;
        let max_complexity = graph.complexity();
        let mut best: Option<GridPoint> = None;
        for point in points.iter_mut() {
            let relative_complexity = if max_complexity > 0.0 {
                point.complexity / max_complexity
            } else {
                0.0
            };
            point.quality =
                (1.0 - lambda) * point.replayability + lambda * (1.0 - relative_complexity);
            tracing::debug!(
                activity_rate = point.activity_rate,
                path_rate = point.path_rate,
                replayability = point.replayability,
                complexity = point.complexity,
                quality = point.quality,
                "Evaluated grid point"
            );
            if best.map_or(true, |b| point.quality > b.quality) {
                best = Some(*point);
            }
        }
        let Some(best) = best else {
            return Err(FuzzyMinerError::InvalidParameter("empty grid".to_string()));
        };

        graph.update(log, best.activity_rate, best.path_rate, table, None)?;
        *self = graph;
        Ok((
            OptimalRates {
                activities: best.activity_rate,
                paths: best.path_rate,
            },
            points,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::event_data::Activity, event_log};

    fn act(s: &str) -> Activity {
        Activity::from(s)
    }

    fn corners() -> Grid {
        Grid::Points(vec![0.0, 100.0])
    }

    #[test]
    fn balanced_lambda_prefers_simpler_model() {
        let log = event_log!("A" => ["x", "y", "x", "y"], "B" => ["x", "y"]);
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        let (rates, scores) = graph
            .optimize_with_scores(&log, &table, 0.5, &corners(), false)
            .unwrap();
        assert_eq!(rates, OptimalRates { activities: 0.0, paths: 0.0 });
        assert_eq!(scores.len(), 4);
        assert!((scores[0].replayability - 0.875).abs() < 1e-12);
        assert!((scores[0].complexity - 0.75).abs() < 1e-12);
        assert!((scores[0].quality - 0.5625).abs() < 1e-12);
        assert!((scores[1].quality - 0.5).abs() < 1e-12);
        // graph is rebuilt at the optimum
        assert!(!graph.contains_edge(&act("y"), &act("x")));
    }

    #[test]
    fn lambda_zero_maximizes_replayability() {
        let log = event_log!("A" => ["x", "y", "x", "y"], "B" => ["x", "y"]);
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        let rates = graph.optimize(&log, &table, 0.0, &corners(), false).unwrap();
        // (0, 100) and (100, 100) tie; the first one in grid order wins
        assert_eq!(rates, OptimalRates { activities: 0.0, paths: 100.0 });
        assert!(graph.contains_edge(&act("y"), &act("x")));
    }

    #[test]
    fn step_grid_covers_all_pairs() {
        let log = event_log!("1" => ["a", "b", "c"], "2" => ["a", "c"], "3" => ["a", "d", "c"]);
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        let config = OptimizerConfig {
            grid: Grid::Step(25),
            ..OptimizerConfig::default()
        };
        let (_, scores) = graph
            .optimize_with_scores(&log, &table, config.lambda, &config.grid, false)
            .unwrap();
        assert_eq!(scores.len(), 25);
        assert!(scores
            .iter()
            .all(|p| (0.0..=1.0).contains(&p.replayability) && p.complexity > 0.0));
        let best = graph.optimize_with_config(&log, &table, &config).unwrap();
        assert!(scores.iter().any(|p| p.activity_rate == best.activities && p.path_rate == best.paths));
    }

    #[test]
    fn invalid_parameters_leave_graph_untouched() {
        let log = event_log!("A" => ["x", "y", "x", "y"], "B" => ["x", "y"]);
        let table = TransitionTable::from_log(&log);
        let mut graph = ProcessGraph::new();
        graph.update(&log, 100.0, 100.0, &table, None).unwrap();
        let before = graph.clone();
        for (lambda, grid) in [
            (1.5, corners()),
            (0.5, Grid::Points(vec![0.0, 150.0])),
            (0.5, Grid::Points(vec![])),
            (0.5, Grid::Step(0)),
        ] {
            let res = graph.optimize(&log, &table, lambda, &grid, false);
            assert!(matches!(res, Err(FuzzyMinerError::InvalidParameter(_))));
            assert_eq!(graph, before);
        }
    }
}
