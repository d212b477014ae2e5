//! `fuzzy-miner`: discover, optimize, aggregate and score fuzzy process graphs from CSV event logs.
//!
//! Results are written as JSON to stdout or to `--output`.
//! Diagnostics are controlled with `RUST_LOG` (default: `warn`).

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fuzzy_mining::{
    core::event_data::csv_import::CsvImportOptions, AggregationConfig, AggregationHeuristic,
    AggregationType, EventLog, Grid, Importable, OptimalRates, OptimizerConfig, ProcessGraph,
    TransitionTable,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fuzzy-miner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover a process graph with fixed rates
    Discover {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        rates: RateArgs,
    },
    /// Search the rates maximizing model quality and discover the graph with them
    Optimize {
        #[command(flatten)]
        input: InputArgs,
        /// Optimizer parameters as JSON file (overrides the flags below)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Weight of the complexity penalty in [0, 1]
        #[arg(long, default_value_t = 0.5)]
        lambda: f64,
        /// Grid step for both rates
        #[arg(long, default_value_t = 10)]
        step: u32,
        /// Print progress
        #[arg(short, long)]
        verbose: bool,
        /// Include the scores of every grid point in the output
        #[arg(long)]
        scores: bool,
    },
    /// Discover a process graph and aggregate its significant cycles into meta-states
    Aggregate {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        rates: RateArgs,
        /// Aggregation parameters as JSON file (overrides the flags below)
        #[arg(long)]
        config: Option<PathBuf>,
        /// `outer` or `inner`
        #[arg(long, default_value = "outer")]
        agg_type: AggregationType,
        /// `all` or `frequent`
        #[arg(long, default_value = "all")]
        heuristic: AggregationHeuristic,
        /// Pick cycle rotations by traversing the model from start
        #[arg(long)]
        pre_traverse: bool,
        /// Orient cycles by traversal order and only rewrite that exact sequence
        #[arg(long)]
        ordered: bool,
        /// Minimal share of cases a cycle must occur in
        #[arg(long, default_value_t = 0.5)]
        cycle_rel: f64,
    },
    /// Score a process graph (JSON) against a log
    Score {
        #[command(flatten)]
        input: InputArgs,
        /// Process graph as produced by the other commands
        #[arg(long)]
        graph: PathBuf,
        /// Weight of skipped events (default: 0.5 / number of activities)
        #[arg(long)]
        alpha: Option<f64>,
        /// Weight of forced transitions (default: 1 / number of activities)
        #[arg(long)]
        beta: Option<f64>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Event log (`.csv` or `.csv.gz`) with case id and activity columns
    log: PathBuf,
    /// Index of the case id column
    #[arg(long, default_value_t = 0)]
    case_column: usize,
    /// Index of the activity column
    #[arg(long, default_value_t = 1)]
    activity_column: usize,
    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// The first line is a record, not a header
    #[arg(long)]
    no_headers: bool,
    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct RateArgs {
    /// Activity rate in [0, 100]
    #[arg(long, default_value_t = 100.0)]
    activity_rate: f64,
    /// Path rate in [0, 100]
    #[arg(long, default_value_t = 100.0)]
    path_rate: f64,
}

#[derive(Serialize)]
struct OptimizeOutput<'a> {
    rates: OptimalRates,
    #[serde(skip_serializing_if = "Option::is_none")]
    scores: Option<&'a [fuzzy_mining::discovery::fuzzy::GridPoint]>,
    graph: &'a ProcessGraph,
}

#[derive(Serialize)]
struct ScoreOutput {
    fitness: f64,
    replayability: f64,
    complexity: f64,
}

impl InputArgs {
    fn load_log(&self) -> Result<EventLog> {
        let delimiter = u8::try_from(self.delimiter)
            .with_context(|| format!("Delimiter '{}' is not a single byte", self.delimiter))?;
        let options = CsvImportOptions {
            case_column: self.case_column,
            activity_column: self.activity_column,
            delimiter,
            has_headers: !self.no_headers,
        };
        let log = EventLog::import_from_path_with_options(&self.log, options)
            .with_context(|| format!("Failed to import event log {}", self.log.display()))?;
        tracing::info!(
            cases = log.num_cases(),
            activities = log.activities.len(),
            "Imported event log"
        );
        Ok(log)
    }

    fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, value)?;
                writer.flush()?;
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                serde_json::to_writer_pretty(&mut lock, value)?;
                writeln!(lock)?;
            }
        }
        Ok(())
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn discover(log: &EventLog, rates: &RateArgs) -> Result<ProcessGraph> {
    let table = TransitionTable::from_log(log);
    let mut graph = ProcessGraph::new();
    graph.update(log, rates.activity_rate, rates.path_rate, &table, None)?;
    Ok(graph)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Discover { input, rates } => {
            let log = input.load_log()?;
            let graph = discover(&log, &rates)?;
            input.write(&graph)?;
        }
        Commands::Optimize {
            input,
            config,
            lambda,
            step,
            verbose,
            scores,
        } => {
            let config = match config {
                Some(path) => OptimizerConfig::from_json(&read_to_string(&path)?)
                    .with_context(|| format!("Invalid optimizer config {}", path.display()))?,
                None => OptimizerConfig {
                    lambda,
                    grid: Grid::Step(step),
                    verbose,
                },
            };
            let log = input.load_log()?;
            let table = TransitionTable::from_log(&log);
            let mut graph = ProcessGraph::new();
            let (rates, points) = graph.optimize_with_scores(
                &log,
                &table,
                config.lambda,
                &config.grid,
                config.verbose,
            )?;
            if config.verbose {
                // Progress is printed without trailing newline
                println!();
            }
            input.write(&OptimizeOutput {
                rates,
                scores: scores.then_some(points.as_slice()),
                graph: &graph,
            })?;
        }
        Commands::Aggregate {
            input,
            rates,
            config,
            agg_type,
            heuristic,
            pre_traverse,
            ordered,
            cycle_rel,
        } => {
            let config = match config {
                Some(path) => AggregationConfig::from_json(&read_to_string(&path)?)
                    .with_context(|| format!("Invalid aggregation config {}", path.display()))?,
                None => AggregationConfig {
                    agg_type,
                    heuristic,
                    pre_traverse,
                    ordered,
                    cycle_rel,
                },
            };
            let log = input.load_log()?;
            let mut graph = discover(&log, &rates)?;
            graph.aggregate(&log, rates.activity_rate, rates.path_rate, &config)?;
            input.write(&graph)?;
        }
        Commands::Score {
            input,
            graph,
            alpha,
            beta,
        } => {
            let log = input.load_log()?;
            let graph = ProcessGraph::from_json(&read_to_string(&graph)?)
                .with_context(|| format!("Invalid process graph {}", graph.display()))?;
            let act_cnt = log.activities.len().max(1) as f64;
            let alpha = alpha.unwrap_or(0.5 / act_cnt);
            let beta = beta.unwrap_or(1.0 / act_cnt);
            let table = TransitionTable::from_log(&log);
            input.write(&ScoreOutput {
                fitness: graph.fitness(&log, Some(&table), None),
                replayability: graph.replayability_score(&log, alpha, beta),
                complexity: graph.complexity(),
            })?;
        }
    }
    Ok(())
}
