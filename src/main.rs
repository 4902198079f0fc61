//! Skirmish Search - Main Binary
//!
//! Runs searches, playouts and tournaments on scenario files

use clap::{Parser, Subcommand, ValueEnum};
use skirmish_search::{
    core::Allegiance,
    playout::{Playout, PlayoutConfig},
    scenario::{random_scenario, Scenario},
    search::{
        compute_state_hash, state_hash::format_hash, SearchEngine, SearchLogger, TargetOrder,
        ValueFunction, VerbosityLevel,
    },
    tournament::{run_tournament, PolicyKind, TournamentConfig},
    Result,
};
use std::path::PathBuf;

/// Policy type for playouts and tournaments
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Alpha-beta search with the scenario's configuration
    Search,
    /// Attack the nearest target in range, else advance on it
    Closest,
    /// Never act
    Hold,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Search => PolicyKind::Search,
            PolicyArg::Closest => PolicyKind::AttackClosest,
            PolicyArg::Hold => PolicyKind::Hold,
        }
    }
}

/// Verbosity level for output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(
    about = "Skirmish Search - tactical alpha-beta search for unit combat",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one decision for the friendly side of a scenario
    Search {
        /// Scenario file (JSON)
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        /// Maximum search depth in plies (overrides the scenario)
        #[arg(long, short = 'd')]
        depth: Option<i32>,

        /// Time budget in milliseconds (overrides the scenario)
        #[arg(long)]
        time_ms: Option<i64>,

        /// Target ordering, repeatable for a tie-break chain (roster, closest, weakest, priority)
        #[arg(long, value_name = "ORDER")]
        order: Vec<TargetOrder>,

        /// Value function (inflicted, difference, ltd)
        #[arg(long, value_name = "FUNCTION")]
        eval: Option<ValueFunction>,

        /// Search root moves in parallel
        #[arg(long)]
        parallel: bool,

        /// Verbosity level: silent/0, minimal/1, normal/2, verbose/3
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a seeded random scenario as JSON
    Random {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Units per side
        #[arg(long, default_value_t = 2)]
        units: usize,
    },

    /// Play a scenario forward until one side is eliminated
    Playout {
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        #[arg(long, value_enum, default_value = "search")]
        friendly: PolicyArg,

        #[arg(long, value_enum, default_value = "closest")]
        hostile: PolicyArg,

        /// Simulated time limit
        #[arg(long, default_value_t = 60.0)]
        max_time: f64,

        #[arg(long, default_value = "minimal", short = 'v')]
        verbosity: VerbosityArg,
    },

    /// Run many random playouts in parallel and report win rates
    Tourney {
        #[arg(long, short = 'g', default_value_t = 100)]
        games: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Units per side
        #[arg(long, default_value_t = 2)]
        units: usize,

        #[arg(long, value_enum, default_value = "search")]
        friendly: PolicyArg,

        #[arg(long, value_enum, default_value = "closest")]
        hostile: PolicyArg,

        /// Search depth for search policies
        #[arg(long, short = 'd', default_value_t = 3)]
        depth: i32,

        /// Search time budget per decision in milliseconds
        #[arg(long, default_value_t = 20)]
        time_ms: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            scenario,
            depth,
            time_ms,
            order,
            eval,
            parallel,
            verbosity,
            json,
        } => run_search(scenario, depth, time_ms, order, eval, parallel, verbosity.into(), json)?,
        Commands::Random { seed, units } => {
            println!("{}", random_scenario(seed, units).to_json_pretty()?);
        }
        Commands::Playout {
            scenario,
            friendly,
            hostile,
            max_time,
            verbosity,
        } => run_playout(scenario, friendly, hostile, max_time, verbosity.into())?,
        Commands::Tourney {
            games,
            seed,
            units,
            friendly,
            hostile,
            depth,
            time_ms,
        } => {
            let config = TournamentConfig {
                games,
                seed,
                units_per_side: units,
                friendly: friendly.into(),
                hostile: hostile.into(),
                search: TournamentConfig::default()
                    .search
                    .with_depth(depth)
                    .with_time_budget_ms(time_ms),
                playout: PlayoutConfig::default(),
            };
            run_tourney(&config)?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_search(
    path: PathBuf,
    depth: Option<i32>,
    time_ms: Option<i64>,
    order: Vec<TargetOrder>,
    eval: Option<ValueFunction>,
    parallel: bool,
    verbosity: VerbosityLevel,
    json: bool,
) -> Result<()> {
    let scenario = Scenario::load(&path)?;
    let mut config = scenario.config.clone();
    if let Some(depth) = depth {
        config.max_depth = depth;
    }
    if let Some(time_ms) = time_ms {
        config.time_budget_ms = time_ms;
    }
    if !order.is_empty() {
        config = config.with_target_order(order);
    }
    if let Some(eval) = eval {
        config.value_function = eval;
    }
    if parallel {
        config.parallel_root = true;
    }

    let root = scenario.root_state()?;
    let logger = SearchLogger::with_verbosity(if json {
        VerbosityLevel::Silent
    } else {
        verbosity
    });
    let engine = SearchEngine::new(config)?.with_logger(logger);
    let outcome = engine.search(&root)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if verbosity >= VerbosityLevel::Minimal {
        println!(
            "=== {} ===",
            scenario.name.as_deref().unwrap_or_else(|| path.to_str().unwrap_or("scenario"))
        );
        println!(
            "score {:.2}{} | depth {} | {} nodes, {} leaves | {:.2}ms | root {}",
            outcome.score,
            if outcome.partial { " (partial)" } else { "" },
            outcome.stats.depth_completed,
            outcome.stats.nodes_searched,
            outcome.stats.leaves_evaluated,
            outcome.stats.elapsed.as_secs_f64() * 1000.0,
            format_hash(compute_state_hash(&root))
        );
        for order in outcome.orders() {
            println!("{order}");
        }
    }
    Ok(())
}

fn run_playout(
    path: PathBuf,
    friendly: PolicyArg,
    hostile: PolicyArg,
    max_time: f64,
    verbosity: VerbosityLevel,
) -> Result<()> {
    let scenario = Scenario::load(&path)?;
    let mut friendly = PolicyKind::from(friendly).build(Allegiance::Friendly, &scenario.config)?;
    let mut hostile = PolicyKind::from(hostile).build(Allegiance::Hostile, &scenario.config)?;

    let config = PlayoutConfig {
        max_time,
        time_step: scenario.config.time_step,
    };
    let mut playout =
        Playout::with_config(scenario.root_state()?, config).with_verbosity(verbosity);
    playout.run(friendly.as_mut(), hostile.as_mut())?;
    Ok(())
}

fn run_tourney(config: &TournamentConfig) -> Result<()> {
    println!("=== Skirmish Search - Tournament Mode ===\n");
    println!(
        "Running {} games ({} vs {} units, seed {}): friendly={:?}, hostile={:?}",
        config.games,
        config.units_per_side,
        config.units_per_side,
        config.seed,
        config.friendly,
        config.hostile
    );

    let summary = run_tournament(config)?;

    println!();
    println!("Games:         {}", summary.games);
    println!(
        "Friendly wins: {} ({:.1}%)",
        summary.friendly_wins,
        summary.friendly_win_rate() * 100.0
    );
    println!("Hostile wins:  {}", summary.hostile_wins);
    println!("Draws:         {}", summary.draws);
    if summary.games > 0 {
        println!(
            "Avg cycles:    {:.1}",
            summary.total_cycles as f64 / summary.games as f64
        );
    }
    println!("Elapsed:       {:.2}s", summary.elapsed.as_secs_f64());
    Ok(())
}
