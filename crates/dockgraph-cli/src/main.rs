#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{CommandFactory, Parser, Subcommand};
use dockgraph_core::{config, timing};
use output::{CliError, OutputMode};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(
    name = "dg",
    author,
    version,
    about = "dockgraph: bike-share station network analysis",
    long_about = None
)]
struct Cli {
    /// Enable debug logging for dockgraph crates.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit command timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file to use instead of `./dockgraph.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Analysis",
        about = "Degree and betweenness centrality per station",
        long_about = "Build the weighted station graph from a trip export and compute degree and \
                      betweenness centrality for every station.",
        after_help = "EXAMPLES:\n    # Every station, by id\n    dg centrality 202206-citibike-tripdata.csv\n\n    # Ten most central stations by betweenness\n    dg centrality trips.csv --sort betweenness --limit 10\n\n    # Use all cores\n    dg centrality trips.csv --parallel --json"
    )]
    Centrality(cmd::centrality::CentralityArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Station graph statistics",
        long_about = "Show station, route and trip counts, connectivity and the content hash of \
                      the station graph.",
        after_help = "EXAMPLES:\n    # Graph statistics\n    dg graph trips.csv\n\n    # Emit machine-readable output\n    dg graph trips.csv --format json"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Reporting",
        about = "Rider mix, seasonal and daily trip volume",
        after_help = "EXAMPLES:\n    # Summarise an export\n    dg summary trips.csv\n\n    # Summer and fall only\n    dg summary trips.csv --season summer --season fall"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Reporting",
        about = "Busiest start stations or routes",
        after_help = "EXAMPLES:\n    # Twenty busiest start stations\n    dg top trips.csv\n\n    # Five busiest routes\n    dg top trips.csv --routes --limit 5"
    )]
    Top(cmd::top::TopArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    dg completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DOCKGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "dockgraph=debug,info"
        } else {
            "dockgraph=info,warn"
        })
    });

    let format = env::var("DOCKGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout is reserved for command output.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    let project_root = env::current_dir()?;
    let config = match config::load_config(&project_root, cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let mode = output::resolve_output_mode(cli.format, cli.json, None);
            output::render_error(mode, &CliError::from(&err))?;
            return Err(err).context("failed to load dockgraph configuration");
        }
    };
    debug!(?config, "effective configuration");

    let output = output::resolve_output_mode(cli.format, cli.json, config.output.format.as_deref());
    info!(mode = ?output, "dockgraph starting");

    let command_result = match cli.command {
        Commands::Centrality(ref args) => timing::timed("cmd.centrality", || {
            cmd::centrality::run_centrality(args, output, &config)
        }),
        Commands::Graph(ref args) => {
            timing::timed("cmd.graph", || cmd::graph::run_graph(args, output))
        }
        Commands::Summary(ref args) => {
            timing::timed("cmd.summary", || cmd::summary::run_summary(args, output))
        }
        Commands::Top(ref args) => {
            timing::timed("cmd.top", || cmd::top::run_top(args, output, &config))
        }
        Commands::Completions(ref args) => timing::timed("cmd.completions", || {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }),
    };

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    command_result
}
