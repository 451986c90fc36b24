//! Parley CLI - run vocabulary alignment experiments.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use parley_agents::agent::AgentKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about = "Parley - agents aligning vocabularies through interaction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Parley project
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Generate a corpus of random satisfiable protocols
    Generate {
        /// Number of protocols
        #[arg(short, long, default_value = "200")]
        count: usize,

        /// Output directory
        #[arg(short, long, default_value = "corpus")]
        out: String,

        /// Random seed (overrides the config)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Run an alignment experiment
    Run {
        /// Agent preset (simple, simple-mon, student, student-mon,
        /// cooperative, reasoner, logical)
        #[arg(short, long)]
        agent: Option<AgentKind>,

        /// Interactions per repetition
        #[arg(short, long)]
        interactions: Option<usize>,

        /// Number of repetitions
        #[arg(short, long)]
        repetitions: Option<usize>,

        /// Play protocols from this directory instead of generating them
        #[arg(short, long)]
        corpus: Option<String>,

        /// Write the JSON report to this file
        #[arg(short, long)]
        out: Option<String>,

        /// Random seed (overrides the config)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Print a protocol file and one history that satisfies it
    Show {
        /// Protocol JSON file
        path: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Generate { count, out, seed } => commands::generate::run(count, &out, seed),
        Commands::Run {
            agent,
            interactions,
            repetitions,
            corpus,
            out,
            seed,
        } => commands::run::run(
            commands::run::Overrides {
                agent,
                interactions,
                repetitions,
                seed,
            },
            corpus.as_deref(),
            out.as_deref(),
            cli.verbose,
        ),
        Commands::Show { path } => commands::show::run(&path),
    }
}
