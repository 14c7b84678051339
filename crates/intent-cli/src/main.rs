mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{cache::CacheSubcommand, config::ConfigSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "intent",
    about = "Map free-form requests and /command invocations to project commands",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .intent/, .claude/ or .git/)
    #[arg(long, global = true, env = "INTENT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log pipeline decisions to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an utterance against the discovered commands
    Classify {
        /// Lifecycle stage to classify in (default: read from .intent/state.yaml)
        #[arg(long)]
        stage: Option<String>,

        /// Skip the embedding fallback
        #[arg(long)]
        no_semantic: bool,

        /// The utterance, e.g. `plan the next phase` or `/plan-phase 3`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },

    /// List discovered commands and the stages they are valid in
    Commands,

    /// Show or validate .intent/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Inspect or maintain the embedding cache
    Cache {
        #[command(subcommand)]
        subcommand: CacheSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Classify {
            stage,
            no_semantic,
            input,
        } => cmd::classify::run(&root, &input.join(" "), stage.as_deref(), no_semantic, cli.json),
        Commands::Commands => cmd::commands::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Cache { subcommand } => cmd::cache::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
