//! Relay CLI - move data loader artifacts and synthesize entry-point scripts
//!
//! This CLI provides a `relay` command over the storage and codegen crates.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{artifact, script};
use config::RelayConfig;

/// Relay CLI - ship data loaders to storage and generate the script that uses them
#[derive(Parser, Debug)]
#[command(name = "relay", author, version, about = "Relay - artifact storage and entry-point script synthesis")]
struct Args {
    /// Log level (trace, debug, info, warn, error); falls back to config, then info
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Config file to use instead of ./.relayrc and ~/.relay/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how a location string is interpreted
    Resolve {
        /// `gs://bucket/prefix` or a local path
        location: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serialize a data loader to a local or `gs://` target
    ///
    /// Prints the resulting artifact record as JSON.
    Serialize {
        /// Target root (`gs://bucket/prefix` or a local directory)
        #[arg(short, long)]
        target: String,

        /// Role the loader plays (training, validation, ...)
        #[arg(short, long, default_value = "training")]
        role: String,

        /// Data loader JSON file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Load a serialized data loader back
    Deserialize {
        /// Artifact location (`gs://bucket/path.pth` or a local file)
        location: String,

        /// Write the restored loader here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a standalone script that rebuilds a class and calls one method
    Synthesize {
        /// Class descriptor JSON file
        #[arg(short, long)]
        descriptor: PathBuf,

        /// Method to invoke
        #[arg(short, long)]
        method: String,

        /// Serialized parameter, NAME:TYPE_TAG=LOCATION (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,

        /// Pass-through parameter, NAME=JSON (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Positional constructor argument as JSON (repeatable)
        #[arg(long = "ctor-arg")]
        ctor_args: Vec<String>,

        /// Keyword constructor argument, NAME=JSON (repeatable)
        #[arg(long = "ctor-kwarg")]
        ctor_kwargs: Vec<String>,

        /// Write the script here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered type tags and their (de)serializers
    Registry {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RelayConfig::load_from_file(path)?,
        None => RelayConfig::discover_and_load()?,
    };

    let level = match args.log_level.as_deref().or(config.log_level.as_deref()).unwrap_or("info") {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Resolve { location, json } => artifact::resolve(&location, json)?,
        Command::Serialize { target, role, input } => artifact::serialize(&config.storage, &target, &role, &input)?,
        Command::Deserialize { location, output } => artifact::deserialize(&config.storage, &location, output)?,
        Command::Synthesize { descriptor, method, params, args, ctor_args, ctor_kwargs, output } => {
            let registry = config.build_registry()?;
            script::synthesize(
                &registry,
                script::SynthesizeOptions { descriptor, method, params, args, ctor_args, ctor_kwargs, output },
            )?;
        }
        Command::Registry { json } => script::list_registry(&config.build_registry()?, json)?,
    }

    Ok(())
}
