//! # derrick-cli
//!
//! Command line front end for the Derrick hoisting engine.
//!
//! Reads a dependency graph from a JSON file (an arena of packages plus a
//! root handle, so cyclic graphs stay expressible), hoists it, and prints the
//! result as JSON or as a text tree.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use derrick_core::error::{DerrickError, DerrickResult};
use derrick_hoist::{hoist, DependencyTree, HoistOptions};

/// Dependency hoisting for flat node_modules layouts
#[derive(Parser)]
#[command(name = "derrick", version, about = "Dependency hoisting for flat layouts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Hoist a dependency graph and print the result
    Hoist {
        /// Path to the JSON dependency graph
        input: Utf8PathBuf,
        /// Validate the layout after every promotion
        #[arg(long)]
        check: bool,
        /// Diagnostic verbosity (falls back to NM_DEBUG_LEVEL)
        #[arg(long)]
        debug_level: Option<i32>,
        /// Output representation
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Validate that a graph hoists into a consistent layout
    Check {
        /// Path to the JSON dependency graph
        input: Utf8PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Tree,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    if let Err(err) = run(cli) {
        error!("{err}");
        if let Some(suggestion) = err.suggestion() {
            eprintln!("hint: {suggestion}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> DerrickResult<()> {
    match cli.command {
        Commands::Hoist {
            input,
            check,
            debug_level,
            format,
        } => {
            let tree = load_tree(&input)?;
            let options = HoistOptions { check, debug_level };
            let hoisted = hoist(&tree, &options)?;
            match format {
                OutputFormat::Json => {
                    let rendered = serde_json::to_string_pretty(&hoisted)
                        .map_err(|e| DerrickError::JsonParse {
                            message: e.to_string(),
                        })?;
                    println!("{rendered}");
                }
                OutputFormat::Tree => print!("{}", hoisted.to_text_tree()),
            }
            Ok(())
        }
        Commands::Check { input } => {
            let tree = load_tree(&input)?;
            let options = HoistOptions {
                check: true,
                debug_level: Some(1),
            };
            hoist(&tree, &options)?;
            info!("layout is consistent");
            println!("ok");
            Ok(())
        }
    }
}

fn load_tree(path: &Utf8PathBuf) -> DerrickResult<DependencyTree> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DerrickError::io(format!("Failed to read {path}"), e))?;
    serde_json::from_str(&raw).map_err(|e| DerrickError::JsonParse {
        message: e.to_string(),
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "derrick={level},derrick_hoist={level},derrick_core={level}"
        ))
        .with_target(false)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Derrick encountered an unexpected error: {}", panic_info);
        eprintln!("derrick crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/derrick-nm/derrick/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
