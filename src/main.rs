//! embercore - drive the runtime from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use embercore::config::RuntimeConfig;
use embercore::replay::{self, Script};
use embercore::{demo, logging, Runtime, ABI_VERSION};

#[derive(Parser, Debug)]
#[command(name = "embercore")]
#[command(version)]
#[command(about = "Replay event scripts against the embercore runtime")]
#[command(long_about = "\
embercore - replay event scripts against the embercore runtime

Runs the same state machine native shells embed, with the bundled demo
reducers, and prints version, counter, queue depth and changed fields
after every step.

USAGE EXAMPLES:
    # Print the C ABI version of this build
    embercore abi-version

    # Replay a script
    embercore replay script.toml

    # JSON lines, custom queue capacity from a config file
    embercore replay script.toml --config runtime.toml --format json

EXIT CODES:
    0 - Success
    1 - Script or configuration error
    2 - At least one step failed
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the C ABI version
    AbiVersion,

    /// Run a TOML event script
    Replay {
        /// Path to the script
        script: PathBuf,

        /// Runtime config file (defaults to the standard location)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    logging::init_stderr_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::AbiVersion => {
            println!("{}", ABI_VERSION);
            Ok(0)
        }
        Commands::Replay {
            script,
            config,
            format,
        } => {
            let config = match config {
                Some(path) => RuntimeConfig::load_from(&path),
                None => RuntimeConfig::load(),
            }
            .context("loading runtime config")?;
            let script = Script::load(&script)?;

            let mut runtime =
                Runtime::with_initial_state(&config, demo::registry(), demo::initial_state());
            let outcomes = replay::run(&script, &mut runtime);

            for outcome in &outcomes {
                match format {
                    Format::Text => println!("{}", outcome),
                    Format::Json => println!("{}", serde_json::to_string(outcome)?),
                }
            }

            let failed = outcomes.iter().any(|o| o.error.is_some());
            Ok(if failed { 2 } else { 0 })
        }
    }
}
