//! Tomato CLI
//!
//! Runs JavaScript through an embedded context and prints the result.

mod settings;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tomato::Context;

use crate::settings::Settings;

/// Embedded JavaScript runner
#[derive(Parser, Debug)]
#[command(name = "tomato")]
#[command(about = "Run JavaScript in an embedded V8 context", long_about = None)]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the embedded V8 version
    Version,

    /// Evaluate a script: SOURCE [FILENAME]
    Eval {
        #[arg(num_args = 0.., allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a script file
    Run {
        /// Script to execute
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Version => {
            println!("{}", Context::version());
        }
        Command::Eval { args } => {
            let mut context = Context::with_config(settings.context)?;
            let result = context.run_args(args.as_slice())?;
            println!("{}", result);
        }
        Command::Run { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            debug!("Running {}", file.display());

            let mut context = Context::with_config(settings.context)?;
            let result = context.run_named(&source, &file.display().to_string())?;
            println!("{}", result);
        }
    }

    Ok(())
}
