//! Cantor CLI - melody generation and MIDI rendering
//!
//! Command-line interface for the Cantor library.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::debug;

use cantor::cli::{commands, error_report, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Cantor v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(cli.command) {
        eprintln!("{}", error_report(&err));
        std::process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Render {
            input,
            output,
            render,
        } => {
            commands::render(&input, &output, &render)
                .with_context(|| format!("failed to render {}", input.display()))?;
        }
        Commands::Generate {
            corpus,
            midi,
            audio,
            length,
            sequence_length,
            seed,
            render,
        } => {
            commands::generate(
                &corpus,
                &midi,
                audio.as_deref(),
                length,
                sequence_length,
                seed,
                &render,
            )
            .context("melody generation failed")?;
        }
        Commands::Corpus { corpus, top, json } => {
            commands::corpus_stats(&corpus, top, json).context("corpus scan failed")?;
        }
    }

    Ok(())
}
