//! CLI Module
//!
//! Command-line interface for Cantor.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::CantorError;

/// Cantor - melody generation and MIDI-to-audio rendering
#[derive(Parser, Debug)]
#[command(name = "cantor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that renders audio
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// JSON render configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Playback tempo in beats per minute (overrides the config)
    #[arg(short, long)]
    pub tempo: Option<f64>,

    /// Frequency of MIDI pitch 69 in Hz (overrides the config)
    #[arg(long)]
    pub reference_pitch: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a MIDI file to MP3 or WAV
    #[command(name = "render")]
    Render {
        /// Input MIDI file
        input: PathBuf,

        /// Output audio file (.mp3 or .wav)
        output: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Generate a melody from a MIDI corpus
    #[command(name = "generate")]
    Generate {
        /// MIDI files or directories to learn from
        #[arg(long, required = true, num_args = 1..)]
        corpus: Vec<PathBuf>,

        /// Output MIDI file for the generated melody
        #[arg(long)]
        midi: PathBuf,

        /// Also render the melody to this audio file
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Number of symbols to generate
        #[arg(long, default_value_t = 500)]
        length: usize,

        /// Context window length
        #[arg(long, default_value_t = 100)]
        sequence_length: usize,

        /// Seed for the random start window
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print symbol statistics for a MIDI corpus
    #[command(name = "corpus")]
    Corpus {
        /// MIDI files or directories
        #[arg(long, required = true, num_args = 1..)]
        corpus: Vec<PathBuf>,

        /// Number of most frequent symbols to list
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Format a failed command for the terminal
///
/// The whole context chain goes on the first line; when the root cause is a
/// [`CantorError`], its code and recovery suggestions follow.
pub fn error_report(err: &anyhow::Error) -> String {
    let mut report = format!("Error: {:#}", err);
    if let Some(cause) = err.downcast_ref::<CantorError>() {
        report.push_str(&format!("\n  code: {}", cause.error_code()));
        for suggestion in cause.recovery_suggestions() {
            report.push_str(&format!("\n  hint: {}", suggestion));
        }
    }
    report
}
