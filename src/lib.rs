//! Cantor - Melody Generation and MIDI Rendering
//!
//! Cantor turns symbolic melodies into audio:
//! 1. Melody - a sequence model proposes note/chord symbols, written out as MIDI
//! 2. Rendering - MIDI note events become sine tones mixed into one buffer
//!
//! # Architecture
//!
//! The rendering core is split in three:
//! - `engine::score`: Standard MIDI File input
//! - `engine::render`: note pairing, tone placement and the master mix
//! - `engine::io`: MP3/WAV export

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod melody;

pub use config::RenderConfig;
pub use engine::{EventRenderer, RenderOutcome, RenderStats, Score, TimeBase};
pub use error::{CantorError, Result};
pub use melody::{MelodyGenerator, Symbol, SymbolPredictor};
