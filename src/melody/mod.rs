//! Melody Module
//!
//! Everything around the sequence model:
//! - Note/chord symbols
//! - Corpus extraction from MIDI files
//! - The predictor interface and an offline stand-in
//! - The generation loop
//! - Writing generated symbols back to MIDI

pub mod corpus;
pub mod generator;
pub mod predictor;
pub mod score;
pub mod symbol;

pub use corpus::{midi_files, symbols_from_corpus, symbols_from_score, CorpusStats};
pub use generator::{GeneratorConfig, MelodyGenerator};
pub use predictor::{SuccessorPredictor, SymbolPredictor};
pub use score::{melody_to_smf, write_melody, ScoreSettings};
pub use symbol::Symbol;
