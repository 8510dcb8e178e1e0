//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::io::Read;
use std::path::Path;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

use crate::cli::RenderArgs;
use crate::config::RenderConfig;
use crate::engine::{EventRenderer, RenderOutcome, RenderStats};
use crate::error::Result;
use crate::melody::{
    symbols_from_corpus, write_melody, CorpusStats, GeneratorConfig, MelodyGenerator,
    ScoreSettings, SuccessorPredictor,
};

/// Build the render configuration from a config file and flag overrides.
pub fn resolve_config(args: &RenderArgs) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(tempo) = args.tempo {
        config.tempo = tempo;
    }
    if let Some(reference) = args.reference_pitch {
        config.reference_pitch_frequency = reference;
    }
    config.validate()?;
    Ok(config)
}

/// Render a MIDI file to audio.
pub fn render(input: &Path, output: &Path, args: &RenderArgs) -> Result<RenderOutcome> {
    let config = resolve_config(args)?;
    let renderer = EventRenderer::new(config)?;

    let outcome = renderer.render(input, output)?;
    report_outcome(output, &outcome)?;
    Ok(outcome)
}

/// Generate a melody from a corpus, write it as MIDI and optionally render it.
pub fn generate(
    corpus: &[impl AsRef<Path>],
    midi: &Path,
    audio: Option<&Path>,
    length: usize,
    sequence_length: usize,
    seed: Option<u64>,
    args: &RenderArgs,
) -> Result<Option<RenderOutcome>> {
    let config = resolve_config(args)?;

    let symbols = symbols_from_corpus(corpus)?;
    let mut predictor = SuccessorPredictor::from_symbols(&symbols)?;
    let generator = MelodyGenerator::new(
        symbols,
        GeneratorConfig {
            sequence_length,
            length,
        },
    )?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let melody = generator.generate(&mut predictor, &mut rng)?;

    let settings = ScoreSettings {
        tempo_bpm: config.tempo,
        ..ScoreSettings::default()
    };
    write_melody(&melody, midi, &settings)?;
    println!("Melody: {} symbols -> {}", melody.len(), midi.display());

    let Some(audio) = audio else {
        return Ok(None);
    };

    let renderer = EventRenderer::new(config)?;
    let outcome = renderer.render(midi, audio)?;
    report_outcome(audio, &outcome)?;
    Ok(Some(outcome))
}

/// Print symbol statistics for a corpus.
pub fn corpus_stats(corpus: &[impl AsRef<Path>], top: usize, json: bool) -> Result<()> {
    let symbols = symbols_from_corpus(corpus)?;
    let stats = CorpusStats::from_symbols(&symbols, top);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Symbols:  {}", stats.total);
    println!("Distinct: {}", stats.distinct);
    println!("Chords:   {}", stats.chords);
    println!("{:-<40}", "");
    for (symbol, count) in &stats.most_common {
        println!("{:>12}  {}", symbol.to_string(), count);
    }

    Ok(())
}

fn report_outcome(output: &Path, outcome: &RenderOutcome) -> Result<()> {
    match outcome {
        RenderOutcome::Rendered(stats) => {
            let checksum = file_checksum(output)?;
            print_stats(output, stats, &checksum);
        }
        RenderOutcome::Aborted { reason } => {
            warn!("Render aborted: {}", reason);
            println!("Render aborted: {} (no file written)", reason);
        }
    }
    Ok(())
}

fn print_stats(output: &Path, stats: &RenderStats, checksum: &str) {
    println!("=== Cantor Render ===");
    println!("Output:   {}", output.display());
    println!("Duration: {:.0} ms", stats.duration_ms);
    println!("Tracks:   {}", stats.tracks);
    println!("Notes:    {}", stats.notes_rendered);
    println!("Peak:     {:.1} dBFS", stats.peak_db);
    println!("RMS:      {:.1} dBFS", stats.rms_db);
    if stats.overwritten_note_ons > 0 {
        println!("Replaced note_ons:  {}", stats.overwritten_note_ons);
    }
    if stats.unmatched_note_offs > 0 {
        println!("Unmatched note_offs: {}", stats.unmatched_note_offs);
    }
    if stats.dropped_open_notes > 0 {
        println!("Unclosed notes:     {}", stats.dropped_open_notes);
    }
    println!("SHA-256:  {}", checksum);
}

/// SHA-256 of a file as lowercase hex.
pub fn file_checksum(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hash = hasher.finalize();
    info!("Checksum of {}: {:x}", path.display(), hash);
    Ok(format!("{:x}", hash))
}
