//! Corpus symbol extraction
//!
//! Turns a set of MIDI files into one ordered stream of [`Symbol`]s. Each file
//! contributes its note onsets in time order. Onsets of one track that land on
//! the same tick are folded into a single chord symbol; onsets of different
//! tracks stay separate and follow track order within a tick.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::engine::{EventKind, Score};
use crate::error::{CantorError, Result};
use crate::melody::symbol::Symbol;

/// File extensions picked up when walking a directory
pub const MIDI_EXTENSIONS: &[&str] = &["mid", "midi"];

/// Collect the MIDI files under `paths`, sorted by path
///
/// Plain files are taken as given; directories are walked recursively and
/// filtered by extension.
pub fn midi_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CantorError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }

        for entry in WalkDir::new(path).follow_links(true) {
            let entry = entry.map_err(|e| CantorError::Io(e.into()))?;
            if entry.file_type().is_file() && has_midi_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn has_midi_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MIDI_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Symbols of one parsed file, ordered by onset tick then track index
///
/// note_on events with velocity 0 are not onsets.
pub fn symbols_from_score(score: &Score) -> Vec<Symbol> {
    let mut onsets: BTreeMap<(u64, usize), BTreeSet<i32>> = BTreeMap::new();

    for (index, track) in score.tracks.iter().enumerate() {
        let mut tick = 0_u64;
        for event in track {
            tick += event.delta_ticks as u64;
            if event.kind == EventKind::NoteOn && event.velocity > 0 {
                onsets.entry((tick, index)).or_default().insert(event.pitch);
            }
        }
    }

    onsets
        .into_values()
        .map(|pitches| match pitches.first() {
            Some(&pitch) if pitches.len() == 1 => Symbol::Note(pitch),
            _ => Symbol::chord_from_pitches(pitches),
        })
        .collect()
}

/// Read every MIDI file under `paths` and concatenate their symbols
///
/// Files that fail to parse are skipped with a warning. A corpus without any
/// symbol is an error.
pub fn symbols_from_corpus<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Symbol>> {
    let files = midi_files(paths)?;
    let mut symbols = Vec::new();

    for file in &files {
        match Score::load(file) {
            Ok(score) => {
                let extracted = symbols_from_score(&score);
                debug!("{}: {} symbols", file.display(), extracted.len());
                symbols.extend(extracted);
            }
            Err(e) => warn!("Skipping {}: {}", file.display(), e),
        }
    }

    if symbols.is_empty() {
        return Err(CantorError::EmptyCorpus {
            found: 0,
            required: 1,
        });
    }

    info!(
        "Extracted {} symbols from {} MIDI files",
        symbols.len(),
        files.len()
    );
    Ok(symbols)
}

/// Summary of a symbol stream, printed by the `corpus` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStats {
    pub total: usize,
    pub distinct: usize,
    pub chords: usize,
    /// Most frequent symbols, descending by count then ascending by symbol
    pub most_common: Vec<(Symbol, usize)>,
}

impl CorpusStats {
    pub fn from_symbols(symbols: &[Symbol], top: usize) -> Self {
        let mut counts: HashMap<&Symbol, usize> = HashMap::new();
        for symbol in symbols {
            *counts.entry(symbol).or_insert(0) += 1;
        }

        let mut ranked: Vec<(Symbol, usize)> = counts
            .iter()
            .map(|(symbol, &count)| ((*symbol).clone(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top);

        Self {
            total: symbols.len(),
            distinct: counts.len(),
            chords: symbols.iter().filter(|s| s.is_chord()).count(),
            most_common: ranked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TimedEvent;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_simultaneous_onsets_form_chord_within_a_track() {
        let score = Score::new(
            480,
            0.0,
            vec![
                vec![
                    TimedEvent::note_on(0, 60, 0),
                    TimedEvent::note_off(0, 60, 480),
                    TimedEvent::note_on(0, 62, 0),
                    TimedEvent::note_off(0, 62, 480),
                ],
                vec![
                    TimedEvent::note_on(1, 64, 0),
                    TimedEvent::note_on(1, 67, 0),
                    TimedEvent::note_off(1, 64, 960),
                    TimedEvent::note_off(1, 67, 0),
                ],
            ],
        );

        let symbols = symbols_from_score(&score);
        assert_eq!(
            symbols,
            vec![
                Symbol::Note(60),
                Symbol::Chord(vec![4, 7]),
                Symbol::Note(62)
            ]
        );
    }

    #[test]
    fn test_chord_symbols_use_normal_order() {
        // G major triad in second inversion: D4 G4 B4
        let score = Score::new(
            480,
            0.0,
            vec![vec![
                TimedEvent::note_on(0, 62, 0),
                TimedEvent::note_on(0, 67, 0),
                TimedEvent::note_on(0, 71, 0),
            ]],
        );

        let symbols = symbols_from_score(&score);
        assert_eq!(symbols, vec![Symbol::Chord(vec![7, 11, 2])]);
        assert_eq!(symbols[0].to_string(), "7.11.2");
    }

    #[test]
    fn test_velocity_zero_is_not_an_onset() {
        let score = Score::new(
            480,
            0.0,
            vec![vec![
                TimedEvent::note_on(0, 60, 0),
                TimedEvent::note_on(0, 60, 240).with_velocity(0),
                TimedEvent::note_on(0, 65, 240),
            ]],
        );

        assert_eq!(
            symbols_from_score(&score),
            vec![Symbol::Note(60), Symbol::Note(65)]
        );
    }

    #[test]
    fn test_midi_files_filters_and_sorts() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("b.mid"), b"").unwrap();
        std::fs::write(nested.join("a.MIDI"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = midi_files(&[dir.path()]).unwrap();
        assert_eq!(files, vec![dir.path().join("b.mid"), nested.join("a.MIDI")]);
    }

    #[test]
    fn test_missing_corpus_path() {
        let err = midi_files(&[Path::new("/nonexistent/corpus")]).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_corpus_of_unreadable_files_is_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.mid"), b"not midi").unwrap();

        let err = symbols_from_corpus(&[dir.path()]).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_CORPUS");
    }

    #[test]
    fn test_corpus_stats() {
        let symbols: Vec<Symbol> = ["C4", "E4", "C4", "0.4.7", "E4", "C4"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();

        let stats = CorpusStats::from_symbols(&symbols, 2);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.distinct, 3);
        assert_eq!(stats.chords, 1);
        assert_eq!(
            stats.most_common,
            vec![(Symbol::Note(60), 3), (Symbol::Note(64), 2)]
        );
    }
}
