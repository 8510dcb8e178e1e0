//! Writing generated melodies as MIDI files
//!
//! Every symbol becomes one step of equal length: a single note, or all chord
//! members sounding together. The file is a single-track SMF with a tempo
//! event, so the renderer reads back exactly the timing written here.

use std::path::Path;

use log::info;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};

use crate::engine::io::write_atomic;
use crate::error::{CantorError, Result};
use crate::melody::symbol::Symbol;

/// Layout of a written melody
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreSettings {
    pub ticks_per_beat: u16,
    /// Length of each symbol in beats
    pub note_beats: f64,
    pub tempo_bpm: f64,
    pub velocity: u8,
    pub channel: u8,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            ticks_per_beat: 480,
            note_beats: 0.5,
            tempo_bpm: 100.0,
            velocity: 90,
            channel: 0,
        }
    }
}

impl ScoreSettings {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(CantorError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.ticks_per_beat == 0 || self.ticks_per_beat > 0x7FFF {
            return invalid("ticks_per_beat must be between 1 and 32767");
        }
        if !(self.note_beats > 0.0) || self.note_ticks() == 0 {
            return invalid("note_beats must be long enough to span at least one tick");
        }
        if !(self.tempo_bpm > 0.0) || self.micros_per_beat() > 0xFF_FFFF {
            return invalid("tempo_bpm out of range");
        }
        if self.velocity == 0 || self.velocity > 127 {
            return invalid("velocity must be between 1 and 127");
        }
        if self.channel > 15 {
            return invalid("channel must be between 0 and 15");
        }
        Ok(())
    }

    pub fn note_ticks(&self) -> u32 {
        (self.note_beats * self.ticks_per_beat as f64).round() as u32
    }

    fn micros_per_beat(&self) -> u32 {
        (60_000_000.0 / self.tempo_bpm).round() as u32
    }
}

/// Encode `symbols` as a single-track Standard MIDI File
pub fn melody_to_smf(symbols: &[Symbol], settings: &ScoreSettings) -> Result<Vec<u8>> {
    settings.validate()?;

    let channel = u4::new(settings.channel);
    let velocity = u7::new(settings.velocity);
    let note_ticks = settings.note_ticks();

    let mut track: Vec<TrackEvent> = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(settings.micros_per_beat()))),
    }];

    for symbol in symbols {
        let keys = symbol
            .to_pitches()
            .into_iter()
            .map(|pitch| {
                Some(pitch)
                    .filter(|p| (0..=127).contains(p))
                    .map(|p| u7::new(p as u8))
                    .ok_or_else(|| CantorError::InvalidSymbol {
                        symbol: symbol.to_string(),
                    })
            })
            .collect::<Result<Vec<u7>>>()?;

        for &key in &keys {
            track.push(TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn { key, vel: velocity },
                },
            });
        }
        for (i, &key) in keys.iter().enumerate() {
            let delta = if i == 0 { note_ticks } else { 0 };
            track.push(TrackEvent {
                delta: u28::new(delta),
                kind: TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff { key, vel: u7::new(0) },
                },
            });
        }
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(settings.ticks_per_beat)),
    ));
    smf.tracks.push(track);

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

/// Write `symbols` to a MIDI file at `path`
pub fn write_melody(symbols: &[Symbol], path: &Path, settings: &ScoreSettings) -> Result<()> {
    let bytes = melody_to_smf(symbols, settings)?;
    write_atomic(path, &bytes)?;
    info!("Wrote {} symbols to {}", symbols.len(), path.display());
    Ok(())
}
