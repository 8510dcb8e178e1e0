//! Standard MIDI File input
//!
//! Reads an SMF with `midly` and flattens it into per-track lists of
//! [`TimedEvent`]s. Only note_on/note_off carry musical meaning downstream;
//! every other message is kept as [`EventKind::Other`] so its delta still
//! advances time.

use std::path::Path;

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::error::{CantorError, Result};

/// Tempo assumed until the first tempo meta event (120 BPM)
pub const DEFAULT_MICROS_PER_BEAT: u32 = 500_000;

/// Kind of a timed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NoteOn,
    NoteOff,
    /// Any non-note message (meta, sysex, controller, ...)
    Other,
}

/// One message of a track, with its delta time from the previous message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub kind: EventKind,
    pub channel: u8,
    pub pitch: i32,
    pub velocity: u8,
    pub delta_ticks: u32,
}

impl TimedEvent {
    pub fn note_on(channel: u8, pitch: i32, delta_ticks: u32) -> Self {
        Self {
            kind: EventKind::NoteOn,
            channel,
            pitch,
            velocity: 64,
            delta_ticks,
        }
    }

    pub fn note_off(channel: u8, pitch: i32, delta_ticks: u32) -> Self {
        Self {
            kind: EventKind::NoteOff,
            channel,
            pitch,
            velocity: 0,
            delta_ticks,
        }
    }

    pub fn other(delta_ticks: u32) -> Self {
        Self {
            kind: EventKind::Other,
            channel: 0,
            pitch: 0,
            velocity: 0,
            delta_ticks,
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }
}

/// A parsed event file: resolution, declared length and tracks
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Ticks per beat (0 is representable and refused by the renderer)
    pub ticks_per_beat: u16,
    /// Total duration declared by the file, in milliseconds
    pub length_ms: f64,
    pub tracks: Vec<Vec<TimedEvent>>,
}

impl Score {
    pub fn new(ticks_per_beat: u16, length_ms: f64, tracks: Vec<Vec<TimedEvent>>) -> Self {
        Self {
            ticks_per_beat,
            length_ms,
            tracks,
        }
    }

    /// Read and parse a MIDI file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CantorError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Parse an in-memory MIDI file
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let smf = Smf::parse(bytes)
            .map_err(|e| CantorError::invalid_midi("failed to parse MIDI data", e))?;
        Self::from_smf(&smf)
    }

    /// Flatten a parsed SMF
    ///
    /// SMPTE timecode files are rejected; only metrical timing has a
    /// ticks-per-beat resolution.
    pub fn from_smf(smf: &Smf) -> Result<Self> {
        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(fps, subframe) => {
                return Err(CantorError::UnsupportedFormat {
                    format: format!(
                        "SMPTE timecode division ({:?}, {} ticks/frame)",
                        fps, subframe
                    ),
                });
            }
        };

        let length_ms = declared_length_ms(smf, ticks_per_beat);

        let tracks = smf
            .tracks
            .iter()
            .map(|track| {
                track
                    .iter()
                    .map(|event| convert_event(event.delta.as_int(), &event.kind))
                    .collect()
            })
            .collect();

        Ok(Self {
            ticks_per_beat,
            length_ms,
            tracks,
        })
    }

    /// Total number of note_on events across all tracks
    pub fn note_on_count(&self) -> usize {
        self.tracks
            .iter()
            .flatten()
            .filter(|e| e.kind == EventKind::NoteOn)
            .count()
    }
}

fn convert_event(delta_ticks: u32, kind: &TrackEventKind) -> TimedEvent {
    match kind {
        TrackEventKind::Midi { channel, message } => match message {
            MidiMessage::NoteOn { key, vel } => TimedEvent {
                kind: EventKind::NoteOn,
                channel: channel.as_int(),
                pitch: key.as_int() as i32,
                velocity: vel.as_int(),
                delta_ticks,
            },
            MidiMessage::NoteOff { key, vel } => TimedEvent {
                kind: EventKind::NoteOff,
                channel: channel.as_int(),
                pitch: key.as_int() as i32,
                velocity: vel.as_int(),
                delta_ticks,
            },
            _ => TimedEvent {
                channel: channel.as_int(),
                ..TimedEvent::other(delta_ticks)
            },
        },
        _ => TimedEvent::other(delta_ticks),
    }
}

/// Wall-clock length of the file using its own tempo map
///
/// Parallel and single-track files merge all tracks by absolute tick, so the
/// length is the time of the latest event in any track. Sequential files play
/// their tracks one after another, each starting at the default tempo.
fn declared_length_ms(smf: &Smf, ticks_per_beat: u16) -> f64 {
    if ticks_per_beat == 0 {
        return 0.0;
    }

    match smf.header.format {
        Format::Sequential => smf
            .tracks
            .iter()
            .map(|track| merged_length_ms(std::slice::from_ref(track), ticks_per_beat))
            .sum(),
        Format::SingleTrack | Format::Parallel => merged_length_ms(&smf.tracks, ticks_per_beat),
    }
}

fn merged_length_ms(tracks: &[Vec<midly::TrackEvent>], ticks_per_beat: u16) -> f64 {
    // (absolute tick, track index, event index, tempo change)
    let mut merged: Vec<(u64, usize, usize, Option<u32>)> = Vec::new();
    for (track_index, track) in tracks.iter().enumerate() {
        let mut tick = 0_u64;
        for (event_index, event) in track.iter().enumerate() {
            tick += event.delta.as_int() as u64;
            let tempo = match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
                _ => None,
            };
            merged.push((tick, track_index, event_index, tempo));
        }
    }
    merged.sort_by_key(|&(tick, track, index, _)| (tick, track, index));

    let mut micros_per_beat = DEFAULT_MICROS_PER_BEAT as f64;
    let mut elapsed_ms = 0.0;
    let mut last_tick = 0_u64;
    for (tick, _, _, tempo) in merged {
        elapsed_ms += (tick - last_tick) as f64 * micros_per_beat / ticks_per_beat as f64 / 1000.0;
        last_tick = tick;
        if let Some(t) = tempo {
            micros_per_beat = t as f64;
        }
    }
    elapsed_ms
}
