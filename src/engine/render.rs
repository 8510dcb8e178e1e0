//! Event-to-audio rendering
//!
//! [`EventRenderer`] turns the note_on/note_off events of a [`Score`] into one
//! mixed buffer and exports it.
//!
//! Each track is scanned on its own, starting at position 0. Every message
//! advances the position by its delta. A note_on opens a slot for its
//! `(channel, pitch)` key and the matching note_off closes it, producing one
//! sine tone that is added onto the master buffer at the slot's start.
//!
//! Two compatibility behaviours are kept on purpose:
//! - a second note_on on an already open key replaces the first; the first
//!   note never sounds
//! - notes still open when their track ends are dropped without a tone
//!
//! A note_off without an open slot is ignored with a warning.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::RenderConfig;
use crate::dsp::{EffectChain, Fade, Gain, Reverb, ReverbParams, SineTone};
use crate::engine::buffer::{
    calculate_peak, calculate_rms, ms_to_samples, AudioBuffer, ChannelLayout,
};
use crate::engine::io::{export_audio, ExportFormat};
use crate::engine::score::{EventKind, Score, TimedEvent};
use crate::engine::timebase::TimeBase;
use crate::error::Result;

/// A note waiting for its note_off
#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenNote {
    start_ms: f64,
    event: TimedEvent,
}

/// A note that was synthesized and mixed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacedNote {
    pub track: usize,
    pub channel: u8,
    pub pitch: i32,
    pub frequency: f64,
    pub start_ms: f64,
    pub duration_ms: f64,
}

/// Counters collected while rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderStats {
    pub tracks: usize,
    pub notes_rendered: usize,
    /// note_on events replaced by a later note_on on the same key
    pub overwritten_note_ons: usize,
    /// note_off events with no open note
    pub unmatched_note_offs: usize,
    /// notes still open at the end of their track
    pub dropped_open_notes: usize,
    pub duration_ms: f64,
    pub channels: usize,
    pub peak_db: f32,
    pub rms_db: f32,
}

/// The rendered mix, before export
#[derive(Debug, Clone)]
pub struct RenderedMix {
    pub buffer: AudioBuffer,
    pub notes: Vec<PlacedNote>,
    pub stats: RenderStats,
}

/// Result of [`EventRenderer::render`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The output file was written
    Rendered(RenderStats),
    /// The source could not be rendered; nothing was written
    Aborted { reason: String },
}

/// Renders MIDI scores to audio files
#[derive(Debug, Clone)]
pub struct EventRenderer {
    config: RenderConfig,
    timebase: TimeBase,
    tone_chain: EffectChain,
    master_chain: EffectChain,
}

impl EventRenderer {
    /// Create a renderer; fails if the configuration is invalid
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RenderConfig) -> Self {
        let timebase = TimeBase::new(config.reference_pitch_frequency, config.tempo);
        let tone_chain = EffectChain::new()
            .with(Box::new(Fade::fade_out(config.fade_ms)))
            .with(Box::new(Fade::fade_in(config.fade_ms)))
            .with(Box::new(Gain::new(config.post_gain_db)));
        let master_chain = EffectChain::new().with(Box::new(Reverb::new(ReverbParams {
            gain_db: config.reverb_gain_db,
            pan: config.reverb_pan,
            pre_delay_ms: config.reverb_delay_ms,
        })));
        debug!("Tone chain: {}", tone_chain.to_json());
        debug!("Master chain: {}", master_chain.to_json());

        Self {
            config,
            timebase,
            tone_chain,
            master_chain,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn timebase(&self) -> &TimeBase {
        &self.timebase
    }

    /// Render `source_path` and export the mix to `output_path`
    ///
    /// The output format follows the extension of `output_path`. A source
    /// with zero ticks per beat is reported as [`RenderOutcome::Aborted`] and
    /// no file is written.
    pub fn render(&self, source_path: &Path, output_path: &Path) -> Result<RenderOutcome> {
        let format = ExportFormat::from_path(output_path, &self.config)?;
        info!(
            "Rendering {} -> {}",
            source_path.display(),
            output_path.display()
        );

        let score = Score::load(source_path)?;
        let Some(mix) = self.render_score(&score) else {
            return Ok(RenderOutcome::Aborted {
                reason: "ticks_per_beat is zero".to_string(),
            });
        };

        export_audio(&mix.buffer, output_path, format)?;
        info!(
            "Wrote {} ({} notes, {:.0} ms)",
            output_path.display(),
            mix.stats.notes_rendered,
            mix.stats.duration_ms
        );
        Ok(RenderOutcome::Rendered(mix.stats))
    }

    /// Render a parsed score into a stereo buffer
    ///
    /// Returns `None` when the score's resolution is zero.
    pub fn render_score(&self, score: &Score) -> Option<RenderedMix> {
        if score.ticks_per_beat == 0 {
            error!("ticks_per_beat is zero; nothing rendered");
            return None;
        }

        let mut master = AudioBuffer::silent(
            score.length_ms.floor(),
            ChannelLayout::Mono,
            self.config.sample_rate,
        );
        let mut notes = Vec::new();
        let mut stats = RenderStats {
            tracks: score.tracks.len(),
            ..RenderStats::default()
        };

        for (index, track) in score.tracks.iter().enumerate() {
            self.render_track(
                index,
                track,
                score.ticks_per_beat,
                &mut master,
                &mut notes,
                &mut stats,
            );
        }

        let mut master_chain = self.master_chain.clone();
        master_chain.process(&mut master);

        stats.notes_rendered = notes.len();
        stats.duration_ms = master.duration_ms();
        stats.channels = master.channels();
        stats.peak_db = calculate_peak(&master);
        stats.rms_db = calculate_rms(&master);
        debug!("Render stats: {:?}", stats);

        Some(RenderedMix {
            buffer: master,
            notes,
            stats,
        })
    }

    /// Synthesize one shaped tone for `pitch` lasting `duration_ms`
    pub fn render_tone(&self, pitch: i32, duration_ms: f64) -> AudioBuffer {
        let frequency = self.timebase.pitch_to_frequency(pitch);
        let mut tone = SineTone::new(frequency, self.config.note_gain_db)
            .render(duration_ms, self.config.sample_rate);
        let mut chain = self.tone_chain.clone();
        chain.process(&mut tone);
        tone
    }

    fn render_track(
        &self,
        track_index: usize,
        events: &[TimedEvent],
        ticks_per_beat: u16,
        master: &mut AudioBuffer,
        notes: &mut Vec<PlacedNote>,
        stats: &mut RenderStats,
    ) {
        let mut position_ms = 0.0_f64;
        let mut open: HashMap<(u8, i32), OpenNote> = HashMap::new();

        for event in events {
            position_ms += self.timebase.ticks_to_ms(event.delta_ticks, ticks_per_beat);

            match self.effective_kind(event) {
                EventKind::NoteOn => {
                    let key = (event.channel, event.pitch);
                    let note = OpenNote {
                        start_ms: position_ms,
                        event: *event,
                    };
                    if let Some(replaced) = open.insert(key, note) {
                        debug!(
                            "Track {}: note_on ch{} pitch {} at {:.1} ms replaces note opened at {:.1} ms",
                            track_index, event.channel, event.pitch, position_ms, replaced.start_ms
                        );
                        stats.overwritten_note_ons += 1;
                    }
                }
                EventKind::NoteOff => {
                    let Some(note) = open.remove(&(event.channel, event.pitch)) else {
                        warn!(
                            "Track {}: note_off ch{} pitch {} at {:.1} ms has no open note; ignored",
                            track_index, event.channel, event.pitch, position_ms
                        );
                        stats.unmatched_note_offs += 1;
                        continue;
                    };

                    let duration_ms = position_ms - note.start_ms;
                    let tone = self.render_tone(note.event.pitch, duration_ms);
                    master.overlay(&tone, ms_to_samples(note.start_ms, master.sample_rate));

                    notes.push(PlacedNote {
                        track: track_index,
                        channel: note.event.channel,
                        pitch: note.event.pitch,
                        frequency: self.timebase.pitch_to_frequency(note.event.pitch),
                        start_ms: note.start_ms,
                        duration_ms,
                    });
                }
                EventKind::Other => {}
            }
        }

        if !open.is_empty() {
            debug!(
                "Track {}: dropping {} unclosed note(s)",
                track_index,
                open.len()
            );
            stats.dropped_open_notes += open.len();
        }
    }

    fn effective_kind(&self, event: &TimedEvent) -> EventKind {
        if self.config.velocity_zero_is_note_off
            && event.kind == EventKind::NoteOn
            && event.velocity == 0
        {
            EventKind::NoteOff
        } else {
            event.kind
        }
    }
}

impl Default for EventRenderer {
    fn default() -> Self {
        Self::build(RenderConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::db_to_linear;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn renderer_120() -> EventRenderer {
        EventRenderer::new(RenderConfig::new(440.0, 120.0)).unwrap()
    }

    fn dry_renderer_120() -> EventRenderer {
        EventRenderer::new(RenderConfig {
            reverb_gain_db: -96.0,
            ..RenderConfig::new(440.0, 120.0)
        })
        .unwrap()
    }

    fn nonzero_range(samples: &[f32]) -> Option<(usize, usize)> {
        let first = samples.iter().position(|&s| s != 0.0)?;
        let last = samples.iter().rposition(|&s| s != 0.0)?;
        Some((first, last))
    }

    #[test]
    fn test_single_note_duration() {
        let score = Score::new(
            480,
            1000.0,
            vec![vec![
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::note_off(0, 69, 480),
            ]],
        );
        let renderer = renderer_120();
        let mix = renderer.render_score(&score).unwrap();

        assert_eq!(mix.notes.len(), 1);
        let note = mix.notes[0];
        assert_relative_eq!(note.start_ms, 0.0);
        assert_relative_eq!(note.duration_ms, renderer.timebase().ticks_to_ms(480, 480));
        assert_relative_eq!(note.duration_ms, 500.0);
        assert_relative_eq!(note.frequency, 440.0);

        // 500 ms at 44.1 kHz, fades end on silent samples
        let (first, last) = nonzero_range(mix.buffer.channel(0)).unwrap();
        assert!(first < 4, "first audible sample {}", first);
        assert!((22_040..22_050).contains(&last), "last audible sample {}", last);
        assert_eq!(mix.buffer.len(), 44_100);
    }

    #[test]
    fn test_tone_shaping_levels() {
        let renderer = EventRenderer::default();
        let tone = renderer.render_tone(69, 500.0);

        assert_eq!(tone.len(), 22_050);
        assert_eq!(tone.channel(0)[0], 0.0);
        assert_eq!(tone.channel(0)[22_049], 0.0);

        // -6 dB tone, then -10 dB: peak of the unfaded middle is -16 dB
        let middle = &tone.channel(0)[2_000..20_000];
        let peak = middle.iter().fold(0.0_f32, |p, &s| p.max(s.abs()));
        assert_relative_eq!(peak, db_to_linear(-16.0), epsilon = 1e-3);
    }

    #[test]
    fn test_channels_isolate_state() {
        let score = Score::new(
            480,
            1000.0,
            vec![vec![
                TimedEvent::note_on(0, 60, 0),
                TimedEvent::note_on(1, 60, 240),
                TimedEvent::note_off(0, 60, 240),
                TimedEvent::note_off(1, 60, 240),
            ]],
        );
        let mix = renderer_120().render_score(&score).unwrap();

        assert_eq!(mix.notes.len(), 2);
        assert_eq!(mix.notes[0].channel, 0);
        assert_relative_eq!(mix.notes[0].start_ms, 0.0);
        assert_relative_eq!(mix.notes[0].duration_ms, 500.0);
        assert_eq!(mix.notes[1].channel, 1);
        assert_relative_eq!(mix.notes[1].start_ms, 250.0);
        assert_relative_eq!(mix.notes[1].duration_ms, 500.0);
        assert_eq!(mix.stats.overwritten_note_ons, 0);
    }

    #[test]
    fn test_repeated_note_on_keeps_last() {
        let score = Score::new(
            480,
            1000.0,
            vec![vec![
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::note_on(0, 69, 240),
                TimedEvent::note_off(0, 69, 240),
            ]],
        );
        let mix = dry_renderer_120().render_score(&score).unwrap();

        assert_eq!(mix.notes.len(), 1);
        assert_relative_eq!(mix.notes[0].start_ms, 250.0);
        assert_relative_eq!(mix.notes[0].duration_ms, 250.0);
        assert_eq!(mix.stats.overwritten_note_ons, 1);

        // no sound from the first note_on
        let (first, _) = nonzero_range(mix.buffer.channel(0)).unwrap();
        assert!(first >= ms_to_samples(250.0, 44_100));
    }

    #[test]
    fn test_unclosed_notes_are_dropped() {
        let score = Score::new(
            480,
            1000.0,
            vec![vec![
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::note_on(3, 72, 10),
                TimedEvent::other(480),
            ]],
        );
        let mix = renderer_120().render_score(&score).unwrap();

        assert!(mix.notes.is_empty());
        assert_eq!(mix.stats.dropped_open_notes, 2);
        assert!(mix.buffer.samples.iter().flatten().all(|&s| s == 0.0));
        assert_eq!(mix.buffer.len(), 44_100);
    }

    #[test]
    fn test_unmatched_note_off_is_ignored() {
        let score = Score::new(
            480,
            1000.0,
            vec![vec![
                TimedEvent::note_off(0, 64, 0),
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::note_off(0, 69, 480),
            ]],
        );
        let mix = renderer_120().render_score(&score).unwrap();

        assert_eq!(mix.stats.unmatched_note_offs, 1);
        assert_eq!(mix.notes.len(), 1);
        assert_eq!(mix.notes[0].pitch, 69);
    }

    #[test]
    fn test_other_events_advance_time() {
        let score = Score::new(
            480,
            2000.0,
            vec![vec![
                TimedEvent::other(480),
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::other(240),
                TimedEvent::note_off(0, 69, 240),
            ]],
        );
        let mix = renderer_120().render_score(&score).unwrap();

        assert_relative_eq!(mix.notes[0].start_ms, 500.0);
        assert_relative_eq!(mix.notes[0].duration_ms, 500.0);
    }

    #[test]
    fn test_tracks_start_at_zero() {
        let track = vec![
            TimedEvent::note_on(0, 60, 240),
            TimedEvent::note_off(0, 60, 240),
        ];
        let score = Score::new(480, 1000.0, vec![track.clone(), track]);
        let mix = renderer_120().render_score(&score).unwrap();

        assert_eq!(mix.notes.len(), 2);
        assert_eq!(mix.notes[0].track, 0);
        assert_eq!(mix.notes[1].track, 1);
        assert_relative_eq!(mix.notes[0].start_ms, 250.0);
        assert_relative_eq!(mix.notes[1].start_ms, 250.0);
        assert_eq!(mix.stats.tracks, 2);
    }

    #[test]
    fn test_notes_past_end_are_truncated() {
        let score = Score::new(
            480,
            300.0,
            vec![vec![
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::note_off(0, 69, 960),
            ]],
        );
        let mix = renderer_120().render_score(&score).unwrap();

        assert_eq!(mix.buffer.len(), ms_to_samples(300.0, 44_100));
        assert_relative_eq!(mix.notes[0].duration_ms, 1000.0);
    }

    #[test]
    fn test_velocity_zero_note_on() {
        let events = vec![
            TimedEvent::note_on(0, 69, 0),
            TimedEvent::note_on(0, 69, 480).with_velocity(0),
        ];
        let score = Score::new(480, 1000.0, vec![events]);

        let default = renderer_120().render_score(&score).unwrap();
        assert!(default.notes.is_empty());
        assert_eq!(default.stats.overwritten_note_ons, 1);
        assert_eq!(default.stats.dropped_open_notes, 1);

        let renderer = EventRenderer::new(RenderConfig {
            velocity_zero_is_note_off: true,
            ..RenderConfig::new(440.0, 120.0)
        })
        .unwrap();
        let mix = renderer.render_score(&score).unwrap();
        assert_eq!(mix.notes.len(), 1);
        assert_relative_eq!(mix.notes[0].duration_ms, 500.0);
    }

    #[test]
    fn test_zero_resolution_renders_nothing() {
        let score = Score::new(
            0,
            1000.0,
            vec![vec![
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::note_off(0, 69, 480),
            ]],
        );
        assert!(renderer_120().render_score(&score).is_none());
    }

    #[test]
    fn test_reverb_makes_mix_stereo_and_left_heavy() {
        let score = Score::new(
            480,
            1000.0,
            vec![vec![
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::note_off(0, 69, 480),
            ]],
        );
        let mix = renderer_120().render_score(&score).unwrap();

        assert_eq!(mix.stats.channels, 2);
        let left = mix.buffer.channel(0);
        let right = mix.buffer.channel(1);
        let energy = |s: &[f32]| s.iter().map(|x| (x * x) as f64).sum::<f64>();
        assert!(energy(left) > energy(right));
    }

    #[test]
    fn test_stats_report_levels() {
        let score = Score::new(
            480,
            1000.0,
            vec![vec![
                TimedEvent::note_on(0, 69, 0),
                TimedEvent::note_off(0, 69, 480),
            ]],
        );
        let stats = renderer_120().render_score(&score).unwrap().stats;
        assert!(stats.rms_db.is_finite());
        assert!(stats.rms_db < stats.peak_db);
        // half the buffer is silence, so the average sits well under the peak
        assert!(stats.peak_db - stats.rms_db > 3.0);

        let silent = Score::new(480, 1000.0, vec![vec![TimedEvent::other(0)]]);
        let stats = renderer_120().render_score(&silent).unwrap().stats;
        assert_eq!(stats.rms_db, f32::NEG_INFINITY);
        assert_eq!(stats.peak_db, f32::NEG_INFINITY);
    }

    #[test]
    fn test_render_is_deterministic() {
        let score = Score::new(
            96,
            3000.0,
            vec![vec![
                TimedEvent::note_on(0, 60, 0),
                TimedEvent::note_on(0, 64, 48),
                TimedEvent::note_off(0, 60, 48),
                TimedEvent::note_off(0, 64, 96),
            ]],
        );
        let renderer = EventRenderer::default();
        let a = renderer.render_score(&score).unwrap();
        let b = renderer.render_score(&score).unwrap();
        assert_eq!(a.buffer, b.buffer);
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = EventRenderer::new(RenderConfig::new(440.0, -1.0));
        assert!(result.is_err());
    }
}
