//! Tick and pitch conversions
//!
//! Maps MIDI delta ticks to milliseconds at the configured tempo, and MIDI
//! pitch numbers to equal-tempered frequencies around a reference A4.

/// MIDI pitch number of the tuning reference (A4)
pub const REFERENCE_PITCH: i32 = 69;

/// Converts ticks and pitches using a fixed tempo and tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBase {
    reference_pitch_frequency: f64,
    tempo: f64,
}

impl TimeBase {
    /// Create a time base for `tempo` BPM with pitch 69 tuned to `reference_pitch_frequency` Hz
    pub fn new(reference_pitch_frequency: f64, tempo: f64) -> Self {
        Self {
            reference_pitch_frequency,
            tempo,
        }
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn reference_pitch_frequency(&self) -> f64 {
        self.reference_pitch_frequency
    }

    /// Equal-tempered frequency of `pitch` in Hz
    ///
    /// Any integer is accepted; pitches outside 0..=127 simply produce
    /// sub-audible or ultrasonic frequencies.
    pub fn pitch_to_frequency(&self, pitch: i32) -> f64 {
        self.reference_pitch_frequency * 2.0_f64.powf((pitch - REFERENCE_PITCH) as f64 / 12.0)
    }

    /// Elapsed milliseconds for `ticks` at `ticks_per_beat` resolution
    ///
    /// A zero resolution yields 0 for every input, so no time advances. The
    /// renderer refuses such files before calling this.
    pub fn ticks_to_ms(&self, ticks: u32, ticks_per_beat: u16) -> f64 {
        if ticks_per_beat == 0 {
            return 0.0;
        }
        (60_000.0 / self.tempo) / ticks_per_beat as f64 * ticks as f64
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new(440.0, 100.0)
    }
}
