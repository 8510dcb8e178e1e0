//! Render configuration
//!
//! All tunables of the renderer live here. Defaults reproduce the reference
//! rendering: A4 = 440 Hz at 100 BPM, 30 ms fades, -6 dB tones attenuated a
//! further -10 dB, a -6 dB copy panned half left, exported as 320 kbps MP3.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CantorError, Result};

/// Bitrates accepted by the MP3 encoder, in kbps
pub const SUPPORTED_BITRATES_KBPS: [u32; 16] = [
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Configuration for a render, fixed for the lifetime of a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frequency assigned to MIDI pitch 69 (A4), in Hz
    pub reference_pitch_frequency: f64,
    /// Tempo used to convert ticks to milliseconds, in beats per minute
    pub tempo: f64,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Length of the per-note fade-in and fade-out, in milliseconds
    pub fade_ms: f64,
    /// Base volume of each synthesized tone, in dB
    pub note_gain_db: f32,
    /// Flat attenuation applied to each tone after fading, in dB
    pub post_gain_db: f32,
    /// Level of the duplicated "reverb" copy, in dB
    pub reverb_gain_db: f32,
    /// Pan position of the "reverb" copy (-1 = left, +1 = right)
    pub reverb_pan: f32,
    /// Offset of the "reverb" copy behind the dry mix, in milliseconds
    pub reverb_delay_ms: f64,
    /// MP3 bitrate in kbps
    pub export_bitrate_kbps: u32,
    /// Treat a note_on with velocity 0 as a note_off
    pub velocity_zero_is_note_off: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            reference_pitch_frequency: 440.0,
            tempo: 100.0,
            sample_rate: 44_100,
            fade_ms: 30.0,
            note_gain_db: -6.0,
            post_gain_db: -10.0,
            reverb_gain_db: -6.0,
            reverb_pan: -0.5,
            reverb_delay_ms: 0.0,
            export_bitrate_kbps: 320,
            velocity_zero_is_note_off: false,
        }
    }
}

impl RenderConfig {
    /// Create a configuration with the given tuning and tempo, other fields default
    pub fn new(reference_pitch_frequency: f64, tempo: f64) -> Self {
        Self {
            reference_pitch_frequency,
            tempo,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their default values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CantorError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let config: RenderConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is usable by the renderer
    pub fn validate(&self) -> Result<()> {
        if !(self.tempo.is_finite() && self.tempo > 0.0) {
            return Err(CantorError::InvalidConfig {
                reason: format!("tempo must be a positive number, got {}", self.tempo),
            });
        }
        if !(self.reference_pitch_frequency.is_finite() && self.reference_pitch_frequency > 0.0) {
            return Err(CantorError::InvalidConfig {
                reason: format!(
                    "reference pitch frequency must be positive, got {}",
                    self.reference_pitch_frequency
                ),
            });
        }
        if self.sample_rate == 0 {
            return Err(CantorError::InvalidConfig {
                reason: "sample rate must be nonzero".to_string(),
            });
        }
        for (name, ms) in [
            ("fade_ms", self.fade_ms),
            ("reverb_delay_ms", self.reverb_delay_ms),
        ] {
            if !(ms.is_finite() && ms >= 0.0) {
                return Err(CantorError::InvalidConfig {
                    reason: format!("{} must be a non-negative length, got {}", name, ms),
                });
            }
        }
        for (name, db) in [
            ("note_gain_db", self.note_gain_db),
            ("post_gain_db", self.post_gain_db),
            ("reverb_gain_db", self.reverb_gain_db),
        ] {
            if !db.is_finite() {
                return Err(CantorError::InvalidConfig {
                    reason: format!("{} must be a finite level, got {}", name, db),
                });
            }
        }
        if !(-1.0..=1.0).contains(&self.reverb_pan) {
            return Err(CantorError::InvalidConfig {
                reason: format!("reverb pan must be within -1..=1, got {}", self.reverb_pan),
            });
        }
        if !SUPPORTED_BITRATES_KBPS.contains(&self.export_bitrate_kbps) {
            return Err(CantorError::InvalidConfig {
                reason: format!(
                    "unsupported MP3 bitrate {} kbps (supported: {:?})",
                    self.export_bitrate_kbps, SUPPORTED_BITRATES_KBPS
                ),
            });
        }
        Ok(())
    }
}
