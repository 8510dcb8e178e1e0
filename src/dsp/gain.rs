//! Gain Effect
//!
//! Flat volume change with a dB-based interface.

use crate::dsp::effect::Effect;
use crate::engine::buffer::db_to_linear;
use crate::engine::AudioBuffer;
use serde_json::{json, Value};

// ============================================================================
// Constants
// ============================================================================

/// Minimum gain in dB (-96 dB = effectively silent)
const MIN_GAIN_DB: f32 = -96.0;

/// Maximum gain in dB (+24 dB)
const MAX_GAIN_DB: f32 = 24.0;

// ============================================================================
// Gain Effect
// ============================================================================

/// Flat gain applied to every channel
///
/// # Example
/// ```
/// use cantor::dsp::{Effect, Gain};
/// use cantor::engine::{AudioBuffer, ChannelLayout};
///
/// let mut buffer = AudioBuffer::new(4, ChannelLayout::Mono, 44_100);
/// buffer.channel_mut(0).fill(1.0);
/// Gain::new(-20.0).process(&mut buffer);
/// assert!((buffer.channel(0)[0] - 0.1).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct Gain {
    gain_db: f32,
    gain_linear: f32,
}

impl Gain {
    /// Create a new gain effect, clamped to -96..=+24 dB
    pub fn new(gain_db: f32) -> Self {
        let clamped = gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB);
        Self {
            gain_db: clamped,
            gain_linear: db_to_linear(clamped),
        }
    }

    /// Get the current gain in decibels
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Get the current linear gain multiplier
    pub fn gain_linear(&self) -> f32 {
        self.gain_linear
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Effect for Gain {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        // Unity gain optimization
        if (self.gain_linear - 1.0).abs() < f32::EPSILON {
            return;
        }

        for channel in buffer.samples.iter_mut() {
            for sample in channel.iter_mut() {
                *sample *= self.gain_linear;
            }
        }
    }

    fn effect_type(&self) -> &'static str {
        "gain"
    }

    fn get_params(&self) -> Value {
        json!({
            "gain_db": self.gain_db,
            "gain_linear": self.gain_linear,
        })
    }

    fn box_clone(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelLayout;
    use approx::assert_relative_eq;

    #[test]
    fn test_gain_minus_six_db() {
        let mut buffer = AudioBuffer::new(16, ChannelLayout::Stereo, 44_100);
        buffer.channel_mut(0).fill(1.0);
        buffer.channel_mut(1).fill(-0.5);

        Gain::new(-6.0).process(&mut buffer);

        assert_relative_eq!(buffer.channel(0)[3], 0.501187, epsilon = 1e-5);
        assert_relative_eq!(buffer.channel(1)[3], -0.250594, epsilon = 1e-5);
    }

    #[test]
    fn test_gain_is_clamped() {
        assert_eq!(Gain::new(-200.0).gain_db(), -96.0);
        assert_eq!(Gain::new(40.0).gain_db(), 24.0);
    }

    #[test]
    fn test_unity_gain_leaves_buffer() {
        let mut buffer = AudioBuffer::new(4, ChannelLayout::Mono, 44_100);
        buffer.channel_mut(0).copy_from_slice(&[0.1, 0.2, 0.3, 0.4]);
        let before = buffer.clone();

        Gain::default().process(&mut buffer);
        assert_eq!(buffer, before);
    }
}
