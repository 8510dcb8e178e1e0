//! Fade-in and fade-out
//!
//! Linear amplitude ramps over a fixed window at the start or end of a buffer.
//! A window longer than the buffer is clamped to the buffer length.

use crate::dsp::effect::Effect;
use crate::engine::buffer::ms_to_samples;
use crate::engine::AudioBuffer;
use serde_json::{json, Value};

/// Which end of the buffer a [`Fade`] shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Ramp from silence up to full level at the start
    In,
    /// Ramp from full level down to silence at the end
    Out,
}

/// Linear fade over `duration_ms`
#[derive(Debug, Clone)]
pub struct Fade {
    direction: FadeDirection,
    duration_ms: f64,
}

impl Fade {
    pub fn new(direction: FadeDirection, duration_ms: f64) -> Self {
        Self {
            direction,
            duration_ms: duration_ms.max(0.0),
        }
    }

    pub fn fade_in(duration_ms: f64) -> Self {
        Self::new(FadeDirection::In, duration_ms)
    }

    pub fn fade_out(duration_ms: f64) -> Self {
        Self::new(FadeDirection::Out, duration_ms)
    }

    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}

impl Effect for Fade {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        let len = buffer.len();
        let window = ms_to_samples(self.duration_ms, buffer.sample_rate).min(len);
        if window == 0 {
            return;
        }

        let step = 1.0 / window as f32;
        for channel in buffer.samples.iter_mut() {
            match self.direction {
                FadeDirection::In => {
                    for (i, sample) in channel[..window].iter_mut().enumerate() {
                        *sample *= i as f32 * step;
                    }
                }
                FadeDirection::Out => {
                    // distance from the last sample: 0 at the end
                    for (i, sample) in channel[len - window..].iter_mut().rev().enumerate() {
                        *sample *= i as f32 * step;
                    }
                }
            }
        }
    }

    fn effect_type(&self) -> &'static str {
        match self.direction {
            FadeDirection::In => "fade_in",
            FadeDirection::Out => "fade_out",
        }
    }

    fn get_params(&self) -> Value {
        json!({ "duration_ms": self.duration_ms })
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

    fn ones(len: usize) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(len, ChannelLayout::Mono, 1000);
        buffer.channel_mut(0).fill(1.0);
        buffer
    }

    #[test]
    fn test_fade_in_ramps_from_zero() {
        // 1 kHz sample rate: 4 ms = 4 samples
        let mut buffer = ones(8);
        Fade::fade_in(4.0).process(&mut buffer);
        assert_eq!(
            buffer.channel(0),
            &[0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_fade_out_ends_at_zero() {
        let mut buffer = ones(8);
        Fade::fade_out(4.0).process(&mut buffer);
        assert_eq!(
            buffer.channel(0),
            &[1.0, 1.0, 1.0, 1.0, 0.75, 0.5, 0.25, 0.0]
        );
    }

    #[test]
    fn test_window_clamped_to_length() {
        let mut buffer = ones(2);
        Fade::fade_out(30.0).process(&mut buffer);
        assert_relative_eq!(buffer.channel(0)[0], 0.5);
        assert_eq!(buffer.channel(0)[1], 0.0);
    }

    #[test]
    fn test_zero_length_fade_is_noop() {
        let mut buffer = ones(4);
        Fade::fade_in(0.0).process(&mut buffer);
        assert_eq!(buffer.channel(0), &[1.0; 4]);

        let mut empty = ones(0);
        Fade::fade_out(30.0).process(&mut empty);
        assert!(empty.is_empty());
    }
}
