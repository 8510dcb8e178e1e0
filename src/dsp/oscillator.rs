//! Sine tone generation

use crate::engine::buffer::{db_to_linear, ms_to_samples};
use crate::engine::{AudioBuffer, ChannelLayout};
use std::f64::consts::PI;

/// Pure sine tone at a fixed frequency and level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineTone {
    frequency: f64,
    volume_db: f32,
}

impl SineTone {
    pub fn new(frequency: f64, volume_db: f32) -> Self {
        Self {
            frequency,
            volume_db,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Render `duration_ms` of the tone as a mono buffer, starting at phase 0
    pub fn render(&self, duration_ms: f64, sample_rate: u32) -> AudioBuffer {
        let num_samples = ms_to_samples(duration_ms, sample_rate);
        let mut buffer = AudioBuffer::new(num_samples, ChannelLayout::Mono, sample_rate);

        let amplitude = db_to_linear(self.volume_db) as f64;
        let angular_freq = 2.0 * PI * self.frequency / sample_rate as f64;

        for (i, sample) in buffer.channel_mut(0).iter_mut().enumerate() {
            *sample = (amplitude * (angular_freq * i as f64).sin()) as f32;
        }

        buffer
    }
}
