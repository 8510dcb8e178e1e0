//! Stereo panning
//!
//! Balance-style pan: the favoured side is boosted by up to 3 dB while the
//! other side is cut, so a hard pan keeps the favoured side at +3 dB and
//! silences the other. Mono input is widened to stereo first.

use crate::dsp::effect::Effect;
use crate::engine::buffer::{db_to_linear, linear_to_db};
use crate::engine::AudioBuffer;
use serde_json::{json, Value};

/// Pan position in -1.0 (left) ..= 1.0 (right)
#[derive(Debug, Clone)]
pub struct Pan {
    position: f32,
}

impl Pan {
    /// Create a pan effect; the position is clamped to -1..=1
    pub fn new(position: f32) -> Self {
        Self {
            position: position.clamp(-1.0, 1.0),
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    /// Left and right gains in dB for the current position
    pub fn channel_gains_db(&self) -> (f32, f32) {
        if self.position == 0.0 {
            return (0.0, 0.0);
        }

        let max_boost_db = linear_to_db(2.0);
        let boost_db = self.position.abs() * max_boost_db;
        let reduce_db = linear_to_db(db_to_linear(max_boost_db) - db_to_linear(boost_db));
        let boost_db = boost_db / 2.0;

        if self.position < 0.0 {
            (boost_db, reduce_db)
        } else {
            (reduce_db, boost_db)
        }
    }
}

impl Effect for Pan {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        buffer.to_stereo();
        let (left_db, right_db) = self.channel_gains_db();

        for (channel, gain_db) in buffer.samples.iter_mut().zip([left_db, right_db]) {
            let gain = db_to_linear(gain_db);
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }

    fn effect_type(&self) -> &'static str {
        "pan"
    }

    fn get_params(&self) -> Value {
        let (left_db, right_db) = self.channel_gains_db();
        json!({
            "position": self.position,
            "left_db": left_db,
            "right_db": right_db,
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
    fn test_half_left_gains() {
        let (left, right) = Pan::new(-0.5).channel_gains_db();
        assert_relative_eq!(left, 1.505, epsilon = 1e-3);
        assert_relative_eq!(right, -4.645, epsilon = 1e-3);
    }

    #[test]
    fn test_pan_is_mirrored() {
        let (l1, r1) = Pan::new(-0.3).channel_gains_db();
        let (l2, r2) = Pan::new(0.3).channel_gains_db();
        assert_relative_eq!(l1, r2);
        assert_relative_eq!(r1, l2);
    }

    #[test]
    fn test_hard_left_silences_right() {
        let (left, right) = Pan::new(-1.0).channel_gains_db();
        assert_relative_eq!(left, 3.0103, epsilon = 1e-3);
        assert!(right < -60.0);
    }

    #[test]
    fn test_pan_widens_mono() {
        let mut buffer = AudioBuffer::new(4, ChannelLayout::Mono, 44_100);
        buffer.channel_mut(0).fill(0.5);

        Pan::new(-0.5).process(&mut buffer);

        assert_eq!(buffer.channels(), 2);
        assert!(buffer.channel(0)[0] > 0.5);
        assert!(buffer.channel(1)[0] < 0.5);
    }

    #[test]
    fn test_center_is_unity() {
        let mut buffer = AudioBuffer::new(4, ChannelLayout::Mono, 44_100);
        buffer.channel_mut(0).fill(0.5);

        Pan::new(0.0).process(&mut buffer);
        assert_eq!(buffer.channel(0), buffer.channel(1));
        assert_eq!(buffer.channel(1), &[0.5; 4]);
    }
}
