//! Duplicate-copy reverb
//!
//! A cheap stand-in for a reverb: the whole mix is copied, attenuated, panned
//! and optionally pushed back by a pre-delay, then summed onto the dry signal.
//! There is no feedback network and no impulse response; the copy is a single
//! reflection. The output keeps the input length, so delayed material past the
//! end is discarded.

use crate::dsp::effect::Effect;
use crate::dsp::{Gain, Pan};
use crate::engine::buffer::ms_to_samples;
use crate::engine::AudioBuffer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Reverb parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverbParams {
    /// Level of the copy relative to the dry mix, in dB
    pub gain_db: f32,
    /// Pan position of the copy (-1 = left, +1 = right)
    pub pan: f32,
    /// Offset of the copy behind the dry mix, in milliseconds
    pub pre_delay_ms: f64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            gain_db: -6.0,
            pan: -0.5,
            pre_delay_ms: 0.0,
        }
    }
}

/// Sums an attenuated, panned copy of the buffer onto itself
#[derive(Debug, Clone)]
pub struct Reverb {
    params: ReverbParams,
}

impl Reverb {
    pub fn new(params: ReverbParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ReverbParams {
        &self.params
    }

    /// Build the wet copy of `dry` without mixing it in
    pub fn wet_signal(&self, dry: &AudioBuffer) -> AudioBuffer {
        let mut wet = dry.clone();
        Gain::new(self.params.gain_db).process(&mut wet);
        Pan::new(self.params.pan).process(&mut wet);
        wet
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new(ReverbParams::default())
    }
}

impl Effect for Reverb {
    fn process(&mut self, buffer: &mut AudioBuffer) {
        let wet = self.wet_signal(buffer);
        buffer.to_stereo();
        let offset = ms_to_samples(self.params.pre_delay_ms, buffer.sample_rate);
        buffer.overlay(&wet, offset);
    }

    fn effect_type(&self) -> &'static str {
        "reverb"
    }

    fn get_params(&self) -> Value {
        json!({
            "gain_db": self.params.gain_db,
            "pan": self.params.pan,
            "pre_delay_ms": self.params.pre_delay_ms,
        })
    }

    fn box_clone(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}
