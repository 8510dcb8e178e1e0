//! DSP Effects Library
//!
//! Tone synthesis and the effects applied to each tone and to the final mix.
//! All effects implement the `Effect` trait for uniform processing.

mod chain;
mod effect;
mod fade;
mod gain;
mod oscillator;
mod pan;
mod reverb;

pub use crate::engine::AudioBuffer;
pub use chain::EffectChain;
pub use effect::Effect;
pub use fade::{Fade, FadeDirection};
pub use gain::Gain;
pub use oscillator::SineTone;
pub use pan::Pan;
pub use reverb::{Reverb, ReverbParams};
