//! Effect trait definition
//!
//! Base trait for every processing stage applied to a rendered tone or to the
//! master mix.

use crate::engine::AudioBuffer;
use serde_json::Value;

/// Base trait for all DSP effects
///
/// Effects process audio buffers in-place. They may change the channel
/// count (panning widens mono to stereo) but never the length.
pub trait Effect: Send + Sync {
    /// Process audio buffer in-place
    fn process(&mut self, buffer: &mut AudioBuffer);

    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str;

    /// Get all parameters as JSON (for logging and reports)
    fn get_params(&self) -> Value;

    /// Clone the effect into a boxed trait object
    fn box_clone(&self) -> Box<dyn Effect>;
}

impl Clone for Box<dyn Effect> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

impl std::fmt::Debug for dyn Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.effect_type(), self.get_params())
    }
}
