//! Effect Chain management
//!
//! Effects are processed in insertion order (index 0 first). The renderer
//! builds two chains: one shaping every tone (fade-out, fade-in, gain) and
//! one for the finished mix (reverb).

use super::{AudioBuffer, Effect};

/// Ordered chain of effects
#[derive(Clone, Debug, Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectChain {
    /// Create a new empty effect chain
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    /// Append an effect to the end of the chain
    pub fn add(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    /// Builder-style variant of [`EffectChain::add`]
    pub fn with(mut self, effect: Box<dyn Effect>) -> Self {
        self.add(effect);
        self
    }

    /// Process the entire chain
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        for effect in &mut self.effects {
            effect.process(buffer);
        }
    }

    /// Get the number of effects in the chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate over effects
    pub fn iter(&self) -> impl Iterator<Item = &dyn Effect> {
        self.effects.iter().map(|e| e.as_ref())
    }

    /// Serialize chain state to JSON
    pub fn to_json(&self) -> serde_json::Value {
        let effects: Vec<serde_json::Value> = self
            .effects
            .iter()
            .map(|e| {
                serde_json::json!({
                    "type": e.effect_type(),
                    "params": e.get_params(),
                })
            })
            .collect();

        serde_json::json!({ "effects": effects })
    }
}
