//! Melody generation loop
//!
//! Seeds a context window with a random run of corpus symbols, then repeatedly
//! asks a [`SymbolPredictor`] for the next symbol and slides the window forward.

use std::collections::VecDeque;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CantorError, Result};
use crate::melody::predictor::SymbolPredictor;
use crate::melody::symbol::Symbol;

/// Generation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Context window length fed to the predictor
    pub sequence_length: usize,
    /// Number of symbols to generate
    pub length: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sequence_length: 100,
            length: 500,
        }
    }
}

#[derive(Debug)]
pub struct MelodyGenerator {
    corpus: Vec<Symbol>,
    config: GeneratorConfig,
}

impl MelodyGenerator {
    /// Create a generator over `corpus`
    ///
    /// The corpus must hold at least one symbol more than the window.
    pub fn new(corpus: Vec<Symbol>, config: GeneratorConfig) -> Result<Self> {
        if config.sequence_length == 0 {
            return Err(CantorError::InvalidConfig {
                reason: "sequence_length must be at least 1".to_string(),
            });
        }
        let required = config.sequence_length + 1;
        if corpus.len() < required {
            return Err(CantorError::EmptyCorpus {
                found: corpus.len(),
                required,
            });
        }

        Ok(Self { corpus, config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Random run of `sequence_length` consecutive corpus symbols
    pub fn seed_window<R: Rng + ?Sized>(&self, rng: &mut R) -> &[Symbol] {
        let window = self.config.sequence_length;
        let start = rng.gen_range(0..self.corpus.len() - window);
        &self.corpus[start..start + window]
    }

    /// Generate `length` symbols starting from a random seed window
    pub fn generate<P, R>(&self, predictor: &mut P, rng: &mut R) -> Result<Vec<Symbol>>
    where
        P: SymbolPredictor + ?Sized,
        R: Rng + ?Sized,
    {
        let seed = self.seed_window(rng).to_vec();
        self.generate_from_seed(predictor, seed)
    }

    /// Generate `length` symbols from an explicit context window
    pub fn generate_from_seed<P>(&self, predictor: &mut P, seed: Vec<Symbol>) -> Result<Vec<Symbol>>
    where
        P: SymbolPredictor + ?Sized,
    {
        info!(
            "Generating {} symbols with {} (window {})",
            self.config.length,
            predictor.name(),
            seed.len()
        );

        let mut window: VecDeque<Symbol> = seed.into();
        let mut output = Vec::with_capacity(self.config.length);

        for step in 0..self.config.length {
            let next = predictor.next_symbol(window.make_contiguous())?;
            debug!("step {}: {}", step, next);

            output.push(next.clone());
            window.push_back(next);
            window.pop_front();
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corpus(n: usize) -> Vec<Symbol> {
        (0..n).map(|i| Symbol::Note(48 + i as i32)).collect()
    }

    fn config(sequence_length: usize, length: usize) -> GeneratorConfig {
        GeneratorConfig {
            sequence_length,
            length,
        }
    }

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.sequence_length, 100);
        assert_eq!(config.length, 500);
    }

    #[test]
    fn test_short_corpus_is_rejected() {
        let err = MelodyGenerator::new(corpus(4), config(4, 10)).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_CORPUS");
        assert!(MelodyGenerator::new(corpus(5), config(4, 10)).is_ok());
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let err = MelodyGenerator::new(corpus(5), config(0, 10)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_seed_window_is_consecutive() {
        let generator = MelodyGenerator::new(corpus(20), config(5, 1)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let seed = generator.seed_window(&mut rng);
            assert_eq!(seed.len(), 5);
            for pair in seed.windows(2) {
                match (&pair[0], &pair[1]) {
                    (Symbol::Note(a), Symbol::Note(b)) => assert_eq!(b - a, 1),
                    _ => panic!("unexpected chord"),
                }
            }
            // the window never reaches the final corpus symbol
            assert_ne!(seed.last(), Some(&Symbol::Note(48 + 19)));
        }
    }

    #[test]
    fn test_window_slides_by_one() {
        let generator = MelodyGenerator::new(corpus(10), config(3, 4)).unwrap();
        let mut seen: Vec<Vec<Symbol>> = Vec::new();
        let mut counter = 0;
        let mut predictor = |context: &[Symbol]| -> Result<Symbol> {
            seen.push(context.to_vec());
            counter += 1;
            Ok(Symbol::Note(100 + counter))
        };

        let seed = vec![Symbol::Note(1), Symbol::Note(2), Symbol::Note(3)];
        let output = generator.generate_from_seed(&mut predictor, seed).unwrap();

        assert_eq!(
            output,
            vec![
                Symbol::Note(101),
                Symbol::Note(102),
                Symbol::Note(103),
                Symbol::Note(104)
            ]
        );
        assert_eq!(seen.len(), 4);
        assert_eq!(
            seen[1],
            vec![Symbol::Note(2), Symbol::Note(3), Symbol::Note(101)]
        );
        assert_eq!(
            seen[3],
            vec![Symbol::Note(101), Symbol::Note(102), Symbol::Note(103)]
        );
    }

    #[test]
    fn test_same_seed_same_melody() {
        let generator = MelodyGenerator::new(corpus(30), config(4, 8)).unwrap();
        let mut predictor = |context: &[Symbol]| -> Result<Symbol> {
            Ok(context[0].clone())
        };

        let a = generator
            .generate(&mut predictor, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = generator
            .generate(&mut predictor, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_predictor_error_stops_generation() {
        let generator = MelodyGenerator::new(corpus(10), config(2, 5)).unwrap();
        let mut failing = |_: &[Symbol]| -> Result<Symbol> {
            Err(CantorError::Prediction {
                reason: "model unavailable".to_string(),
            })
        };

        let err = generator
            .generate(&mut failing, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(err.error_code(), "PREDICTION_ERROR");
    }
}
