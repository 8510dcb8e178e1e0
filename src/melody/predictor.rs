//! Next-symbol prediction
//!
//! The sequence model is external to this crate; everything that drives it
//! goes through [`SymbolPredictor`]. [`SuccessorPredictor`] is a small
//! frequency-table stand-in that works offline and is fully deterministic.

use std::collections::HashMap;

use crate::error::{CantorError, Result};
use crate::melody::symbol::Symbol;

/// Predicts the symbol that follows a context window
pub trait SymbolPredictor {
    /// Next symbol after `context` (oldest first)
    fn next_symbol(&mut self, context: &[Symbol]) -> Result<Symbol>;

    /// Short name for logs
    fn name(&self) -> &str {
        "predictor"
    }
}

impl<F> SymbolPredictor for F
where
    F: FnMut(&[Symbol]) -> Result<Symbol>,
{
    fn next_symbol(&mut self, context: &[Symbol]) -> Result<Symbol> {
        self(context)
    }
}

/// First-order successor table learned from a symbol stream
///
/// Predicts the most frequent successor of the last context symbol. Ties go to
/// the smallest symbol. Symbols never seen with a successor fall back to the
/// most frequent symbol of the whole stream.
#[derive(Debug, Clone)]
pub struct SuccessorPredictor {
    successors: HashMap<Symbol, Symbol>,
    fallback: Symbol,
}

impl SuccessorPredictor {
    pub fn from_symbols(symbols: &[Symbol]) -> Result<Self> {
        let fallback = most_frequent(symbols.iter()).ok_or(CantorError::EmptyCorpus {
            found: 0,
            required: 1,
        })?;

        let mut transitions: HashMap<&Symbol, Vec<&Symbol>> = HashMap::new();
        for pair in symbols.windows(2) {
            transitions.entry(&pair[0]).or_default().push(&pair[1]);
        }

        let successors = transitions
            .into_iter()
            .filter_map(|(from, next)| {
                most_frequent(next.into_iter()).map(|best| (from.clone(), best))
            })
            .collect();

        Ok(Self {
            successors,
            fallback,
        })
    }

    /// Symbol returned when the context gives no usable hint
    pub fn fallback(&self) -> &Symbol {
        &self.fallback
    }
}

impl SymbolPredictor for SuccessorPredictor {
    fn next_symbol(&mut self, context: &[Symbol]) -> Result<Symbol> {
        let next = context
            .last()
            .and_then(|last| self.successors.get(last))
            .unwrap_or(&self.fallback);
        Ok(next.clone())
    }

    fn name(&self) -> &str {
        "successor-table"
    }
}

fn most_frequent<'a, I>(symbols: I) -> Option<Symbol>
where
    I: Iterator<Item = &'a Symbol>,
{
    let mut counts: HashMap<&Symbol, usize> = HashMap::new();
    for symbol in symbols {
        *counts.entry(symbol).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(symbol, _)| symbol.clone())
}
