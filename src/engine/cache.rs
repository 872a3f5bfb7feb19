//! Evaluations kept across sessions.
//!
//! Callers hand the controller a fresh copy of their steps on every start, so
//! results attached during a session would be lost when it ends. The cache
//! keeps the deepest result per analysed position and mode, keyed by the
//! caller's path and the board state, until the controller is destroyed.

use std::collections::HashMap;

use crate::types::{EvalMode, Evaluation, Step};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    path: String,
    fen: String,
}

impl CacheKey {
    fn new(path: &str, fen: &str) -> Self {
        CacheKey {
            path: path.to_string(),
            fen: fen.to_string(),
        }
    }
}

/// Deepest known evaluation per `(path, board state)` and mode.
#[derive(Debug, Default)]
pub struct EvalCache {
    entries: HashMap<CacheKey, Step>,
}

impl EvalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached evaluation of `fen` reached at `path`.
    #[must_use]
    pub fn get(&self, path: &str, fen: &str, mode: EvalMode) -> Option<&Evaluation> {
        self.entries
            .get(&CacheKey::new(path, fen))
            .and_then(|step| step.cached(mode))
    }

    /// Store `eval` for the position of `step`, following [`Step::attach`].
    ///
    /// Returns whether the evaluation replaced the cached one.
    pub fn attach(&mut self, path: &str, step: &Step, mode: EvalMode, eval: Evaluation) -> bool {
        self.entries
            .entry(CacheKey::new(path, &step.fen))
            .or_insert_with(|| Step::root(step.fen.as_str(), step.ply))
            .attach(mode, eval)
    }

    /// Copy cached evaluations into `step` where they are deeper.
    ///
    /// Returns whether any slot of `step` changed.
    pub fn fill(&self, path: &str, step: &mut Step) -> bool {
        let Some(entry) = self.entries.get(&CacheKey::new(path, &step.fen)) else {
            return false;
        };
        let mut changed = false;
        for mode in [EvalMode::Normal, EvalMode::Threat] {
            let deeper = match (entry.cached(mode), step.cached(mode)) {
                (Some(kept), Some(own)) => kept.depth > own.depth,
                (Some(_), None) => true,
                _ => false,
            };
            if deeper {
                if let Some(kept) = entry.cached(mode) {
                    changed |= step.attach(mode, kept.clone());
                }
            }
        }
        changed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
