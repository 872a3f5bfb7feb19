//! Work descriptors submitted to the worker pool.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::WorkError;
use crate::fen::with_side_to_move;
use crate::types::{Color, EvalMode, Evaluation, Step};

/// Callback through which the pool reports progressive results.
pub type EmitFn = Arc<dyn Fn(Evaluation) + Send + Sync>;

/// Requested search depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DepthLimit {
    /// Stop once this depth is reached
    Limited(u32),
    /// Run until explicitly stopped
    Unbounded,
}

impl DepthLimit {
    /// Depth sent to engines for an unbounded request
    pub const UNBOUNDED_DEPTH: u32 = 99;

    /// Numeric depth as understood by engines.
    #[must_use]
    pub const fn as_depth(self) -> u32 {
        match self {
            DepthLimit::Limited(depth) => depth,
            DepthLimit::Unbounded => Self::UNBOUNDED_DEPTH,
        }
    }

    /// Whether a result at `depth` already satisfies this limit.
    #[must_use]
    pub const fn is_reached_by(self, depth: u32) -> bool {
        depth >= self.as_depth()
    }

    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(self, DepthLimit::Unbounded)
    }
}

/// One analysis request.
///
/// The pool takes ownership on submission; results are matched back to the
/// session by path and generation, never through this value.
#[derive(Clone)]
pub struct Work {
    /// Position the move list is replayed from
    pub initial_fen: String,
    /// Moves in UCI notation leading from `initial_fen` to `current_fen`
    pub moves: Vec<String>,
    /// Position to analyse
    pub current_fen: String,
    /// Opaque caller path identifier
    pub path: String,
    pub ply: u32,
    pub max_depth: DepthLimit,
    pub multi_pv: u32,
    pub threat_mode: bool,
    emit: EmitFn,
}

impl Work {
    /// Build a descriptor for the last step of `steps`.
    ///
    /// Threat mode analyses the last position with the side to move flipped and
    /// no move replay. Normal mode replays moves from the root, restarting from
    /// the position after the most recent castling move.
    pub fn build(
        path: &str,
        steps: &[Step],
        threat_mode: bool,
        max_depth: DepthLimit,
        multi_pv: u32,
        emit: EmitFn,
    ) -> Result<Work, WorkError> {
        let (root, last) = match (steps.first(), steps.last()) {
            (Some(root), Some(last)) => (root, last),
            _ => return Err(WorkError::NoSteps),
        };

        let mut work = Work {
            initial_fen: root.fen.clone(),
            moves: Vec::new(),
            current_fen: last.fen.clone(),
            path: path.to_string(),
            ply: last.ply,
            max_depth,
            multi_pv,
            threat_mode,
            emit,
        };

        if threat_mode {
            let side = Color::to_move_at(last.ply).opponent();
            let flipped = with_side_to_move(&last.fen, side)?;
            work.initial_fen.clone_from(&flipped);
            work.current_fen = flipped;
        } else {
            for step in &steps[1..] {
                if step.is_castling() {
                    work.moves.clear();
                    work.initial_fen.clone_from(&step.fen);
                } else {
                    let uci = step
                        .uci
                        .as_ref()
                        .ok_or(WorkError::MissingMove { ply: step.ply })?;
                    work.moves.push(uci.clone());
                }
            }
        }

        Ok(work)
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> EvalMode {
        EvalMode::from_threat(self.threat_mode)
    }

    /// Report a result for this work.
    pub fn emit(&self, eval: Evaluation) {
        (self.emit)(eval);
    }
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Work")
            .field("initial_fen", &self.initial_fen)
            .field("moves", &self.moves)
            .field("current_fen", &self.current_fen)
            .field("path", &self.path)
            .field("ply", &self.ply)
            .field("max_depth", &self.max_depth)
            .field("multi_pv", &self.multi_pv)
            .field("threat_mode", &self.threat_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> EmitFn {
        Arc::new(|_: Evaluation| {})
    }

    fn game() -> Vec<Step> {
        vec![
            Step::root("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", 0),
            Step::new("r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1", 1, "O-O", "e1g1"),
            Step::new("r3k2r/p7/8/8/8/8/8/R4RK1 w kq - 0 2", 2, "a6", "a7a6"),
            Step::new("2kr3r/p7/8/8/8/8/8/R4RK1 w - - 1 2", 3, "O-O-O", "e8c8"),
            Step::new("2kr3r/p7/8/8/8/8/7P/R4RK1 b - - 0 3", 4, "h3", "h2h3"),
            Step::new("2kr3r/8/p7/8/8/8/7P/R4RK1 w - - 0 3", 5, "a5", "a6a5"),
        ]
    }

    #[test]
    fn test_depth_limit() {
        assert_eq!(DepthLimit::Unbounded.as_depth(), 99);
        assert!(DepthLimit::Limited(18).is_reached_by(18));
        assert!(!DepthLimit::Limited(18).is_reached_by(17));
        assert!(!DepthLimit::Unbounded.is_reached_by(60));
    }

    #[test]
    fn test_replay_from_root_without_castling() {
        let steps = &game()[..1];
        let work = Work::build("", steps, false, DepthLimit::Limited(18), 1, noop()).unwrap();
        assert_eq!(work.initial_fen, steps[0].fen);
        assert_eq!(work.current_fen, steps[0].fen);
        assert!(work.moves.is_empty());
        assert_eq!(work.ply, 0);
    }

    #[test]
    fn test_castling_rebases_replay() {
        let steps = game();
        let work = Work::build("aAbB", &steps, false, DepthLimit::Limited(20), 3, noop()).unwrap();
        assert_eq!(work.initial_fen, steps[3].fen);
        assert_eq!(work.moves, ["h2h3", "a6a5"]);
        assert_eq!(work.current_fen, steps[5].fen);
        assert_eq!(work.path, "aAbB");
        assert_eq!(work.multi_pv, 3);
        assert_eq!(work.mode(), EvalMode::Normal);
    }

    #[test]
    fn test_threat_flips_side_without_replay() {
        let steps = game();
        let work = Work::build("p", &steps, true, DepthLimit::Unbounded, 1, noop()).unwrap();
        // Ply 5: Black to move, threat analysis asks what White would do.
        assert_eq!(work.current_fen, "2kr3r/8/p7/8/8/8/7P/R4RK1 w - - 0 3");
        assert_eq!(work.initial_fen, work.current_fen);
        assert!(work.moves.is_empty());
        assert!(work.threat_mode);

        let work = Work::build("p", &steps[..5], true, DepthLimit::Unbounded, 1, noop()).unwrap();
        assert_eq!(work.current_fen, "2kr3r/p7/8/8/8/8/7P/R4RK1 b - - 0 3");
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(
            Work::build("", &[], false, DepthLimit::Unbounded, 1, noop()).unwrap_err(),
            WorkError::NoSteps
        );
        let mut steps = game();
        steps[2].uci = None;
        assert_eq!(
            Work::build("", &steps, false, DepthLimit::Unbounded, 1, noop()).unwrap_err(),
            WorkError::MissingMove { ply: 2 }
        );
        let bad = vec![Step::root("garbage", 0)];
        assert!(matches!(
            Work::build("", &bad, true, DepthLimit::Unbounded, 1, noop()),
            Err(WorkError::Fen(_))
        ));
    }

    #[test]
    fn test_emit_reaches_callback() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let seen = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&seen);
        let emit: EmitFn = Arc::new(move |eval: Evaluation| sink.store(eval.depth, Ordering::SeqCst));
        let work = Work::build("", &game()[..1], false, DepthLimit::Limited(18), 1, emit).unwrap();
        work.emit(Evaluation {
            depth: 7,
            ..Evaluation::default()
        });
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }
}
