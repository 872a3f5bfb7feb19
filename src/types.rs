//! Core data types shared between the controller, the worker pool and callers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Chess colors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Returns the opposite color
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Scoring sign (+1 for White, -1 for Black)
    #[inline]
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Side to move at the given ply (White moves on even plies)
    #[inline]
    #[must_use]
    pub const fn to_move_at(ply: u32) -> Color {
        if ply % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// FEN side-to-move letter
    #[inline]
    #[must_use]
    pub const fn fen_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

/// Which analysis a result belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EvalMode {
    /// Regular analysis of the position as reached
    #[default]
    Normal,
    /// Analysis with the side to move flipped
    Threat,
}

impl EvalMode {
    #[inline]
    #[must_use]
    pub const fn from_threat(threat_mode: bool) -> Self {
        if threat_mode {
            EvalMode::Threat
        } else {
            EvalMode::Normal
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_threat(self) -> bool {
        matches!(self, EvalMode::Threat)
    }
}

/// One candidate line of an evaluation.
///
/// `cp` and `mate` are mutually exclusive in engine output; a line carrying a
/// mate distance has no centipawn score.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PvLine {
    /// Moves of the line in UCI notation
    pub moves: Vec<String>,
    /// Centipawn score
    pub cp: Option<i32>,
    /// Signed distance to a forced mate
    pub mate: Option<i32>,
}

impl PvLine {
    #[must_use]
    pub fn cp(cp: i32, moves: &[&str]) -> Self {
        PvLine {
            moves: moves.iter().map(|m| (*m).to_string()).collect(),
            cp: Some(cp),
            mate: None,
        }
    }

    #[must_use]
    pub fn mate(mate: i32, moves: &[&str]) -> Self {
        PvLine {
            moves: moves.iter().map(|m| (*m).to_string()).collect(),
            cp: None,
            mate: Some(mate),
        }
    }

    /// Flip the line to the opposite point of view.
    pub fn negate(&mut self) {
        self.cp = self.cp.map(|cp| -cp);
        self.mate = self.mate.map(|mate| -mate);
    }
}

/// A progressive result emitted by the worker pool.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Evaluation {
    /// Board state the result applies to
    pub fen: String,
    /// Depth reached
    pub depth: u32,
    /// Throughput sample in thousands of nodes per second
    pub knps: Option<f64>,
    /// Candidate lines, best first once normalized
    pub pvs: Vec<PvLine>,
}

impl Evaluation {
    /// The leading candidate line, if any.
    #[inline]
    #[must_use]
    pub fn best(&self) -> Option<&PvLine> {
        self.pvs.first()
    }

    /// Centipawn score of the leading line.
    #[must_use]
    pub fn cp(&self) -> Option<i32> {
        self.best().and_then(|pv| pv.cp)
    }

    /// Mate distance of the leading line.
    #[must_use]
    pub fn mate(&self) -> Option<i32> {
        self.best().and_then(|pv| pv.mate)
    }
}

/// One ply of the analysed move sequence.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Step {
    /// Board state after this ply
    pub fen: String,
    /// Ply number (0 for the initial position)
    pub ply: u32,
    /// Move that led here in SAN, absent for the root
    pub san: Option<String>,
    /// Move that led here in UCI notation, absent for the root
    pub uci: Option<String>,
    /// Cached normal-mode evaluation
    pub ceval: Option<Evaluation>,
    /// Cached threat-mode evaluation
    pub threat: Option<Evaluation>,
}

impl Step {
    /// Create the root step of a sequence.
    #[must_use]
    pub fn root(fen: impl Into<String>, ply: u32) -> Self {
        Step {
            fen: fen.into(),
            ply,
            ..Step::default()
        }
    }

    /// Create a step reached by playing a move.
    #[must_use]
    pub fn new(fen: impl Into<String>, ply: u32, san: &str, uci: &str) -> Self {
        Step {
            fen: fen.into(),
            ply,
            san: Some(san.to_string()),
            uci: Some(uci.to_string()),
            ..Step::default()
        }
    }

    /// Whether the move into this step castled.
    #[must_use]
    pub fn is_castling(&self) -> bool {
        self.san.as_deref().is_some_and(|san| san.starts_with("O-O"))
    }

    /// Cached evaluation for the given mode.
    #[inline]
    #[must_use]
    pub fn cached(&self, mode: EvalMode) -> Option<&Evaluation> {
        match mode {
            EvalMode::Normal => self.ceval.as_ref(),
            EvalMode::Threat => self.threat.as_ref(),
        }
    }

    /// Attach an evaluation to the cache slot of `mode`.
    ///
    /// The slot is only replaced when the new depth is not lower than the
    /// cached one. Returns whether the evaluation was stored.
    pub fn attach(&mut self, mode: EvalMode, eval: Evaluation) -> bool {
        let slot = match mode {
            EvalMode::Normal => &mut self.ceval,
            EvalMode::Threat => &mut self.threat,
        };
        match slot {
            Some(existing) if existing.depth > eval.depth => false,
            _ => {
                *slot = Some(eval);
                true
            }
        }
    }
}

/// Move currently hovered in the UI, used to draw an arrow.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hover {
    pub fen: String,
    pub uci: String,
}
