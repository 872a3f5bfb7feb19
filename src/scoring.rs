//! Winning-chance scoring used to order candidate lines.

use crate::types::{Color, PvLine};

/// Centipawn magnitude beyond which scores are clamped
const CP_CLAMP: i32 = 1000;

/// Logistic slope applied to centipawns
const CP_SLOPE: f64 = -0.004;

/// Mate distances are mapped onto centipawns as `(MATE_BASE - min(MATE_CAP, |mate|)) * 100`
const MATE_BASE: i32 = 21;
const MATE_CAP: i32 = 10;

/// Maps a candidate line to a winning-chance value from one side's point of view.
///
/// Only relative order matters; implementations must be monotonic in the
/// line's advantage for `pov`.
pub trait WinningChances: Send + Sync {
    fn pov_chances(&self, pov: Color, line: &PvLine) -> f64;
}

impl<F> WinningChances for F
where
    F: Fn(Color, &PvLine) -> f64 + Send + Sync,
{
    fn pov_chances(&self, pov: Color, line: &PvLine) -> f64 {
        self(pov, line)
    }
}

/// Standard logistic winning chances in `[-1, 1]`.
///
/// Scores are read from White's point of view.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogisticChances;

impl LogisticChances {
    /// Logistic curve over an unclamped centipawn value.
    #[must_use]
    pub fn raw_chances(cp: i32) -> f64 {
        2.0 / (1.0 + (CP_SLOPE * f64::from(cp)).exp()) - 1.0
    }

    /// Winning chances for White of an engine centipawn score.
    #[must_use]
    pub fn cp_chances(cp: i32) -> f64 {
        Self::raw_chances(cp.clamp(-CP_CLAMP, CP_CLAMP))
    }

    /// Centipawn equivalent of a mate distance. Not subject to the cp clamp.
    #[must_use]
    pub fn mate_to_cp(mate: i32) -> i32 {
        let cp = (MATE_BASE - mate.abs().min(MATE_CAP)) * 100;
        cp * mate.signum()
    }

    fn white_chances(line: &PvLine) -> f64 {
        match (line.mate, line.cp) {
            (Some(mate), _) => Self::raw_chances(Self::mate_to_cp(mate)),
            (None, Some(cp)) => Self::cp_chances(cp),
            (None, None) => 0.0,
        }
    }
}

impl WinningChances for LogisticChances {
    fn pov_chances(&self, pov: Color, line: &PvLine) -> f64 {
        f64::from(pov.sign()) * Self::white_chances(line)
    }
}
