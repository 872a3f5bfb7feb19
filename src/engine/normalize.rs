//! Perspective correction and ordering of candidate lines.

use crate::scoring::WinningChances;
use crate::types::{Color, EvalMode, Evaluation};

/// Side whose winning chances order the lines of a result at `ply`.
///
/// Threat analysis runs on the flipped position, so the parity test is
/// inverted for it.
#[inline]
#[must_use]
pub fn ordering_pov(ply: u32, mode: EvalMode) -> Color {
    let expected = if mode.is_threat() { 1 } else { 0 };
    if ply % 2 == expected {
        Color::White
    } else {
        Color::Black
    }
}

/// Normalize a raw pool result in place.
///
/// Threat-mode lines are negated back to the original perspective, then all
/// lines are stable-sorted by descending winning chances for the ordering side.
pub fn normalize(eval: &mut Evaluation, ply: u32, mode: EvalMode, scorer: &dyn WinningChances) {
    if mode.is_threat() {
        for pv in &mut eval.pvs {
            pv.negate();
        }
    }
    let pov = ordering_pov(ply, mode);
    let mut keyed: Vec<(f64, _)> = eval
        .pvs
        .drain(..)
        .map(|pv| (scorer.pov_chances(pov, &pv), pv))
        .collect();
    // Vec::sort_by is stable, so equal chances keep engine order.
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    eval.pvs = keyed.into_iter().map(|(_, pv)| pv).collect();
}
