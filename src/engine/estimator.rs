//! Adaptive depth estimation from observed worker throughput.
//!
//! Keeps a rolling window of throughput samples taken from representative
//! positions and maps their median onto a target search depth. The target only
//! feeds the next request; in-flight work keeps the depth it was started with.

use std::collections::VecDeque;

use crate::fen::count_non_pawn_king;
use crate::types::Evaluation;

/// Rolling window capacity
pub const WINDOW_CAPACITY: usize = 20;

/// Samples needed before a depth is derived
pub const MIN_SAMPLES: usize = 5;

/// Samples from shallower searches are not representative
const MIN_SAMPLE_DEPTH: u32 = 16;

/// Samples from lopsided positions are not representative
const MAX_SAMPLE_CP: i32 = 500;

/// Minimum count of knights, bishops, rooks and queens on the board
const MIN_PIECES: usize = 10;

/// Depth used below the first throughput boundary
pub const BASE_DEPTH: u32 = 18;

/// Ascending throughput boundaries (knps). Exceeding the n-th one targets `BASE_DEPTH + n + 1`.
const DEPTH_TIERS: [f64; 9] = [
    100.0, 150.0, 250.0, 500.0, 1000.0, 2000.0, 3500.0, 5000.0, 7000.0,
];

/// Deepest target the tiers can produce
pub const MAX_TARGET_DEPTH: u32 = BASE_DEPTH + DEPTH_TIERS.len() as u32;

/// Map a throughput value onto a target depth.
#[must_use]
pub fn depth_for_knps(knps: f64) -> u32 {
    let exceeded = DEPTH_TIERS.iter().take_while(|&&tier| knps > tier).count();
    BASE_DEPTH + exceeded as u32
}

/// Median of a non-empty sample set (mean of the middle pair for even sizes).
fn median(samples: &VecDeque<f64>) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = samples.iter().copied().collect();
    sorted.sort_by(f64::total_cmp);
    let half = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[half])
    } else {
        Some((sorted[half - 1] + sorted[half]) / 2.0)
    }
}

/// Rolling-window throughput to depth controller.
#[derive(Clone, Debug, Default)]
pub struct DepthEstimator {
    samples: VecDeque<f64>,
}

impl DepthEstimator {
    #[must_use]
    pub fn new() -> Self {
        DepthEstimator {
            samples: VecDeque::with_capacity(WINDOW_CAPACITY + 1),
        }
    }

    /// Whether an evaluation is representative enough to sample.
    #[must_use]
    pub fn is_eligible(eval: &Evaluation) -> bool {
        Self::sample(eval).is_some()
    }

    /// Throughput of an eligible evaluation.
    fn sample(eval: &Evaluation) -> Option<f64> {
        let knps = eval.knps?;
        let eligible = knps.is_finite()
            && knps > 0.0
            && eval.depth >= MIN_SAMPLE_DEPTH
            && eval.mate().is_none()
            && eval.cp().is_some_and(|cp| cp.abs() < MAX_SAMPLE_CP)
            && count_non_pawn_king(&eval.fen) >= MIN_PIECES;
        eligible.then_some(knps)
    }

    /// Feed one evaluation.
    ///
    /// Ineligible evaluations are ignored. Returns the new target depth once
    /// the window holds enough samples.
    pub fn record(&mut self, eval: &Evaluation) -> Option<u32> {
        let knps = Self::sample(eval)?;
        self.samples.push_back(knps);
        while self.samples.len() > WINDOW_CAPACITY {
            self.samples.pop_front();
        }
        self.target_depth()
    }

    /// Current target depth, if enough samples have been collected.
    #[must_use]
    pub fn target_depth(&self) -> Option<u32> {
        if self.samples.len() < MIN_SAMPLES {
            return None;
        }
        median(&self.samples).map(depth_for_knps)
    }

    /// Number of buffered samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
