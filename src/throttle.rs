//! Leading/trailing rate limiting of UI deliveries.
//!
//! The throttle is a plain state machine driven by explicit timestamps: it
//! decides whether a payload goes out now, waits for a trailing timeout, or
//! replaces a payload that is already waiting. Scheduling the timeout is the
//! caller's job (see [`crate::timer::run_at`]).

use std::time::{Duration, Instant};

/// Minimum spacing between two UI deliveries
pub const UI_THROTTLE: Duration = Duration::from_millis(150);

/// Outcome of offering a payload to the throttle.
#[derive(Debug, PartialEq)]
pub enum Offer<T> {
    /// Deliver this payload immediately (leading edge)
    Deliver(T),
    /// The payload is pending; arm the single trailing timeout at this instant
    Schedule(Instant),
    /// The payload replaced an already pending one; the timeout is armed
    Coalesced,
}

/// Explicit timer state: last delivery time plus one pending trailing payload.
#[derive(Debug)]
pub struct Throttle<T> {
    window: Duration,
    last_delivery: Option<Instant>,
    pending: Option<T>,
    armed: bool,
}

impl<T> Throttle<T> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Throttle {
            window,
            last_delivery: None,
            pending: None,
            armed: false,
        }
    }

    /// Offer a payload at `now`.
    pub fn offer(&mut self, payload: T, now: Instant) -> Offer<T> {
        let idle = match self.last_delivery {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window,
        };
        if idle && !self.armed {
            self.last_delivery = Some(now);
            return Offer::Deliver(payload);
        }

        self.pending = Some(payload);
        if self.armed {
            return Offer::Coalesced;
        }
        self.armed = true;
        // last_delivery is always set here: a first call is idle by definition.
        let due = self.last_delivery.map_or(now, |last| last + self.window);
        Offer::Schedule(due)
    }

    /// Trailing timeout fired at `now`: hand out the pending payload, if any.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        self.armed = false;
        let payload = self.pending.take()?;
        self.last_delivery = Some(now);
        Some(payload)
    }

    /// Drop any pending payload and disarm.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.armed = false;
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}
