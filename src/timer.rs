//! Deadline timers for trailing UI deliveries.

use std::thread;
use std::time::{Duration, Instant};

use log::warn;

use crate::sync::CancelFlag;

/// Calculate the duration from now until a deadline, if the deadline is in the future.
///
/// Returns `None` if the deadline has already passed.
#[inline]
fn duration_until(deadline: Instant) -> Option<Duration> {
    let now = Instant::now();
    if deadline > now {
        Some(deadline - now)
    } else {
        None
    }
}

/// Run `task` on a background thread once `deadline` is reached.
///
/// The task is skipped if `cancel` has been raised by then. A deadline in the
/// past runs the task as soon as the thread starts.
pub fn run_at<F>(deadline: Instant, cancel: CancelFlag, task: F)
where
    F: FnOnce() + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("ceval-throttle".to_string())
        .spawn(move || {
            if let Some(wait) = duration_until(deadline) {
                thread::sleep(wait);
            }
            if !cancel.is_cancelled() {
                task();
            }
        });
    if let Err(e) = spawned {
        warn!("failed to spawn throttle timer: {e}");
    }
}
