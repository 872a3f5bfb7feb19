//! Execution backend tiers and host environment signals.

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Backends reported usable by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Capabilities {
    /// Portable backend (intermediate tuning)
    pub portable: bool,
    /// Native backend (full tuning)
    pub native: bool,
}

/// The single backend tier the pool runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Backend {
    Baseline,
    Portable,
    Native,
}

impl Capabilities {
    /// Nothing usable beyond the baseline backend.
    pub const NONE: Capabilities = Capabilities {
        portable: false,
        native: false,
    };

    /// Highest available tier.
    #[must_use]
    pub const fn tier(self) -> Backend {
        if self.native {
            Backend::Native
        } else if self.portable {
            Backend::Portable
        } else {
            Backend::Baseline
        }
    }

    /// Whether any tier above baseline is usable.
    #[must_use]
    pub const fn any(self) -> bool {
        self.native || self.portable
    }
}

impl Backend {
    /// Whether thread and memory hints are forwarded to the pool.
    #[must_use]
    pub const fn accepts_tuning(self) -> bool {
        matches!(self, Backend::Native)
    }
}

/// Reports which backend tiers the host supports. Consulted once.
pub trait CapabilityProbe {
    fn probe(&self) -> Capabilities;
}

/// Probe with fixed answers.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticProbe(pub Capabilities);

impl CapabilityProbe for StaticProbe {
    fn probe(&self) -> Capabilities {
        self.0
    }
}

/// Host signals consumed by the controller.
pub trait Host: Send + Sync {
    /// Whether the hosting surface is currently visible
    fn is_visible(&self) -> bool;

    /// Hardware concurrency hint, if known
    fn hardware_concurrency(&self) -> Option<usize>;
}

/// Host with a fixed concurrency hint and switchable visibility.
#[derive(Debug)]
pub struct StaticHost {
    visible: AtomicBool,
    concurrency: Option<usize>,
}

impl StaticHost {
    #[must_use]
    pub fn new(visible: bool, concurrency: Option<usize>) -> Self {
        StaticHost {
            visible: AtomicBool::new(visible),
            concurrency,
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }
}

impl Default for StaticHost {
    fn default() -> Self {
        Self::new(true, std::thread::available_parallelism().ok().map(usize::from))
    }
}

impl Host for StaticHost {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    fn hardware_concurrency(&self) -> Option<usize> {
        self.concurrency
    }
}
