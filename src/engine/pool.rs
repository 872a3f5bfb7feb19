//! Interface to the pool of analysis workers.
//!
//! The pool owns process lifecycles and the engine wire protocol; the
//! controller only submits work, cancels it, and relays crashes.

use std::fmt;
use std::sync::Arc;

use crate::capability::Backend;

use super::work::Work;

/// Depth the pool reports from before emitting results
pub const MIN_DEPTH: u32 = 6;

/// Opaque crash report raised by the pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Crash {
    /// Free-form description from the pool
    pub message: String,
}

/// Receives crash reports.
pub type CrashHandler = Arc<dyn Fn(&Crash) + Send + Sync>;

/// Configuration handed to the pool once, at construction.
#[derive(Clone)]
pub struct PoolConfig {
    pub backend: Backend,
    pub min_depth: u32,
    pub variant: String,
    /// Thread hint, only set on the native backend
    pub threads: Option<u32>,
    /// Memory hint in MB, only set on the native backend
    pub hash_size: Option<u32>,
    /// Where the pool reports crashes
    pub on_crash: CrashHandler,
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("backend", &self.backend)
            .field("min_depth", &self.min_depth)
            .field("variant", &self.variant)
            .field("threads", &self.threads)
            .field("hash_size", &self.hash_size)
            .finish_non_exhaustive()
    }
}

/// A pool of analysis workers.
///
/// Results are delivered through [`Work::emit`], in non-decreasing depth
/// order per descriptor.
pub trait WorkerPool: Send + Sync {
    /// Begin analysing `work`, atomically replacing any in-flight work.
    fn start(&self, work: Work);

    /// Request cancellation. Not acknowledged.
    fn stop(&self);

    /// Release all resources. The pool is unusable afterwards.
    fn destroy(&self);
}

impl<P: WorkerPool + ?Sized> WorkerPool for Arc<P> {
    fn start(&self, work: Work) {
        (**self).start(work);
    }

    fn stop(&self) {
        (**self).stop();
    }

    fn destroy(&self) {
        (**self).destroy();
    }
}
