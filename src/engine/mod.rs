//! Analysis session orchestration.
//!
//! This module holds the session state machine, the work descriptors it
//! submits to a worker pool, and the result pipeline that normalizes, caches
//! and throttles what comes back.

pub mod cache;
mod controller;
pub mod estimator;
pub mod normalize;
mod pool;
mod work;

pub use cache::EvalCache;
pub use controller::{
    ControllerOptions, EmitHandler, EnvReport, Session, SessionController, CHECKPOINT_DEPTH,
};
pub use estimator::DepthEstimator;
pub use normalize::{normalize, ordering_pov};
pub use pool::{Crash, CrashHandler, PoolConfig, WorkerPool, MIN_DEPTH};
pub use work::{DepthLimit, EmitFn, Work};
