//! Client-side analysis session orchestration.
//!
//! Sits between a caller that wants positions evaluated and a pool of analysis
//! workers: decides when to run analysis and how deep, normalizes and orders
//! candidate lines, rate-limits UI updates and checkpoints progress.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//!
//! use ceval_session::capability::{Capabilities, StaticHost, StaticProbe};
//! use ceval_session::engine::{ControllerOptions, SessionController, Work, WorkerPool};
//! use ceval_session::store::MemoryStore;
//! use ceval_session::Step;
//!
//! struct IdlePool;
//!
//! impl WorkerPool for IdlePool {
//!     fn start(&self, _work: Work) {}
//!     fn stop(&self) {}
//!     fn destroy(&self) {}
//! }
//!
//! let store = Arc::new(MemoryStore::new());
//! let options = ControllerOptions::new(|eval, _work| println!("depth {}", eval.depth));
//! let ctrl = SessionController::new(
//!     options,
//!     &StaticProbe(Capabilities::NONE),
//!     store,
//!     Arc::new(StaticHost::new(true, Some(4))),
//!     |_config| IdlePool,
//! );
//! ctrl.toggle();
//! let root = Step::root("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 0);
//! ctrl.start("", &[root], false);
//! assert!(ctrl.is_computing());
//! ```

pub mod capability;
pub mod engine;
pub mod error;
pub mod fen;
pub mod observer;
pub mod scoring;
pub mod settings;
pub mod store;
pub mod sync;
pub mod throttle;
pub mod timer;
pub mod types;

pub use engine::{ControllerOptions, SessionController, WorkerPool};
pub use error::{FenError, SettingsError, WorkError};
pub use types::{Color, EvalMode, Evaluation, Hover, PvLine, Step};
