//! Shared fixtures for controller integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use ceval_session::capability::{Capabilities, StaticHost, StaticProbe};
use ceval_session::engine::{ControllerOptions, PoolConfig, SessionController, Work, WorkerPool};
use ceval_session::store::{MemoryStore, Store};
use ceval_session::{Evaluation, PvLine, Step};

pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolCall {
    Start { path: String, ply: u32 },
    Stop,
    Destroy,
}

/// Pool that records calls and keeps submitted work for replaying results.
pub struct RecordingPool {
    pub config: PoolConfig,
    pub calls: Mutex<Vec<PoolCall>>,
    pub works: Mutex<Vec<Work>>,
    /// Result emitted synchronously from `start`, if set
    pub echo: Mutex<Option<Evaluation>>,
}

impl RecordingPool {
    pub fn new(config: PoolConfig) -> Self {
        RecordingPool {
            config,
            calls: Mutex::new(Vec::new()),
            works: Mutex::new(Vec::new()),
            echo: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<PoolCall> {
        self.calls.lock().clone()
    }

    pub fn starts(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, PoolCall::Start { .. }))
            .count()
    }

    pub fn last_work(&self) -> Work {
        self.works.lock().last().cloned().expect("no work submitted")
    }
}

impl WorkerPool for RecordingPool {
    fn start(&self, work: Work) {
        self.calls.lock().push(PoolCall::Start {
            path: work.path.clone(),
            ply: work.ply,
        });
        self.works.lock().push(work.clone());
        let echo = self.echo.lock().clone();
        if let Some(eval) = echo {
            work.emit(eval);
        }
    }

    fn stop(&self) {
        self.calls.lock().push(PoolCall::Stop);
    }

    fn destroy(&self) {
        self.calls.lock().push(PoolCall::Destroy);
    }
}

pub type Delivered = Arc<Mutex<Vec<(Evaluation, Work)>>>;

pub struct Harness {
    pub ctrl: SessionController<RecordingPool>,
    pub store: Arc<MemoryStore>,
    pub host: Arc<StaticHost>,
    pub delivered: Delivered,
}

impl Harness {
    pub fn pool(&self) -> &RecordingPool {
        self.ctrl.pool()
    }

    pub fn delivered(&self) -> Vec<(Evaluation, Work)> {
        self.delivered.lock().clone()
    }
}

pub struct HarnessBuilder {
    pub capabilities: Capabilities,
    pub enabled: bool,
    pub visible: bool,
    pub concurrency: Option<usize>,
    pub store: Arc<MemoryStore>,
    pub configure: fn(ControllerOptions) -> ControllerOptions,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        HarnessBuilder {
            capabilities: Capabilities::NONE,
            enabled: true,
            visible: true,
            concurrency: Some(4),
            store: Arc::new(MemoryStore::new()),
            configure: |options| options,
        }
    }
}

impl HarnessBuilder {
    pub fn build(self) -> Harness {
        if self.enabled {
            self.store.set("client-eval-enabled", "1");
        }
        let delivered: Delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        let options = ControllerOptions::new(move |eval: &Evaluation, work: &Work| {
            sink.lock().push((eval.clone(), work.clone()));
        });
        let options = (self.configure)(options);
        let host = Arc::new(StaticHost::new(self.visible, self.concurrency));
        let store: Arc<dyn Store> = self.store.clone();
        let ctrl = SessionController::new(
            options,
            &StaticProbe(self.capabilities),
            store,
            host.clone(),
            RecordingPool::new,
        );
        Harness {
            ctrl,
            store: self.store,
            host,
            delivered,
        }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::default().build()
}

pub fn opening() -> Vec<Step> {
    vec![
        Step::root(START, 0),
        Step::new(AFTER_E4, 1, "e4", "e2e4"),
        Step::new(AFTER_E5, 2, "e5", "e7e5"),
    ]
}

pub fn eval(fen: &str, depth: u32, pvs: Vec<PvLine>) -> Evaluation {
    Evaluation {
        fen: fen.to_string(),
        depth,
        knps: None,
        pvs,
    }
}
