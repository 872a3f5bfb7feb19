//! Session controller implementation.

use std::sync::{Arc, Weak};
use std::time::Instant;

use log::{debug, info, trace, warn};
use parking_lot::Mutex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::capability::{Capabilities, CapabilityProbe, Host};
use crate::error::SettingsError;
use crate::observer::{ControllerEvent, Observers};
use crate::scoring::{LogisticChances, WinningChances};
use crate::settings::{load_enabled, persist_enabled, SettingKey, Settings};
use crate::store::{StorageKeys, Store, CHECKPOINT_KEY};
use crate::sync::CancelFlag;
use crate::throttle::{Offer, Throttle, UI_THROTTLE};
use crate::timer::run_at;
use crate::types::{EvalMode, Evaluation, Hover, Step};

use super::cache::EvalCache;
use super::estimator::DepthEstimator;
use super::normalize::normalize;
use super::pool::{Crash, CrashHandler, PoolConfig, WorkerPool, MIN_DEPTH};
use super::work::{DepthLimit, EmitFn, Work};

/// Depth at which the analysed position is checkpointed
pub const CHECKPOINT_DEPTH: u32 = 12;

/// Receives normalized, throttled results.
pub type EmitHandler = Arc<dyn Fn(&Evaluation, &Work) + Send + Sync>;

/// Construction options for a [`SessionController`].
#[derive(Clone)]
pub struct ControllerOptions {
    /// Namespace for persisted settings
    pub storage_key_prefix: Option<String>,
    /// Candidate-line count used when none is stored
    pub multi_pv_default: Option<u32>,
    /// Whether analysis can run at all on this surface
    pub possible: bool,
    /// Ignore every backend above baseline
    pub failsafe: bool,
    pub variant: String,
    pub emit: EmitHandler,
    pub on_crash: Option<CrashHandler>,
    pub scorer: Arc<dyn WinningChances>,
}

impl ControllerOptions {
    #[must_use]
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn(&Evaluation, &Work) + Send + Sync + 'static,
    {
        ControllerOptions {
            storage_key_prefix: None,
            multi_pv_default: None,
            possible: true,
            failsafe: false,
            variant: "standard".to_string(),
            emit: Arc::new(emit),
            on_crash: None,
            scorer: Arc::new(LogisticChances),
        }
    }

    #[must_use]
    pub fn with_storage_prefix(mut self, prefix: &str) -> Self {
        self.storage_key_prefix = Some(prefix.to_string());
        self
    }

    #[must_use]
    pub fn with_multi_pv_default(mut self, multi_pv: u32) -> Self {
        self.multi_pv_default = Some(multi_pv);
        self
    }

    #[must_use]
    pub fn with_possible(mut self, possible: bool) -> Self {
        self.possible = possible;
        self
    }

    #[must_use]
    pub fn with_failsafe(mut self, failsafe: bool) -> Self {
        self.failsafe = failsafe;
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: &str) -> Self {
        self.variant = variant.to_string();
        self
    }

    #[must_use]
    pub fn with_on_crash<F>(mut self, on_crash: F) -> Self
    where
        F: Fn(&Crash) + Send + Sync + 'static,
    {
        self.on_crash = Some(Arc::new(on_crash));
        self
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn WinningChances>) -> Self {
        self.scorer = scorer;
        self
    }
}

/// An analysis that is running or most recently ran.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub path: String,
    pub steps: Vec<Step>,
    pub threat_mode: bool,
}

impl Session {
    /// Cached evaluation of the analysed step for this session's mode.
    #[must_use]
    pub fn cached_eval(&self) -> Option<&Evaluation> {
        self.steps
            .last()
            .and_then(|step| step.cached(EvalMode::from_threat(self.threat_mode)))
    }
}

/// Snapshot of the analysis environment, for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvReport {
    pub native: bool,
    pub portable: bool,
    pub multi_pv: u32,
    pub threads: u32,
    pub hash_size: u32,
    pub max_depth: u32,
}

struct ActiveSession {
    session: Session,
    generation: u64,
    work: Work,
}

struct State {
    settings: Settings,
    enabled: bool,
    allowed: bool,
    deeper: bool,
    destroyed: bool,
    running: Option<ActiveSession>,
    last: Option<Session>,
    generation: u64,
    cur_eval: Option<Evaluation>,
    cache: EvalCache,
    estimator: DepthEstimator,
    throttle: Throttle<(Evaluation, Work)>,
    hovering: Option<Hover>,
    observers: Observers,
}

impl State {
    fn effective_max_depth(&self) -> DepthLimit {
        if self.deeper || self.settings.infinite {
            DepthLimit::Unbounded
        } else {
            DepthLimit::Limited(self.settings.max_depth)
        }
    }
}

struct Shared<P> {
    state: Mutex<State>,
    pool: P,
    store: Arc<dyn Store>,
    host: Arc<dyn Host>,
    keys: StorageKeys,
    capabilities: Capabilities,
    possible: bool,
    variant: String,
    emit: EmitHandler,
    scorer: Arc<dyn WinningChances>,
    cancel: CancelFlag,
}

/// Orchestrates analysis sessions on top of a worker pool.
///
/// Every method returns without blocking. Results arrive on pool threads and
/// are serialized against controller calls through a single state lock;
/// callbacks to the caller and to the pool run outside of it.
pub struct SessionController<P: WorkerPool + 'static> {
    shared: Arc<Shared<P>>,
}

impl<P: WorkerPool + 'static> Clone for SessionController<P> {
    fn clone(&self) -> Self {
        SessionController {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: WorkerPool + 'static> SessionController<P> {
    /// Create a controller and its pool.
    ///
    /// The capability probe is consulted once. Thread and memory hints reach
    /// the pool only on the native backend.
    pub fn new<F>(
        options: ControllerOptions,
        probe: &dyn CapabilityProbe,
        store: Arc<dyn Store>,
        host: Arc<dyn Host>,
        make_pool: F,
    ) -> Self
    where
        F: FnOnce(PoolConfig) -> P,
    {
        let capabilities = if options.failsafe {
            Capabilities::NONE
        } else {
            probe.probe()
        };
        let keys = StorageKeys::new(options.storage_key_prefix.as_deref());
        let defaults = Settings::defaults(
            host.hardware_concurrency().unwrap_or(1),
            options.multi_pv_default,
        );
        let settings = Settings::load(store.as_ref(), &keys, defaults);
        let allowed = true;
        let enabled = options.possible
            && allowed
            && load_enabled(store.as_ref(), &keys)
            && host.is_visible();

        let backend = capabilities.tier();
        let tuned = backend.accepts_tuning();
        let relay = options.on_crash.clone();
        let on_crash: CrashHandler = Arc::new(move |crash: &Crash| {
            warn!("analysis worker crashed: {}", crash.message);
            if let Some(handler) = &relay {
                handler(crash);
            }
        });
        let pool = make_pool(PoolConfig {
            backend,
            min_depth: MIN_DEPTH,
            variant: options.variant.clone(),
            threads: tuned.then_some(settings.threads),
            hash_size: tuned.then_some(settings.hash_size),
            on_crash,
        });
        debug!(
            "session controller ready: backend {backend:?}, enabled {enabled}, max depth {}",
            settings.max_depth
        );

        SessionController {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    settings,
                    enabled,
                    allowed,
                    deeper: false,
                    destroyed: false,
                    running: None,
                    last: None,
                    generation: 0,
                    cur_eval: None,
                    cache: EvalCache::new(),
                    estimator: DepthEstimator::new(),
                    throttle: Throttle::new(UI_THROTTLE),
                    hovering: None,
                    observers: Observers::default(),
                }),
                pool,
                store,
                host,
                keys,
                capabilities,
                possible: options.possible,
                variant: options.variant,
                emit: options.emit,
                scorer: options.scorer,
                cancel: CancelFlag::new(),
            }),
        }
    }

    /// Start analysing the last of `steps`.
    pub fn start(&self, path: &str, steps: &[Step], threat_mode: bool) {
        self.begin(path, steps, threat_mode, false);
    }

    /// Start analysing the last of `steps` without a depth limit.
    pub fn start_deeper(&self, path: &str, steps: &[Step], threat_mode: bool) {
        self.begin(path, steps, threat_mode, true);
    }

    fn begin(&self, path: &str, steps: &[Step], threat_mode: bool, deeper: bool) {
        let shared = &self.shared;
        let mut events = Vec::new();
        let work = {
            let mut state = shared.state.lock();
            if !state.enabled || !shared.possible || state.destroyed {
                return;
            }
            if state.deeper != deeper {
                state.deeper = deeper;
                events.push(ControllerEvent::Deeper(deeper));
            }
            let max_depth = state.effective_max_depth();
            let mode = EvalMode::from_threat(threat_mode);

            let existing = steps.last().and_then(|step| {
                let own = step.cached(mode).map(|eval| eval.depth);
                let kept = state
                    .cache
                    .get(path, &step.fen, mode)
                    .map(|eval| eval.depth);
                own.max(kept)
            });
            match existing {
                Some(depth) if max_depth.is_reached_by(depth) => {
                    debug!("skip {path:?} ({mode:?}): cached depth {depth} meets {max_depth:?}");
                    None
                }
                _ => {
                    state.generation += 1;
                    let generation = state.generation;
                    let emit = self.emitter(generation);
                    match Work::build(
                        path,
                        steps,
                        threat_mode,
                        max_depth,
                        state.settings.multi_pv,
                        emit,
                    ) {
                        Ok(work) => {
                            debug!(
                                "start {path:?} ply {} ({mode:?}) to {max_depth:?}, {} replayed moves",
                                work.ply,
                                work.moves.len()
                            );
                            let mut steps = steps.to_vec();
                            if let Some(last) = steps.last_mut() {
                                state.cache.fill(path, last);
                            }
                            state.running = Some(ActiveSession {
                                session: Session {
                                    path: path.to_string(),
                                    steps,
                                    threat_mode,
                                },
                                generation,
                                work: work.clone(),
                            });
                            Some(work)
                        }
                        Err(e) => {
                            warn!("cannot analyse {path:?}: {e}");
                            None
                        }
                    }
                }
            }
        };
        self.notify(&events);
        if let Some(work) = work {
            shared.pool.start(work);
        }
    }

    fn emitter(&self, generation: u64) -> EmitFn {
        let weak = Arc::downgrade(&self.shared);
        Arc::new(move |eval: Evaluation| {
            if let Some(shared) = weak.upgrade() {
                on_result(&shared, generation, eval);
            }
        })
    }

    /// Cancel the running session, remembering it for [`Self::go_deeper`].
    ///
    /// Bookkeeping is updated immediately; the pool is not waited on.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.enabled {
                return;
            }
            let Some(active) = state.running.take() else {
                return;
            };
            debug!("stop {:?}", active.session.path);
            state.last = Some(active.session);
        }
        self.shared.pool.stop();
    }

    /// Restart the running (or last) session without a depth limit.
    pub fn go_deeper(&self) {
        let session = {
            let state = self.shared.state.lock();
            state
                .running
                .as_ref()
                .map(|active| active.session.clone())
                .or_else(|| state.last.clone())
        };
        if let Some(session) = session {
            debug!("go deeper on {:?}", session.path);
            self.stop();
            self.start_deeper(&session.path, &session.steps, session.threat_mode);
        }
    }

    /// Switch analysis on or off.
    ///
    /// The new flag is persisted only while the host is visible.
    pub fn toggle(&self) {
        if !self.shared.possible {
            return;
        }
        let (enabled, stopped) = {
            let mut state = self.shared.state.lock();
            if !state.allowed {
                return;
            }
            let mut stopped = false;
            if state.enabled {
                if let Some(active) = state.running.take() {
                    debug!("stop {:?}", active.session.path);
                    state.last = Some(active.session);
                    stopped = true;
                }
            }
            state.enabled = !state.enabled;
            (state.enabled, stopped)
        };
        if stopped {
            self.shared.pool.stop();
        }
        debug!("analysis {}", if enabled { "enabled" } else { "disabled" });
        if self.shared.host.is_visible() {
            persist_enabled(enabled, self.shared.store.as_ref(), &self.shared.keys);
        }
        self.notify(&[ControllerEvent::Enabled(enabled)]);
    }

    /// Tear down the pool and drop any pending UI delivery.
    pub fn destroy(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.running = None;
            state.throttle.cancel();
            state.cache.clear();
        }
        self.shared.cancel.cancel();
        self.shared.pool.destroy();
        debug!("session controller destroyed");
    }

    /// Depth requested by the next `start`.
    #[must_use]
    pub fn effective_max_depth(&self) -> DepthLimit {
        self.shared.state.lock().effective_max_depth()
    }

    /// Register a change observer.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        self.shared.state.lock().observers.push(Arc::new(observer));
    }

    fn notify(&self, events: &[ControllerEvent]) {
        if events.is_empty() {
            return;
        }
        let observers = self.shared.state.lock().observers.snapshot();
        Observers::notify_all(&observers, events);
    }

    /// Update a setting by name and persist it.
    pub fn set_option(&self, name: &str, value: Option<&str>) -> Result<(), SettingsError> {
        let max_threads = self
            .shared
            .host
            .hardware_concurrency()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(1);
        let key = {
            let mut state = self.shared.state.lock();
            let key = state.settings.apply_option(name, value, max_threads)?;
            state
                .settings
                .persist(key, self.shared.store.as_ref(), &self.shared.keys);
            key
        };
        debug!("setting {key:?} updated");
        self.notify(&[ControllerEvent::Settings(key)]);
        Ok(())
    }

    pub fn set_multi_pv(&self, multi_pv: u32) -> Result<(), SettingsError> {
        self.set_option("multipv", Some(&multi_pv.to_string()))
    }

    pub fn set_infinite(&self, infinite: bool) {
        {
            let mut state = self.shared.state.lock();
            state.settings.infinite = infinite;
            state.settings.persist(
                SettingKey::Infinite,
                self.shared.store.as_ref(),
                &self.shared.keys,
            );
        }
        self.notify(&[ControllerEvent::Settings(SettingKey::Infinite)]);
    }

    pub fn set_allowed(&self, allowed: bool) {
        self.shared.state.lock().allowed = allowed;
    }

    /// Set or clear the hovered move.
    pub fn set_hovering(&self, fen: &str, uci: Option<&str>) {
        let hover = uci.map(|uci| Hover {
            fen: fen.to_string(),
            uci: uci.to_string(),
        });
        self.shared.state.lock().hovering.clone_from(&hover);
        self.notify(&[ControllerEvent::Hovering(hover)]);
    }

    #[must_use]
    pub fn hovering(&self) -> Option<Hover> {
        self.shared.state.lock().hovering.clone()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().enabled
    }

    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.shared.state.lock().allowed
    }

    #[must_use]
    pub fn is_possible(&self) -> bool {
        self.shared.possible
    }

    #[must_use]
    pub fn is_deeper(&self) -> bool {
        self.shared.state.lock().deeper
    }

    /// Whether a session is running.
    #[must_use]
    pub fn is_computing(&self) -> bool {
        self.shared.state.lock().running.is_some()
    }

    #[must_use]
    pub fn can_go_deeper(&self) -> bool {
        let state = self.shared.state.lock();
        self.shared.capabilities.any() && !state.deeper && !state.settings.infinite
    }

    /// Depth of the latest accepted result, 0 if none.
    #[must_use]
    pub fn cur_depth(&self) -> u32 {
        self.shared
            .state
            .lock()
            .cur_eval
            .as_ref()
            .map_or(0, |eval| eval.depth)
    }

    /// Deepest evaluation kept for `fen` reached at `path`.
    #[must_use]
    pub fn cached_eval(&self, path: &str, fen: &str, threat_mode: bool) -> Option<Evaluation> {
        self.shared
            .state
            .lock()
            .cache
            .get(path, fen, EvalMode::from_threat(threat_mode))
            .cloned()
    }

    /// Attach kept evaluations to the caller's `step` where they are deeper.
    ///
    /// Returns whether `step` changed.
    pub fn fill_step(&self, path: &str, step: &mut Step) -> bool {
        self.shared.state.lock().cache.fill(path, step)
    }

    #[must_use]
    pub fn cur_eval(&self) -> Option<Evaluation> {
        self.shared.state.lock().cur_eval.clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.shared
            .state
            .lock()
            .running
            .as_ref()
            .map(|active| active.session.clone())
    }

    #[must_use]
    pub fn last_session(&self) -> Option<Session> {
        self.shared.state.lock().last.clone()
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.shared.state.lock().settings
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.shared.capabilities
    }

    #[must_use]
    pub fn variant(&self) -> &str {
        &self.shared.variant
    }

    #[must_use]
    pub fn pool(&self) -> &P {
        &self.shared.pool
    }

    #[must_use]
    pub fn env(&self) -> EnvReport {
        let state = self.shared.state.lock();
        EnvReport {
            native: self.shared.capabilities.native,
            portable: self.shared.capabilities.portable,
            multi_pv: state.settings.multi_pv,
            threads: state.settings.threads,
            hash_size: state.settings.hash_size,
            max_depth: state.effective_max_depth().as_depth(),
        }
    }
}

/// Result pipeline: normalize, cache, estimate, checkpoint, throttle.
fn on_result<P: WorkerPool + 'static>(shared: &Arc<Shared<P>>, generation: u64, mut eval: Evaluation) {
    let mut events = Vec::new();
    let deliver = {
        let mut state = shared.state.lock();
        if state.destroyed || !state.enabled {
            return;
        }
        let state = &mut *state;
        let Some(active) = state
            .running
            .as_mut()
            .filter(|active| active.generation == generation)
        else {
            trace!("discarding result of superseded session {generation}");
            return;
        };

        let mode = active.work.mode();
        normalize(&mut eval, active.work.ply, mode, shared.scorer.as_ref());
        trace!(
            "{:?} depth {} ({mode:?}), {} lines",
            active.work.path,
            eval.depth,
            eval.pvs.len()
        );
        if let Some(step) = active.session.steps.last_mut() {
            step.attach(mode, eval.clone());
            state
                .cache
                .attach(&active.session.path, step, mode, eval.clone());
        }
        let work = active.work.clone();

        if let Some(depth) = state.estimator.record(&eval) {
            if depth != state.settings.max_depth {
                info!("throughput target depth {} -> {depth}", state.settings.max_depth);
                state.settings.max_depth = depth;
                state
                    .settings
                    .persist(SettingKey::MaxDepth, shared.store.as_ref(), &shared.keys);
                events.push(ControllerEvent::MaxDepth(depth));
            }
        }

        if eval.depth == CHECKPOINT_DEPTH {
            shared.store.set(CHECKPOINT_KEY, &eval.fen);
        }
        state.cur_eval = Some(eval.clone());

        match state.throttle.offer((eval, work), Instant::now()) {
            Offer::Deliver(payload) => Some(payload),
            Offer::Schedule(due) => {
                let weak = Arc::downgrade(shared);
                run_at(due, shared.cancel.clone(), move || fire_trailing(&weak));
                None
            }
            Offer::Coalesced => None,
        }
    };

    if !events.is_empty() {
        let observers = shared.state.lock().observers.snapshot();
        Observers::notify_all(&observers, &events);
    }
    if let Some((eval, work)) = deliver {
        (shared.emit)(&eval, &work);
    }
}

fn fire_trailing<P: WorkerPool + 'static>(weak: &Weak<Shared<P>>) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    let payload = shared.state.lock().throttle.fire(Instant::now());
    if let Some((eval, work)) = payload {
        (shared.emit)(&eval, &work);
    }
}
