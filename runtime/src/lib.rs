//! # Storefront Runtime
//!
//! Runtime implementation for the storefront UDF architecture.
//!
//! This crate provides the [`Store`](store::Store) that owns a screen's
//! state, runs its reducer, and executes the effects the reducer describes.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, serializes every reduction, publishes state
//! - **Effect Executor**: Runs effect descriptions on background tasks and
//!   feeds resulting actions back into the reducer
//! - **Event Channel**: Delivers one-shot view events at most once
//! - **Cancellation**: Every task is bound to the store's lifetime; keyed
//!   effects are superseded by newer effects with the same id
//!
//! ## Example
//!
//! ```ignore
//! use storefront_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Dispatch an action (never blocks on effects)
//! let mut handle = store.send(Action::DoSomething)?;
//!
//! // Observe state continuously
//! let mut state = store.subscribe();
//!
//! // Observe one-shot events
//! let mut events = store.events();
//!
//! // Wait for the action's background work
//! handle.wait().await;
//! ```

use storefront_core::{effect::Effect, fault::Fault, reducer::Reducer};
use std::sync::Arc;

/// Single-delivery channel for one-shot view events
pub mod events;

/// Retry logic with exponential backoff
pub mod retry;

pub use events::{EventChannel, EventReceiver};
pub use store::Store;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// The effect that produced the action was cancelled
        ///
        /// Actions fed back by a superseded or torn-down effect are dropped
        /// before they reach the reducer.
        #[error("Action dropped: producing effect was cancelled")]
        Superseded,

        /// An effect raised a fault and the store halted
        ///
        /// Carries the origin of the first fault. A halted store rejects
        /// every action and runs no more effects.
        #[error("Store halted by a fault in {0}")]
        Faulted(&'static str),
    }
}

pub use error::StoreError;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Callback invoked for every fault raised by an effect
pub type FaultHandler = Arc<dyn Fn(&Fault) + Send + Sync>;

/// Configuration for Store instances
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_transition_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(2))
///     .with_fault_handler(Arc::new(|fault| crash_reporter.report(fault)));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Clone)]
pub struct StoreConfig {
    /// Number of state transitions buffered for slow transition observers
    pub transition_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
    /// Process-level handler for faults (unclassified failures)
    ///
    /// Called before the store halts. Without a handler the fault is only
    /// logged and broadcast to fault observers.
    pub fault_handler: Option<FaultHandler>,
}

impl StoreConfig {
    /// Set the transition broadcast capacity
    #[must_use]
    pub const fn with_transition_capacity(mut self, capacity: usize) -> Self {
        self.transition_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }

    /// Install a fault handler
    #[must_use]
    pub fn with_fault_handler(mut self, handler: FaultHandler) -> Self {
        self.fault_handler = Some(handler);
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            transition_capacity: 64,
            default_shutdown_timeout: Duration::from_secs(5),
            fault_handler: None,
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("transition_capacity", &self.transition_capacity)
            .field("default_shutdown_timeout", &self.default_shutdown_timeout)
            .field("fault_handler", &self.fault_handler.is_some())
            .finish()
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the background work
/// started by an action. Actions fed back by those effects are tracked by the
/// same handle, so waiting covers the whole cascade.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start)?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // Every effect started by Action::Start has finished
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new handle and the tracking context that feeds it
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all tracked effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            self.notifier.send_replace(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics
/// or its task is cancelled.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicU64, AtomicUsize, DecrementGuard, Duration,
        Effect, EffectHandle, EffectTracking, EventChannel, EventReceiver, Fault, FaultHandler,
        HashMap, Mutex, OnceLock, Ordering, Reducer, StoreConfig, StoreError, lock,
    };
    use futures::StreamExt;
    use futures::future::{BoxFuture, join_all};
    use storefront_core::effect::{EffectId, EffectStream};
    use tokio::sync::{broadcast, watch};
    use tokio_util::sync::CancellationToken;

    /// Keyed streams registered ahead of the task that runs them
    type Claims = HashMap<EffectId, (u64, CancellationToken)>;

    /// The Store - runtime owner of a screen's state machine
    ///
    /// The Store manages:
    /// 1. State (reduced under a lock, so every transition is serialized)
    /// 2. State publication (latest value plus an ordered transition feed)
    /// 3. One-shot events (single delivery)
    /// 4. Effect execution (background tasks bound to the store's lifetime)
    ///
    /// Background tasks never touch state directly: they feed actions back
    /// through the reducer. Dropping the store cancels every task it started.
    ///
    /// A fault raised by an effect is fatal: the store reports it, cancels
    /// every running effect and rejects all further actions with
    /// [`StoreError::Faulted`].
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        inner: Arc<StoreInner<S, A, E, R>>,
    }

    struct StoreInner<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Mutex<S>,
        reducer: R,
        environment: E,
        /// Latest state, redelivered to every new subscriber
        published: watch::Sender<S>,
        /// Every distinct state in publication order
        transitions: broadcast::Sender<S>,
        events: EventChannel<R::Event>,
        faults: broadcast::Sender<Arc<Fault>>,
        fault_handler: Option<FaultHandler>,
        /// Origin of the fault that halted the store
        faulted: OnceLock<&'static str>,
        /// Parent of every effect token; cancelled on teardown
        lifetime: CancellationToken,
        in_flight: Mutex<HashMap<EffectId, (u64, CancellationToken)>>,
        generation: AtomicU64,
        shutdown: AtomicBool,
        pending_effects: Arc<AtomicUsize>,
        config: StoreConfig,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        R::Event: Send + 'static,
        A: Send + 'static,
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The initial state is published immediately.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (published, _) = watch::channel(initial_state.clone());
            let (transitions, _) = broadcast::channel(config.transition_capacity.max(1));
            let (faults, _) = broadcast::channel(16);

            Self {
                inner: Arc::new(StoreInner {
                    state: Mutex::new(initial_state),
                    reducer,
                    environment,
                    published,
                    transitions,
                    events: EventChannel::new(),
                    faults,
                    fault_handler: config.fault_handler.clone(),
                    faulted: OnceLock::new(),
                    lifetime: CancellationToken::new(),
                    in_flight: Mutex::new(HashMap::new()),
                    generation: AtomicU64::new(0),
                    shutdown: AtomicBool::new(false),
                    pending_effects: Arc::new(AtomicUsize::new(0)),
                    config,
                }),
            }
        }

        /// Send an action to the store
        ///
        /// 1. Runs the reducer under the state lock
        /// 2. Publishes the new state if it changed
        /// 3. Starts the returned effects on background tasks
        ///
        /// Returns as soon as the effects are started; it never waits for them.
        /// Must be called from within a Tokio runtime.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting
        /// down, or [`StoreError::Faulted`] once an effect raised a fault.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            let (handle, tracking) = EffectHandle::new();
            self.inner.dispatch(action, None, &tracking)?;
            Ok(handle)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let term = store.state(|s| s.model().searched_term.clone());
        /// ```
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = lock(&self.inner.state);
            f(&state)
        }

        /// Observe the current state continuously
        ///
        /// The receiver always holds the latest published state, including for
        /// observers that subscribe late. Rapid transitions may be coalesced;
        /// use [`transitions`](Self::transitions) to see every one.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<S> {
            self.inner.published.subscribe()
        }

        /// Observe every state transition in order
        ///
        /// Returns the current state together with a receiver for all
        /// subsequent distinct states. Both are captured under the state lock,
        /// so no transition is missed or duplicated.
        #[must_use]
        pub fn transitions(&self) -> (S, broadcast::Receiver<S>) {
            let state = lock(&self.inner.state);
            (state.clone(), self.inner.transitions.subscribe())
        }

        /// Attach an observer for one-shot events
        ///
        /// Each event is delivered to exactly one receiver and never replayed.
        #[must_use]
        pub fn events(&self) -> EventReceiver<R::Event> {
            self.inner.events.subscribe()
        }

        /// Observe faults raised by effects
        #[must_use]
        pub fn subscribe_faults(&self) -> broadcast::Receiver<Arc<Fault>> {
            self.inner.faults.subscribe()
        }

        /// Origin of the fault that halted the store, if any
        #[must_use]
        pub fn faulted(&self) -> Option<&'static str> {
            self.inner.faulted.get().copied()
        }

        /// Cancel the in-flight effect registered under `id`, if any
        pub fn cancel(&self, id: &EffectId) {
            self.inner.cancel_in_flight(id);
        }

        /// Whether an effect is currently registered under `id`
        #[must_use]
        pub fn is_in_flight(&self, id: &EffectId) -> bool {
            lock(&self.inner.in_flight).contains_key(id)
        }

        /// The store's configuration
        #[must_use]
        pub fn config(&self) -> &StoreConfig {
            &self.inner.config
        }

        /// Tear the store down
        ///
        /// 1. Rejects new actions
        /// 2. Cancels every running effect
        /// 3. Waits (up to `timeout`) for the effect tasks to exit
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before
        /// all effect tasks exit.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating store shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.inner.shutdown.store(true, Ordering::Release);
            self.inner.lifetime.cancel();

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.inner.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects stopped, shutdown complete");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }
    }

    impl<S, A, E, R> Drop for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn drop(&mut self) {
            self.inner.shutdown.store(true, Ordering::Release);
            self.inner.lifetime.cancel();
        }
    }

    impl<S, A, E, R> StoreInner<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        R::Event: Send + 'static,
        A: Send + 'static,
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Run one action through the reducer
        ///
        /// `guard` is the token of the effect that produced the action. It is
        /// checked under the state lock, so an action from a superseded effect
        /// can never land after the action that superseded it.
        fn dispatch(
            self: &Arc<Self>,
            action: A,
            guard: Option<&CancellationToken>,
            tracking: &EffectTracking,
        ) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }
            if let Some(&origin) = self.faulted.get() {
                tracing::warn!(origin, "Rejected action: store halted by a fault");
                metrics::counter!("store.faulted.rejected_actions").increment(1);
                return Err(StoreError::Faulted(origin));
            }

            let mut state = lock(&self.state);

            if guard.is_some_and(CancellationToken::is_cancelled) {
                tracing::trace!("Dropped action from cancelled effect");
                metrics::counter!("store.actions.superseded").increment(1);
                return Err(StoreError::Superseded);
            }

            metrics::counter!("store.actions.total").increment(1);

            let start = std::time::Instant::now();
            let effects = {
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();
                self.reducer.reduce(&mut state, action, &self.environment)
            };
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            self.publish(&state);

            tracing::trace!("Reducer returned {} effects", effects.len());
            // Effects start while the lock is still held so cancellation of a
            // superseded effect happens before any other action is reduced.
            for effect in effects {
                self.execute(effect, tracking);
            }

            Ok(())
        }

        /// Publish `state` if it differs from the last published state
        fn publish(&self, state: &S) {
            let changed = self.published.send_if_modified(|current| {
                if current == state {
                    false
                } else {
                    current.clone_from(state);
                    true
                }
            });

            if changed {
                tracing::debug!("Published new state");
                metrics::counter!("store.states.published").increment(1);
                // No transition observers is fine
                let _ = self.transitions.send(state.clone());
            }
        }

        /// Start an effect
        ///
        /// Synchronous effects (`None`, `Emit`, `Cancel`) happen immediately;
        /// everything else runs on a background task. Keyed streams claim
        /// their id here, under the state lock, wherever they are nested.
        fn execute(self: &Arc<Self>, effect: Effect<A, R::Event>, tracking: &EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Emit(event) => {
                    tracing::trace!("Executing Effect::Emit");
                    metrics::counter!("store.effects.executed", "type" => "emit").increment(1);
                    self.events.emit(event);
                },
                Effect::Cancel(id) => {
                    tracing::trace!(%id, "Executing Effect::Cancel");
                    metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                    self.cancel_in_flight(&id);
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    for effect in effects {
                        self.execute(effect, tracking);
                    }
                },
                Effect::Stream {
                    id: Some(id),
                    stream,
                } => {
                    // Registered now, under the state lock, so the previous
                    // holder of this id is cancelled before we return.
                    let (generation, token) = self.register(id.clone());
                    self.spawn(tracking, token.clone(), move |inner, tracking| {
                        Box::pin(async move {
                            inner.drive(stream, &token, &tracking).await;
                            inner.release(&id, generation);
                        })
                    });
                },
                other => {
                    let mut claimed = Claims::new();
                    if let Effect::Sequential(effects) = &other {
                        self.claim_keyed(effects, &mut claimed);
                    }
                    let claims = Mutex::new(claimed);

                    let token = self.lifetime.child_token();
                    self.spawn(tracking, token.clone(), move |inner, tracking| {
                        Box::pin(async move {
                            inner.run(other, &token, &tracking, &claims).await;
                            for (id, (generation, _)) in lock(&claims).drain() {
                                inner.release(&id, generation);
                            }
                        })
                    });
                },
            }
        }

        /// Spawn a tracked background task that stops when `token` is cancelled
        fn spawn<F>(self: &Arc<Self>, tracking: &EffectTracking, token: CancellationToken, task: F)
        where
            F: FnOnce(Arc<Self>, EffectTracking) -> BoxFuture<'static, ()> + Send + 'static,
        {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            let guard = DecrementGuard(tracking.clone());
            let work = task(Arc::clone(self), tracking.clone());

            tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;

                tokio::select! {
                    biased;

                    () = token.cancelled() => {
                        tracing::debug!("Effect task cancelled");
                        metrics::counter!("store.effects.cancelled").increment(1);
                    }
                    () = work => {}
                }
            });
        }

        /// Register every keyed stream in `effects`, first occurrence per id
        fn claim_keyed(&self, effects: &[Effect<A, R::Event>], claims: &mut Claims) {
            for effect in effects {
                match effect {
                    Effect::Stream { id: Some(id), .. } if !claims.contains_key(id) => {
                        let claim = self.register(id.clone());
                        claims.insert(id.clone(), claim);
                    },
                    Effect::Parallel(nested) | Effect::Sequential(nested) => {
                        self.claim_keyed(nested, claims);
                    },
                    _ => {},
                }
            }
        }

        /// Run an effect to completion on the current task
        ///
        /// Keyed streams use their claim from `claims` when there is one.
        fn run<'a>(
            self: &'a Arc<Self>,
            effect: Effect<A, R::Event>,
            token: &'a CancellationToken,
            tracking: &'a EffectTracking,
            claims: &'a Mutex<Claims>,
        ) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Emit(event) => self.events.emit(event),
                    Effect::Cancel(id) => self.cancel_in_flight(&id),
                    Effect::Future(fut) => {
                        metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, feeding back");
                            self.feed(action, token, tracking);
                        }
                    },
                    Effect::Delay { duration, action } => {
                        metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                        tokio::time::sleep(duration).await;
                        self.feed(*action, token, tracking);
                    },
                    Effect::Stream { id: None, stream } => {
                        self.drive(stream, token, tracking).await;
                    },
                    Effect::Stream {
                        id: Some(id),
                        stream,
                    } => {
                        let claimed = lock(claims).remove(&id);
                        let (generation, own) = claimed.unwrap_or_else(|| self.register(id.clone()));
                        tokio::select! {
                            biased;

                            () = own.cancelled() => {},
                            () = self.drive(stream, &own, tracking) => {},
                        }
                        self.release(&id, generation);
                    },
                    Effect::Parallel(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                        join_all(effects.into_iter().map(|e| self.run(e, token, tracking, claims))).await;
                    },
                    Effect::Sequential(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                        for effect in effects {
                            if token.is_cancelled() {
                                break;
                            }
                            self.run(effect, token, tracking, claims).await;
                        }
                    },
                }
            })
        }

        /// Feed every item of a stream back into the reducer, in order
        ///
        /// Stops at the first fault, or as soon as an action is rejected
        /// (cancelled effect or store shutting down).
        async fn drive(
            self: &Arc<Self>,
            mut stream: EffectStream<A>,
            token: &CancellationToken,
            tracking: &EffectTracking,
        ) {
            metrics::counter!("store.effects.executed", "type" => "stream").increment(1);

            while let Some(item) = stream.next().await {
                match item {
                    Ok(action) => {
                        if !self.feed(action, token, tracking) {
                            break;
                        }
                    },
                    Err(fault) => {
                        self.report(fault);
                        break;
                    },
                }
            }
        }

        /// Send an effect-produced action back through the reducer
        fn feed(self: &Arc<Self>, action: A, token: &CancellationToken, tracking: &EffectTracking) -> bool {
            match self.dispatch(action, Some(token), tracking) {
                Ok(()) => true,
                Err(error) => {
                    tracing::trace!(%error, "Feedback action rejected");
                    false
                },
            }
        }

        /// Register a keyed effect, cancelling any effect already holding the id
        fn register(&self, id: EffectId) -> (u64, CancellationToken) {
            let generation = self.generation.fetch_add(1, Ordering::SeqCst);
            let token = self.lifetime.child_token();

            let previous = lock(&self.in_flight).insert(id.clone(), (generation, token.clone()));
            if let Some((_, previous)) = previous {
                tracing::debug!(%id, "Superseding in-flight effect");
                metrics::counter!("store.effects.superseded").increment(1);
                previous.cancel();
            }

            (generation, token)
        }

        /// Forget a keyed effect once it finishes, unless it was already replaced
        fn release(&self, id: &EffectId, generation: u64) {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.get(id).is_some_and(|(current, _)| *current == generation) {
                in_flight.remove(id);
            }
        }

        fn cancel_in_flight(&self, id: &EffectId) {
            if let Some((_, token)) = lock(&self.in_flight).remove(id) {
                tracing::debug!(%id, "Cancelling in-flight effect");
                token.cancel();
            }
        }

        /// Halt the store and hand a fault to the fault handler and observers
        fn report(&self, fault: Fault) {
            metrics::counter!("store.faults.total", "origin" => fault.origin()).increment(1);
            tracing::error!(origin = fault.origin(), error = %fault.error(), "Effect raised a fault, halting store");

            // The first fault names the halt; later ones are still reported
            let _ = self.faulted.set(fault.origin());
            self.lifetime.cancel();

            if let Some(handler) = &self.fault_handler {
                handler(&fault);
            }
            // No fault observers is fine
            let _ = self.faults.send(Arc::new(fault));
        }
    }
}
