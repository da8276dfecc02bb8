//! The search screen's state controller.

use super::reducer::{SearchEnvironment, SearchReducer};
use super::udf::{SearchAction, SearchState, SearchUiAction, SearchUiSideEffect, SearchUiState};
use std::time::Duration;
use storefront_runtime::{EffectHandle, EventReceiver, Store, StoreConfig, StoreError};
use tokio::sync::watch;

/// Store running the search screen
pub type SearchStore = Store<SearchState, SearchAction, SearchEnvironment, SearchReducer>;

/// Owns the search screen's state and background work.
///
/// Construction starts loading the search history, so it must happen inside
/// a Tokio runtime.
pub struct SearchController {
    store: SearchStore,
    history_load: EffectHandle,
}

impl SearchController {
    /// Create a controller and start loading the history
    #[must_use]
    pub fn new(env: SearchEnvironment) -> Self {
        Self::with_config(env, StoreConfig::default())
    }

    /// Create a controller with a custom store configuration
    #[must_use]
    pub fn with_config(env: SearchEnvironment, config: StoreConfig) -> Self {
        let store = Store::with_config(SearchState::default(), SearchReducer, env, config);
        // A fresh store always accepts actions
        let history_load = store
            .send(SearchAction::LoadHistory)
            .unwrap_or_else(|_| EffectHandle::completed());

        Self {
            store,
            history_load,
        }
    }

    /// Handle a user intent
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub fn handle_action(&self, action: SearchUiAction) -> Result<EffectHandle, StoreError> {
        self.store.send(SearchAction::View(action))
    }

    /// The state shown by the view, redelivered to every new observer
    #[must_use]
    pub fn ui_state(&self) -> SearchUiStateReceiver {
        SearchUiStateReceiver::new(self.store.subscribe())
    }

    /// A copy of the store state, including the unfiltered history
    #[must_use]
    pub fn current_state(&self) -> SearchState {
        self.store.state(Clone::clone)
    }

    /// One-shot side effects, each delivered to a single observer
    #[must_use]
    pub fn side_effects(&self) -> EventReceiver<SearchUiSideEffect> {
        self.store.events()
    }

    /// Handle tracking the initial history load
    #[must_use]
    pub fn history_load(&self) -> EffectHandle {
        self.history_load.clone()
    }

    /// The underlying store, for transition and fault observers
    #[must_use]
    pub const fn store(&self) -> &SearchStore {
        &self.store
    }

    /// Cancel background work and stop accepting intents
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if background work does not
    /// stop within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

/// Observer of the search screen's [`SearchUiState`]
///
/// Projects the store state onto what the view renders. Changes that only
/// touch the unfiltered history are not reported.
#[derive(Clone, Debug)]
pub struct SearchUiStateReceiver {
    inner: watch::Receiver<SearchState>,
    seen: SearchUiState,
}

impl SearchUiStateReceiver {
    fn new(mut inner: watch::Receiver<SearchState>) -> Self {
        let seen = inner.borrow_and_update().ui().clone();
        Self { inner, seen }
    }

    /// The latest published state
    #[must_use]
    pub fn current(&self) -> SearchUiState {
        self.inner.borrow().ui().clone()
    }

    /// Wait until the shown state differs from the last one seen, and
    /// return it
    ///
    /// # Errors
    ///
    /// Returns [`watch::error::RecvError`] once the store is gone.
    pub async fn changed(&mut self) -> Result<SearchUiState, watch::error::RecvError> {
        loop {
            self.inner.changed().await?;

            let state = self.inner.borrow_and_update();
            if *state.ui() != self.seen {
                self.seen = state.ui().clone();
                return Ok(self.seen.clone());
            }
        }
    }
}
