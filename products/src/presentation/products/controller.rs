//! The product grid screen's state controller.

use super::reducer::{ProductsEnvironment, ProductsReducer};
use super::udf::{ProductsAction, ProductsUiAction, ProductsUiSideEffect, ProductsUiState};
use std::time::Duration;
use storefront_runtime::{EffectHandle, EventReceiver, Store, StoreConfig, StoreError};
use tokio::sync::watch;

/// Store running the grid screen
pub type ProductsStore =
    Store<ProductsUiState, ProductsAction, ProductsEnvironment, ProductsReducer>;

/// Owns the grid screen's state and background work.
///
/// Dropping the controller cancels its running fetch. An unclassified fetch
/// failure halts the controller; install a fault handler through
/// [`with_config`](Self::with_config) to report it.
pub struct ProductsController {
    store: ProductsStore,
}

impl ProductsController {
    /// Create a controller in the initial loading state
    #[must_use]
    pub fn new(env: ProductsEnvironment) -> Self {
        Self::with_config(env, StoreConfig::default())
    }

    /// Create a controller with a custom store configuration
    #[must_use]
    pub fn with_config(env: ProductsEnvironment, config: StoreConfig) -> Self {
        Self {
            store: Store::with_config(ProductsUiState::default(), ProductsReducer, env, config),
        }
    }

    /// Handle a user intent
    ///
    /// Returns once the resulting state is published; the fetch itself runs
    /// in the background and is tracked by the returned handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown),
    /// or [`StoreError::Faulted`] once a fetch failed in an unclassified way.
    pub fn handle_action(&self, action: ProductsUiAction) -> Result<EffectHandle, StoreError> {
        self.store.send(ProductsAction::View(action))
    }

    /// The current state, redelivered to every new observer
    #[must_use]
    pub fn ui_state(&self) -> watch::Receiver<ProductsUiState> {
        self.store.subscribe()
    }

    /// A copy of the current state
    #[must_use]
    pub fn current_state(&self) -> ProductsUiState {
        self.store.state(Clone::clone)
    }

    /// One-shot side effects, each delivered to a single observer
    #[must_use]
    pub fn side_effects(&self) -> EventReceiver<ProductsUiSideEffect> {
        self.store.events()
    }

    /// The underlying store, for transition and fault observers
    #[must_use]
    pub const fn store(&self) -> &ProductsStore {
        &self.store
    }

    /// Cancel the running fetch and stop accepting intents
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if background work does not
    /// stop within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}
