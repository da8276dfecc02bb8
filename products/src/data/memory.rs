//! In-memory repositories.
//!
//! Used by tests and the demo binary. Both repositories record the calls
//! they receive and can be scripted to fail.

use crate::domain::error::RepositoryError;
use crate::domain::model::{Page, PageRequest, ProductItem};
use crate::domain::repository::{ProductsRepository, RepositoryFuture, TermsRepository};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Produces the error of a scripted failure
pub type FailureFn = Arc<dyn Fn() -> RepositoryError + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Failure armed after a number of successful calls
struct ScriptedFailure {
    successes_left: usize,
    error: FailureFn,
}

impl ScriptedFailure {
    /// Consume one call; returns the error if this call should fail
    fn next(&mut self) -> Option<RepositoryError> {
        if self.successes_left == 0 {
            Some((self.error)())
        } else {
            self.successes_left -= 1;
            None
        }
    }
}

/// Product catalog keyed by exact query.
///
/// Unknown queries return an empty first page.
#[derive(Default)]
pub struct InMemoryProductsRepository {
    catalog: HashMap<String, Vec<ProductItem>>,
    latency: Option<Duration>,
    failure: Mutex<Option<ScriptedFailure>>,
    requests: Mutex<Vec<(String, PageRequest)>>,
}

impl InMemoryProductsRepository {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `items` for `query`
    #[must_use]
    pub fn with_results(mut self, query: impl Into<String>, items: Vec<ProductItem>) -> Self {
        self.catalog.insert(query.into(), items);
        self
    }

    /// Delay every response by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every fetch with the error produced by `error`
    #[must_use]
    pub fn fail_with<F>(self, error: F) -> Self
    where
        F: Fn() -> RepositoryError + Send + Sync + 'static,
    {
        self.fail_after(0, error)
    }

    /// Serve `pages` fetches, then fail every later fetch
    #[must_use]
    pub fn fail_after<F>(self, pages: usize, error: F) -> Self
    where
        F: Fn() -> RepositoryError + Send + Sync + 'static,
    {
        *lock(&self.failure) = Some(ScriptedFailure {
            successes_left: pages,
            error: Arc::new(error),
        });
        self
    }

    /// Stop failing
    pub fn recover(&self) {
        lock(&self.failure).take();
    }

    /// Page requests received for `query`, in order
    #[must_use]
    pub fn requests(&self, query: &str) -> Vec<PageRequest> {
        lock(&self.requests)
            .iter()
            .filter(|(q, _)| q == query)
            .map(|(_, request)| *request)
            .collect()
    }

    fn page(&self, query: &str, request: PageRequest) -> Page {
        let items = self.catalog.get(query).map_or(&[][..], Vec::as_slice);
        let start = request.offset.min(items.len());
        let end = (start + request.limit).min(items.len());

        Page {
            items: items[start..end].to_vec(),
            offset: request.offset,
            total: items.len(),
        }
    }
}

impl ProductsRepository for InMemoryProductsRepository {
    fn fetch_page(&self, query: String, request: PageRequest) -> RepositoryFuture<'_, Page> {
        Box::pin(async move {
            lock(&self.requests).push((query.clone(), request));

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            if let Some(error) = lock(&self.failure).as_mut().and_then(ScriptedFailure::next) {
                return Err(error);
            }

            Ok(self.page(&query, request))
        })
    }
}

/// Search history held in memory.
///
/// Saving a term moves it to the front of the history.
#[derive(Default)]
pub struct InMemoryTermsRepository {
    history: Mutex<Vec<String>>,
    saved: Mutex<Vec<String>>,
    load_calls: AtomicUsize,
    load_failure: Mutex<Option<(usize, FailureFn)>>,
    save_failure: Mutex<Option<FailureFn>>,
}

impl InMemoryTermsRepository {
    /// Create a repository with an empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `terms`
    #[must_use]
    pub fn with_history<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            history: Mutex::new(terms.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Fail the next `times` history loads with the error produced by `error`
    #[must_use]
    pub fn fail_loads<F>(self, times: usize, error: F) -> Self
    where
        F: Fn() -> RepositoryError + Send + Sync + 'static,
    {
        *lock(&self.load_failure) = Some((times, Arc::new(error)));
        self
    }

    /// Fail every save with the error produced by `error`
    #[must_use]
    pub fn fail_saves<F>(self, error: F) -> Self
    where
        F: Fn() -> RepositoryError + Send + Sync + 'static,
    {
        *lock(&self.save_failure) = Some(Arc::new(error));
        self
    }

    /// Number of history loads attempted
    #[must_use]
    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// Terms passed to `save_term`, in order, including failed saves
    #[must_use]
    pub fn saved_terms(&self) -> Vec<String> {
        lock(&self.saved).clone()
    }
}

impl TermsRepository for InMemoryTermsRepository {
    fn load_history(&self) -> RepositoryFuture<'_, Vec<String>> {
        Box::pin(async move {
            self.load_calls.fetch_add(1, Ordering::SeqCst);

            if let Some((remaining, error)) = lock(&self.load_failure).as_mut() {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(error());
                }
            }

            Ok(lock(&self.history).clone())
        })
    }

    fn save_term(&self, term: String) -> RepositoryFuture<'_, ()> {
        Box::pin(async move {
            lock(&self.saved).push(term.clone());

            if let Some(error) = lock(&self.save_failure).as_ref() {
                return Err(error());
            }

            let mut history = lock(&self.history);
            history.retain(|existing| existing != &term);
            history.insert(0, term);
            Ok(())
        })
    }
}
