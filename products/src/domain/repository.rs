//! Repository contracts.
//!
//! Both traits return explicit `Pin<Box<dyn Future>>` so they can be held as
//! `Arc<dyn ...>` by use cases and captured by effects.

use super::error::RepositoryError;
use super::model::{Page, PageRequest};
use std::future::Future;
use std::pin::Pin;

/// Future returned by repository calls
pub type RepositoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Source of paged product search results.
pub trait ProductsRepository: Send + Sync {
    /// Fetch one page of results for `query`.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::Domain`] if the backend rejects the query
    /// - [`RepositoryError::Transport`] if the backend is unreachable
    fn fetch_page(&self, query: String, request: PageRequest) -> RepositoryFuture<'_, Page>;
}

/// Persistence of previously searched terms.
pub trait TermsRepository: Send + Sync {
    /// Load the search history, most relevant first.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read.
    fn load_history(&self) -> RepositoryFuture<'_, Vec<String>>;

    /// Record a searched term.
    ///
    /// # Errors
    ///
    /// Returns an error if the term cannot be stored.
    fn save_term(&self, term: String) -> RepositoryFuture<'_, ()>;
}
