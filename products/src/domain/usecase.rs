//! Use cases: one repository concern each, shared by the screens.

use super::error::RepositoryError;
use super::model::{Page, PageRequest};
use super::repository::{ProductsRepository, TermsRepository};
use crate::config::PagingConfig;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// Lazily fetched pages of one query
///
/// Each poll fetches one page. Ends after the last page or right after the
/// first error; otherwise the sequence is unbounded.
pub type ProductPages = Pin<Box<dyn Stream<Item = Result<Page, RepositoryError>> + Send>>;

/// Paged product search.
#[derive(Clone)]
pub struct GetProductsUseCase {
    repository: Arc<dyn ProductsRepository>,
    paging: PagingConfig,
}

impl GetProductsUseCase {
    /// Create the use case over a repository
    #[must_use]
    pub fn new(repository: Arc<dyn ProductsRepository>, paging: PagingConfig) -> Self {
        Self { repository, paging }
    }

    /// Paging applied to every fetch
    #[must_use]
    pub const fn paging(&self) -> &PagingConfig {
        &self.paging
    }

    /// Pages of results for `query`, starting from the first page
    ///
    /// Nothing is fetched until the stream is polled. Every call starts a
    /// fresh sequence.
    #[must_use]
    pub fn products(&self, query: impl Into<String>) -> ProductPages {
        self.products_from(query, 0)
    }

    /// Pages of results for `query`, starting at item `offset`
    ///
    /// Used to resume a query after the items already shown.
    #[must_use]
    pub fn products_from(&self, query: impl Into<String>, offset: usize) -> ProductPages {
        let repository = Arc::clone(&self.repository);
        let query = query.into();
        let mut request = PageRequest {
            offset,
            limit: self.paging.page_size,
        };

        Box::pin(async_stream::stream! {
            loop {
                tracing::debug!(query = %query, offset = request.offset, "Fetching products page");

                match repository.fetch_page(query.clone(), request).await {
                    Ok(page) => {
                        let has_more = page.has_more();
                        request = request.next(page.items.len());
                        yield Ok(page);

                        if !has_more {
                            break;
                        }
                    },
                    Err(error) => {
                        yield Err(error);
                        break;
                    },
                }
            }
        })
    }
}

/// Search history lookup.
#[derive(Clone)]
pub struct GetTermsHistoryUseCase {
    repository: Arc<dyn TermsRepository>,
}

impl GetTermsHistoryUseCase {
    /// Create the use case over a repository
    #[must_use]
    pub fn new(repository: Arc<dyn TermsRepository>) -> Self {
        Self { repository }
    }

    /// The stored search history
    ///
    /// # Errors
    ///
    /// Returns the repository's error if the history cannot be read.
    pub async fn history(&self) -> Result<Vec<String>, RepositoryError> {
        self.repository.load_history().await
    }
}

/// Search history recording.
#[derive(Clone)]
pub struct SaveTermUseCase {
    repository: Arc<dyn TermsRepository>,
}

impl SaveTermUseCase {
    /// Create the use case over a repository
    #[must_use]
    pub fn new(repository: Arc<dyn TermsRepository>) -> Self {
        Self { repository }
    }

    /// Record `term` in the history
    ///
    /// # Errors
    ///
    /// Returns the repository's error if the term cannot be stored.
    pub async fn save(&self, term: impl Into<String>) -> Result<(), RepositoryError> {
        self.repository.save_term(term.into()).await
    }
}
