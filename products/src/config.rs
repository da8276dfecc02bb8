//! Screen configuration.
//!
//! Every config has sensible defaults and derives `Deserialize`, so a host
//! can load overrides from a file and fall back to defaults for the rest.

use serde::Deserialize;
use storefront_runtime::retry::RetryPolicy;
use std::time::Duration;

/// Paging of product search results
///
/// # Example
///
/// ```
/// use storefront_products::config::PagingConfig;
///
/// let config = PagingConfig::default().with_page_size(50).with_prefetch_pages(2);
/// assert_eq!(config.page_size, 50);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Items requested per page
    pub page_size: usize,
    /// Pages fetched per demand: on screen start and on each request for
    /// the next page
    pub prefetch_pages: usize,
}

impl PagingConfig {
    /// Set the page size
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the number of pages fetched per demand
    #[must_use]
    pub const fn with_prefetch_pages(mut self, prefetch_pages: usize) -> Self {
        self.prefetch_pages = prefetch_pages;
        self
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            prefetch_pages: 1,
        }
    }
}

/// Loading of the search history
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Backoff applied to transient load failures
    pub retry: RetryPolicy,
    /// Show an empty history when loading fails for good
    ///
    /// When disabled the screen stays in its loading state.
    pub fallback_to_empty: bool,
}

impl HistoryConfig {
    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable the empty-history fallback
    #[must_use]
    pub const fn with_fallback_to_empty(mut self, fallback: bool) -> Self {
        self.fallback_to_empty = fallback;
        self
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::builder()
                .max_retries(3)
                .initial_delay(Duration::from_millis(200))
                .max_delay(Duration::from_secs(2))
                .jitter(true)
                .build(),
            fallback_to_empty: true,
        }
    }
}
