//! Domain types for product search.

/// A product as returned by the products repository
#[derive(Clone, Debug, PartialEq)]
pub struct ProductItem {
    /// Backend identifier
    pub id: String,
    /// Listing title
    pub title: String,
    /// Price in reais
    pub price: f64,
    /// Thumbnail URL
    pub thumbnail: String,
    /// Item condition as reported by the backend (e.g. "Novo")
    pub condition: String,
    /// Units available
    pub available_quantity: u32,
    /// Whether shipping is free
    pub free_shipping: bool,
    /// Total results of the query this item belongs to
    pub total: u32,
}

/// Offset/limit window into a query's results
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Index of the first requested item
    pub offset: usize,
    /// Maximum number of items
    pub limit: usize,
}

impl PageRequest {
    /// The first page of a query
    #[must_use]
    pub const fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    /// The page following one that returned `received` items
    #[must_use]
    pub const fn next(self, received: usize) -> Self {
        Self {
            offset: self.offset + received,
            limit: self.limit,
        }
    }
}

/// One page of results
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// Items in this page
    pub items: Vec<ProductItem>,
    /// Offset of the first item
    pub offset: usize,
    /// Total results across all pages
    pub total: usize,
}

impl Page {
    /// Whether results remain after this page
    ///
    /// An empty page never has more: a backend that reports a larger total
    /// but returns nothing would otherwise be polled forever.
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.items.is_empty() && self.offset + self.items.len() < self.total
    }

    /// Whether this is the first page of a query
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.offset == 0
    }
}
