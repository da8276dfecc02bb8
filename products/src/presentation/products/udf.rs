//! State, actions and side effects of the product grid screen.

use crate::presentation::error::ClassifiedError;

/// Label shown on products with free shipping
pub const FREE_SHIPPING_LABEL: &str = "Frete grátis";

/// A product row as shown in the grid
#[derive(Clone, Debug, PartialEq)]
pub struct ProductUi {
    /// Backend identifier, used for navigation
    pub id: String,
    /// Display name
    pub name: String,
    /// Formatted price (e.g. "R$ 1.499,00")
    pub price: String,
    /// Thumbnail URL
    pub image_url: String,
    /// Item condition
    pub condition: String,
    /// Units available
    pub available_quantity: u32,
    /// Free-shipping label, if shipping is free
    pub free_shipping: Option<&'static str>,
    /// Total results of the query
    pub total: u32,
}

/// Snapshot of everything the grid screen shows
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductsUiModel {
    /// Query the grid shows results for
    pub searched_term: String,
    /// Message of the last failure
    pub error: Option<String>,
    /// Products loaded so far, in page order
    pub products: Vec<ProductUi>,
    /// Total results reported by the backend
    pub total_products: usize,
    /// Whether more results can be loaded after the shown products
    pub has_more: bool,
    /// Whether the next page is being fetched
    pub loading_more: bool,
}

impl ProductsUiModel {
    /// Copy with a new searched term
    #[must_use]
    pub fn with_searched_term(self, searched_term: impl Into<String>) -> Self {
        Self {
            searched_term: searched_term.into(),
            ..self
        }
    }

    /// Copy with a failure message
    #[must_use]
    pub fn with_error(self, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..self
        }
    }
}

/// State of the grid screen
#[derive(Clone, Debug, PartialEq)]
pub enum ProductsUiState {
    /// A fetch is in progress
    Loading(ProductsUiModel),
    /// Results are shown
    ResumedGrid(ProductsUiModel),
    /// The backend refused the query
    Error(ProductsUiModel),
    /// The backend could not be reached
    NetworkError(ProductsUiModel),
}

impl ProductsUiState {
    /// The model carried by the current state
    #[must_use]
    pub const fn model(&self) -> &ProductsUiModel {
        match self {
            Self::Loading(model)
            | Self::ResumedGrid(model)
            | Self::Error(model)
            | Self::NetworkError(model) => model,
        }
    }

    /// Move the model out, leaving an empty one behind
    pub(crate) fn take_model(&mut self) -> ProductsUiModel {
        match self {
            Self::Loading(model)
            | Self::ResumedGrid(model)
            | Self::Error(model)
            | Self::NetworkError(model) => std::mem::take(model),
        }
    }

    /// Whether a completed fetch found nothing
    ///
    /// The view shows its "no results" placeholder in this case.
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::ResumedGrid(model) if model.products.is_empty())
    }
}

impl Default for ProductsUiState {
    fn default() -> Self {
        Self::Loading(ProductsUiModel::default())
    }
}

/// User intents on the grid screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductsUiAction {
    /// The screen opened for a query
    StartScreen(String),
    /// Retry the last query
    Retry,
    /// The view needs more rows (e.g. scrolled near the end of the grid)
    LoadNextPage,
    /// The search bar was tapped
    ClickSearchBar,
    /// A product was tapped
    ClickProduct(String),
}

/// One-shot instructions to the grid screen's view
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductsUiSideEffect {
    /// Return to the search screen
    BackToSearch,
    /// Open the detail screen of a product
    NavigateToDetail(String),
}

/// A page of results, already mapped for display
#[derive(Clone, Debug, PartialEq)]
pub struct ProductsPage {
    /// Products in this page
    pub items: Vec<ProductUi>,
    /// Whether this page starts a new result set
    pub first: bool,
    /// Total results reported by the backend
    pub total: usize,
    /// Whether results remain after this page
    pub has_more: bool,
}

/// Everything the grid reducer handles
#[derive(Clone, Debug, PartialEq)]
pub enum ProductsAction {
    /// Intent from the view
    View(ProductsUiAction),
    /// The running fetch delivered a page
    PageLoaded(ProductsPage),
    /// The running fetch failed
    FetchFailed(ClassifiedError),
}

impl From<ProductsUiAction> for ProductsAction {
    fn from(action: ProductsUiAction) -> Self {
        Self::View(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_is_shared_by_every_state() {
        let model = ProductsUiModel::default().with_searched_term("tv");
        let state = ProductsUiState::NetworkError(model.clone().with_error("offline"));

        assert_eq!(state.model().searched_term, "tv");
        assert_eq!(state.model().error.as_deref(), Some("offline"));
    }

    #[test]
    fn only_an_empty_grid_is_an_empty_result() {
        assert!(ProductsUiState::ResumedGrid(ProductsUiModel::default()).is_empty_result());
        assert!(!ProductsUiState::default().is_empty_result());
        assert!(!ProductsUiState::Error(ProductsUiModel::default()).is_empty_result());
    }
}
