//! Reducer of the product grid screen.

use super::mapper::to_product_ui;
use super::udf::{
    ProductsAction, ProductsPage, ProductsUiAction, ProductsUiSideEffect, ProductsUiState,
};
use crate::config::PagingConfig;
use crate::domain::model::Page;
use crate::domain::repository::ProductsRepository;
use crate::domain::usecase::{GetProductsUseCase, ProductPages};
use crate::presentation::error::{ErrorKind, classify};
use futures::StreamExt;
use storefront_core::effect::{Effect, EffectId};
use storefront_core::reducer::{Effects, Reducer};
use std::sync::Arc;
use storefront_core::{Fault, smallvec};

/// Id of the running product fetch; a new fetch replaces the previous one
pub const FETCH: EffectId = EffectId::new("products.fetch");

/// Dependencies of the grid screen
#[derive(Clone)]
pub struct ProductsEnvironment {
    /// Paged product search
    pub get_products: GetProductsUseCase,
}

impl ProductsEnvironment {
    /// Environment over a products repository
    #[must_use]
    pub fn new(repository: Arc<dyn ProductsRepository>, paging: PagingConfig) -> Self {
        Self {
            get_products: GetProductsUseCase::new(repository, paging),
        }
    }
}

/// Reducer for [`ProductsUiState`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ProductsReducer;

impl Reducer for ProductsReducer {
    type State = ProductsUiState;
    type Action = ProductsAction;
    type Event = ProductsUiSideEffect;
    type Environment = ProductsEnvironment;

    fn reduce(
        &self,
        state: &mut ProductsUiState,
        action: ProductsAction,
        env: &ProductsEnvironment,
    ) -> Effects<ProductsAction, ProductsUiSideEffect> {
        match action {
            ProductsAction::View(ProductsUiAction::StartScreen(term)) => {
                start_fetch(state, term, env)
            },
            ProductsAction::View(ProductsUiAction::Retry) => {
                let term = state.model().searched_term.clone();
                start_fetch(state, term, env)
            },
            ProductsAction::View(ProductsUiAction::LoadNextPage) => match state {
                ProductsUiState::ResumedGrid(model) if model.has_more && !model.loading_more => {
                    tracing::debug!(
                        term = %model.searched_term,
                        offset = model.products.len(),
                        "Loading next products page"
                    );
                    model.loading_more = true;
                    let pages = env
                        .get_products
                        .products_from(model.searched_term.clone(), model.products.len());
                    smallvec![fetch(pages, env)]
                },
                _ => smallvec![],
            },
            ProductsAction::View(ProductsUiAction::ClickSearchBar) => {
                smallvec![Effect::Emit(ProductsUiSideEffect::BackToSearch)]
            },
            ProductsAction::View(ProductsUiAction::ClickProduct(id)) => {
                smallvec![Effect::Emit(ProductsUiSideEffect::NavigateToDetail(id))]
            },
            ProductsAction::PageLoaded(page) => {
                let mut model = state.take_model();
                if page.first {
                    model.products = page.items;
                } else {
                    model.products.extend(page.items);
                }
                model.total_products = page.total;
                model.has_more = page.has_more;
                model.loading_more = false;

                *state = ProductsUiState::ResumedGrid(model);
                smallvec![]
            },
            ProductsAction::FetchFailed(error) => {
                let mut model = state.take_model().with_error(error.message);
                model.loading_more = false;

                *state = match error.kind {
                    ErrorKind::Domain => ProductsUiState::Error(model),
                    ErrorKind::Transport => ProductsUiState::NetworkError(model),
                };
                smallvec![]
            },
        }
    }
}

/// Show loading for `term` and replace any running fetch
fn start_fetch(
    state: &mut ProductsUiState,
    term: String,
    env: &ProductsEnvironment,
) -> Effects<ProductsAction, ProductsUiSideEffect> {
    tracing::debug!(term = %term, "Starting product fetch");

    let pages = env.get_products.products(term.clone());
    let mut model = state.take_model().with_searched_term(term);
    model.loading_more = false;
    *state = ProductsUiState::Loading(model);

    smallvec![fetch(pages, env)]
}

/// Consume the next prefetch window of `pages` under the [`FETCH`] id
fn fetch(
    pages: ProductPages,
    env: &ProductsEnvironment,
) -> Effect<ProductsAction, ProductsUiSideEffect> {
    let window = env.get_products.paging().prefetch_pages.max(1);

    Effect::cancellable_stream(
        FETCH,
        pages.take(window).map(|result| match result {
            Ok(page) => Ok(ProductsAction::PageLoaded(to_products_page(page))),
            Err(error) => classify(error)
                .map(ProductsAction::FetchFailed)
                .map_err(|unclassified| Fault::new("products.fetch", unclassified)),
        }),
    )
}

fn to_products_page(page: Page) -> ProductsPage {
    ProductsPage {
        first: page.is_first(),
        has_more: page.has_more(),
        total: page.total,
        items: page.items.into_iter().map(to_product_ui).collect(),
    }
}
