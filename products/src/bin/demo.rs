//! Storefront demo binary
//!
//! Drives the search and product grid screens against in-memory repositories
//! and logs every published state and side effect.

use std::sync::Arc;
use std::time::Duration;
use storefront_products::data::memory::{InMemoryProductsRepository, InMemoryTermsRepository};
use storefront_products::domain::{ProductItem, RepositoryError};
use storefront_products::presentation::products::{
    ProductsUiAction, ProductsUiSideEffect, ProductsUiState,
};
use storefront_products::presentation::search::{SearchUiAction, SearchUiSideEffect};
use storefront_products::{
    PagingConfig, ProductsController, ProductsEnvironment, SearchController, SearchEnvironment,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn catalog() -> Vec<ProductItem> {
    (1..=25)
        .map(|i| ProductItem {
            id: format!("MLB{i:04}"),
            title: format!("Motorola Moto G{i}"),
            price: 899.0 + f64::from(i) * 50.0,
            thumbnail: format!("https://img.example.com/moto-g{i}.webp"),
            condition: "Novo".into(),
            available_quantity: i,
            free_shipping: i % 2 == 0,
            total: 25,
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_demo=info,storefront_products=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Storefront Demo: product search ===\n");

    // Search screen
    let terms = Arc::new(InMemoryTermsRepository::with_history([
        "motorola",
        "smart tv",
        "Moto G",
        "notebook",
    ]));
    let search = SearchController::new(SearchEnvironment::new(terms.clone(), Default::default()));
    let mut search_effects = search.side_effects();
    search.history_load().wait().await;
    tracing::info!(state = ?search.current_state().ui(), "Search screen ready");

    for text in ["m", "mo", "moto"] {
        search.handle_action(SearchUiAction::TextChanged(text.into()))?;
        tracing::info!(text, state = ?search.current_state().ui(), "Typed");
    }

    search
        .handle_action(SearchUiAction::ClickSearch {
            product_name: "moto".into(),
            network_available: false,
        })?
        .wait()
        .await;
    if let Some(effect) = search_effects.try_recv() {
        tracing::info!(?effect, "Offline search attempt");
    }

    search
        .handle_action(SearchUiAction::ClickSearch {
            product_name: "Motorola".into(),
            network_available: true,
        })?
        .wait()
        .await;

    let Some(SearchUiSideEffect::NavigateToProducts(term)) = search_effects.recv().await else {
        anyhow::bail!("search screen did not navigate");
    };
    tracing::info!(saved = ?terms.saved_terms(), %term, "Navigating to products");
    search.shutdown(Duration::from_secs(1)).await?;

    // Product grid screen
    println!("\n=== Product grid for {term:?} ===\n");

    let products = Arc::new(
        InMemoryProductsRepository::new()
            .with_results(term.clone(), catalog())
            .with_latency(Duration::from_millis(150)),
    );
    let grid = ProductsController::new(ProductsEnvironment::new(
        products.clone(),
        PagingConfig::default().with_page_size(10),
    ));
    let mut grid_effects = grid.side_effects();

    let mut state = grid.ui_state();
    let observer = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = state.borrow_and_update().clone();
            let label = match &current {
                ProductsUiState::Loading(_) => "loading",
                ProductsUiState::ResumedGrid(_) => "grid",
                ProductsUiState::Error(_) => "error",
                ProductsUiState::NetworkError(_) => "network error",
            };
            let model = current.model();
            tracing::info!(
                term = %model.searched_term,
                shown = model.products.len(),
                total = model.total_products,
                error = ?model.error,
                "Grid state: {label}"
            );
        }
    });

    grid.handle_action(ProductsUiAction::StartScreen(term.clone()))?
        .wait()
        .await;

    // The user scrolls to the end of the grid
    while matches!(grid.current_state(), ProductsUiState::ResumedGrid(model) if model.has_more) {
        grid.handle_action(ProductsUiAction::LoadNextPage)?.wait().await;
    }
    tracing::info!(pages = products.requests(&term).len(), "Grid fully loaded");

    // Connection drops, then comes back for the retry
    let flaky = Arc::new(
        InMemoryProductsRepository::new()
            .with_results(term.clone(), catalog())
            .fail_with(|| RepositoryError::transport("No connection")),
    );
    let offline_grid = ProductsController::new(ProductsEnvironment::new(
        flaky.clone(),
        PagingConfig::default(),
    ));
    offline_grid.handle_action(ProductsUiAction::StartScreen(term.clone()))?.wait().await;
    tracing::info!(state = ?offline_grid.current_state().model().error, "Offline fetch");
    flaky.recover();
    offline_grid.handle_action(ProductsUiAction::Retry)?.wait().await;
    tracing::info!(
        shown = offline_grid.current_state().model().products.len(),
        "Retried fetch"
    );

    grid.handle_action(ProductsUiAction::ClickProduct("MLB0003".into()))?;
    if let Some(ProductsUiSideEffect::NavigateToDetail(id)) = grid_effects.recv().await {
        tracing::info!(%id, "Navigate to detail");
    }

    offline_grid.shutdown(Duration::from_secs(1)).await?;
    grid.shutdown(Duration::from_secs(1)).await?;
    observer.abort();

    println!("\n=== Demo complete ===");
    Ok(())
}
