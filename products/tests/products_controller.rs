//! End-to-end tests of the product grid controller
//!
//! Each test drives a [`ProductsController`] over the in-memory products
//! repository and asserts on the sequence of published states and the side
//! effects delivered to the view.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use std::sync::{Arc, Mutex};
use std::time::Duration;
use storefront_core::Fault;
use storefront_products::data::memory::InMemoryProductsRepository;
use storefront_products::domain::{PageRequest, ProductItem, RepositoryError};
use storefront_products::presentation::products::{
    FREE_SHIPPING_LABEL, ProductsUiAction, ProductsUiModel, ProductsUiSideEffect, ProductsUiState,
};
use storefront_products::{PagingConfig, ProductsController, ProductsEnvironment};
use storefront_runtime::{StoreConfig, StoreError};
use storefront_testing::StateRecorder;

fn item(id: &str, title: &str, price: f64) -> ProductItem {
    ProductItem {
        id: id.into(),
        title: title.into(),
        price,
        thumbnail: format!("https://img.example.com/{id}.webp"),
        condition: "Novo".into(),
        available_quantity: 3,
        free_shipping: true,
        total: 1,
    }
}

fn catalog(count: usize) -> Vec<ProductItem> {
    (0..count)
        .map(|i| item(&format!("MLB{i}"), &format!("Moto G{i}"), 999.0))
        .collect()
}

fn controller(repository: &Arc<InMemoryProductsRepository>) -> ProductsController {
    controller_with_paging(repository, PagingConfig::default())
}

fn controller_with_paging(
    repository: &Arc<InMemoryProductsRepository>,
    paging: PagingConfig,
) -> ProductsController {
    ProductsController::new(ProductsEnvironment::new(repository.clone(), paging))
}

fn start(term: &str) -> ProductsUiAction {
    ProductsUiAction::StartScreen(term.into())
}

fn names(state: &ProductsUiState) -> Vec<&str> {
    state.model().products.iter().map(|p| p.name.as_str()).collect()
}

// ============================================================================
// Fetching
// ============================================================================

#[tokio::test]
async fn single_page_is_shown_as_grid() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("Motorola", vec![item("123", "Motorola", 1499.0)]),
    );
    let controller = controller(&repository);
    let mut recorder = StateRecorder::attach(controller.store());

    controller.handle_action(start("Motorola")).unwrap().wait().await;

    let states = recorder.drain();
    assert_eq!(states.len(), 3, "states: {states:?}");
    assert_eq!(states[0], ProductsUiState::default());
    assert_eq!(
        states[1],
        ProductsUiState::Loading(ProductsUiModel::default().with_searched_term("Motorola"))
    );

    let ProductsUiState::ResumedGrid(model) = &states[2] else {
        panic!("expected grid, got {:?}", states[2]);
    };
    assert_eq!(model.searched_term, "Motorola");
    assert_eq!(model.total_products, 1);
    assert_eq!(model.products.len(), 1);

    let product = &model.products[0];
    assert_eq!(product.id, "123");
    assert_eq!(product.name, "Motorola");
    assert_eq!(product.price, "R$ 1.499,00");
    assert_eq!(product.free_shipping, Some(FREE_SHIPPING_LABEL));
}

#[tokio::test]
async fn transport_failure_shows_network_error() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .fail_with(|| RepositoryError::transport("No connection")),
    );
    let controller = controller(&repository);
    let mut recorder = StateRecorder::attach(controller.store());

    controller.handle_action(start("Motorola")).unwrap().wait().await;

    let states = recorder.drain();
    assert_eq!(states.len(), 3, "states: {states:?}");
    assert!(matches!(states[1], ProductsUiState::Loading(_)));
    assert_eq!(
        states[2],
        ProductsUiState::NetworkError(
            ProductsUiModel::default()
                .with_searched_term("Motorola")
                .with_error("No connection")
        )
    );
}

#[tokio::test]
async fn domain_failure_shows_error_and_stops_paging() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("tv", catalog(30))
            .fail_after(1, || RepositoryError::domain("Too many requests")),
    );
    let controller = controller_with_paging(&repository, PagingConfig::default().with_page_size(10));

    controller.handle_action(start("tv")).unwrap().wait().await;
    controller.handle_action(ProductsUiAction::LoadNextPage).unwrap().wait().await;

    let state = controller.current_state();
    let ProductsUiState::Error(model) = &state else {
        panic!("expected error, got {state:?}");
    };
    assert_eq!(model.error.as_deref(), Some("Too many requests"));
    assert_eq!(model.products.len(), 10);
    assert!(!model.loading_more);

    // An error state takes no more pages until the user retries
    controller.handle_action(ProductsUiAction::LoadNextPage).unwrap().wait().await;
    assert_eq!(repository.requests("tv").len(), 2);
}

#[tokio::test]
async fn later_pages_are_fetched_on_demand() {
    let repository = Arc::new(InMemoryProductsRepository::new().with_results("tv", catalog(25)));
    let controller = controller_with_paging(&repository, PagingConfig::default().with_page_size(10));
    let mut recorder = StateRecorder::attach(controller.store());

    controller.handle_action(start("tv")).unwrap().wait().await;

    assert_eq!(repository.requests("tv"), vec![PageRequest { offset: 0, limit: 10 }]);
    assert!(controller.current_state().model().has_more);

    controller.handle_action(ProductsUiAction::LoadNextPage).unwrap().wait().await;
    assert_eq!(repository.requests("tv").len(), 2);

    controller.handle_action(ProductsUiAction::LoadNextPage).unwrap().wait().await;

    let shown: Vec<usize> = recorder
        .drain()
        .iter()
        .filter(|state| matches!(state, ProductsUiState::ResumedGrid(model) if !model.loading_more))
        .map(|state| state.model().products.len())
        .collect();
    assert_eq!(shown, vec![10, 20, 25]);

    assert_eq!(
        repository.requests("tv"),
        vec![
            PageRequest { offset: 0, limit: 10 },
            PageRequest { offset: 10, limit: 10 },
            PageRequest { offset: 20, limit: 10 },
        ]
    );
    let model = controller.current_state().model().clone();
    assert_eq!(model.total_products, 25);
    assert!(!model.has_more);

    // Past the last page there is nothing left to request
    controller.handle_action(ProductsUiAction::LoadNextPage).unwrap().wait().await;
    assert_eq!(repository.requests("tv").len(), 3);
}

#[tokio::test]
async fn whole_catalog_is_reachable_by_scrolling() {
    let repository = Arc::new(InMemoryProductsRepository::new().with_results("tv", catalog(300)));
    let controller = controller(&repository);

    controller.handle_action(start("tv")).unwrap().wait().await;
    assert_eq!(controller.current_state().model().products.len(), 20);

    while matches!(controller.current_state(), ProductsUiState::ResumedGrid(model) if model.has_more) {
        controller.handle_action(ProductsUiAction::LoadNextPage).unwrap().wait().await;
    }

    let state = controller.current_state();
    assert!(matches!(state, ProductsUiState::ResumedGrid(_)));
    assert_eq!(state.model().products.len(), 300);
    assert_eq!(state.model().products[299].id, "MLB299");
    assert_eq!(repository.requests("tv").len(), 15);
}

#[tokio::test]
async fn prefetch_window_fetches_several_pages_per_demand() {
    let repository = Arc::new(InMemoryProductsRepository::new().with_results("tv", catalog(25)));
    let controller = controller_with_paging(
        &repository,
        PagingConfig::default().with_page_size(5).with_prefetch_pages(2),
    );

    controller.handle_action(start("tv")).unwrap().wait().await;
    assert_eq!(controller.current_state().model().products.len(), 10);
    assert_eq!(repository.requests("tv").len(), 2);

    controller.handle_action(ProductsUiAction::LoadNextPage).unwrap().wait().await;
    assert_eq!(controller.current_state().model().products.len(), 20);
    assert_eq!(repository.requests("tv").len(), 4);
}

#[tokio::test]
async fn empty_result_is_reported() {
    let repository = Arc::new(InMemoryProductsRepository::new());
    let controller = controller(&repository);

    controller.handle_action(start("nothing")).unwrap().wait().await;

    let state = controller.current_state();
    assert!(state.is_empty_result(), "state: {state:?}");
}

#[tokio::test]
async fn new_query_keeps_previous_rows_until_first_page() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("tv", vec![item("1", "Smart TV", 2999.0)])
            .with_results("Motorola", vec![item("123", "Motorola", 1499.0)]),
    );
    let controller = controller(&repository);

    controller.handle_action(start("tv")).unwrap().wait().await;
    let mut recorder = StateRecorder::attach(controller.store());
    controller.handle_action(start("Motorola")).unwrap().wait().await;

    let states = recorder.drain();
    assert_eq!(states.len(), 3, "states: {states:?}");

    assert!(matches!(states[1], ProductsUiState::Loading(_)));
    assert_eq!(states[1].model().searched_term, "Motorola");
    assert_eq!(names(&states[1]), vec!["Smart TV"]);

    assert!(matches!(states[2], ProductsUiState::ResumedGrid(_)));
    assert_eq!(names(&states[2]), vec!["Motorola"]);
}

#[tokio::test]
async fn retry_refetches_last_query() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("Motorola", vec![item("123", "Motorola", 1499.0)])
            .fail_with(|| RepositoryError::transport("No connection")),
    );
    let controller = controller(&repository);

    controller.handle_action(start("Motorola")).unwrap().wait().await;
    assert!(matches!(controller.current_state(), ProductsUiState::NetworkError(_)));

    repository.recover();
    controller.handle_action(ProductsUiAction::Retry).unwrap().wait().await;

    let state = controller.current_state();
    assert!(matches!(state, ProductsUiState::ResumedGrid(_)), "state: {state:?}");
    assert_eq!(names(&state), vec!["Motorola"]);
    assert_eq!(repository.requests("Motorola").len(), 2);
}

// ============================================================================
// Supersession and faults
// ============================================================================

#[tokio::test(start_paused = true)]
async fn later_query_supersedes_running_fetch() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("tv", vec![item("1", "Smart TV", 2999.0)])
            .with_results("Motorola", vec![item("123", "Motorola", 1499.0)])
            .with_latency(Duration::from_millis(100)),
    );
    let controller = controller(&repository);
    let mut recorder = StateRecorder::attach(controller.store());

    let mut first = controller.handle_action(start("tv")).unwrap();
    let mut second = controller.handle_action(start("Motorola")).unwrap();
    first.wait().await;
    second.wait().await;

    let states = recorder.drain();
    assert!(
        states.iter().all(|state| names(state) != vec!["Smart TV"]),
        "superseded fetch published: {states:?}"
    );

    let last = states.last().unwrap();
    assert!(matches!(last, ProductsUiState::ResumedGrid(_)));
    assert_eq!(last.model().searched_term, "Motorola");
    assert_eq!(names(last), vec!["Motorola"]);
}

#[tokio::test(start_paused = true)]
async fn new_query_supersedes_next_page_fetch() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("tv", catalog(30))
            .with_results("Motorola", vec![item("123", "Motorola", 1499.0)])
            .with_latency(Duration::from_millis(100)),
    );
    let controller = controller_with_paging(&repository, PagingConfig::default().with_page_size(10));

    controller.handle_action(start("tv")).unwrap().wait().await;
    let mut more = controller.handle_action(ProductsUiAction::LoadNextPage).unwrap();
    let mut next = controller.handle_action(start("Motorola")).unwrap();
    more.wait().await;
    next.wait().await;

    let state = controller.current_state();
    assert!(matches!(state, ProductsUiState::ResumedGrid(_)), "state: {state:?}");
    assert_eq!(names(&state), vec!["Motorola"]);
    assert!(!state.model().loading_more);
}

#[tokio::test]
async fn unclassified_failure_reaches_fault_handler() {
    let origins = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&origins);
    let config = StoreConfig::default().with_fault_handler(Arc::new(move |fault: &Fault| {
        seen.lock().unwrap().push(fault.origin());
    }));

    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .fail_with(|| RepositoryError::from(anyhow::anyhow!("malformed payload"))),
    );
    let controller = ProductsController::with_config(
        ProductsEnvironment::new(repository, PagingConfig::default()),
        config,
    );
    let mut faults = controller.store().subscribe_faults();

    controller.handle_action(start("Motorola")).unwrap().wait().await;

    assert_eq!(*origins.lock().unwrap(), vec!["products.fetch"]);
    let fault = faults.try_recv().unwrap();
    assert!(fault.error().to_string().contains("malformed payload"));

    // Never rendered as a state
    let state = controller.current_state();
    assert!(matches!(state, ProductsUiState::Loading(_)), "state: {state:?}");
    assert_eq!(state.model().error, None);
}

#[tokio::test]
async fn unclassified_failure_halts_controller_by_default() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("tv", catalog(3))
            .fail_with(|| RepositoryError::from(anyhow::anyhow!("malformed payload"))),
    );
    let controller = controller(&repository);

    controller.handle_action(start("tv")).unwrap().wait().await;

    assert_eq!(controller.store().faulted(), Some("products.fetch"));
    assert_eq!(
        controller.handle_action(ProductsUiAction::Retry).unwrap_err(),
        StoreError::Faulted("products.fetch")
    );
    assert_eq!(repository.requests("tv").len(), 1);
    assert_eq!(controller.current_state().model().error, None);
}

// ============================================================================
// Side effects and observers
// ============================================================================

#[tokio::test]
async fn clicks_emit_side_effects_without_state_change() {
    let repository = Arc::new(InMemoryProductsRepository::new());
    let controller = controller(&repository);
    let mut recorder = StateRecorder::attach(controller.store());
    let mut effects = controller.side_effects();

    controller.handle_action(ProductsUiAction::ClickProduct("123".into())).unwrap();
    controller.handle_action(ProductsUiAction::ClickSearchBar).unwrap();

    assert_eq!(
        effects.drain(),
        vec![
            ProductsUiSideEffect::NavigateToDetail("123".into()),
            ProductsUiSideEffect::BackToSearch,
        ]
    );
    assert_eq!(recorder.drain(), vec![ProductsUiState::default()]);
}

#[tokio::test]
async fn side_effect_is_delivered_once() {
    let repository = Arc::new(InMemoryProductsRepository::new());
    let controller = controller(&repository);
    let mut first = controller.side_effects();

    controller.handle_action(ProductsUiAction::ClickSearchBar).unwrap();

    assert_eq!(first.recv().await, Some(ProductsUiSideEffect::BackToSearch));

    let mut late = controller.side_effects();
    assert_eq!(late.try_recv(), None);
    assert_eq!(first.try_recv(), None);
}

#[tokio::test]
async fn late_observer_sees_latest_state() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("Motorola", vec![item("123", "Motorola", 1499.0)]),
    );
    let controller = controller(&repository);

    controller.handle_action(start("Motorola")).unwrap().wait().await;

    let observer = controller.ui_state();
    let seen = observer.borrow().clone();
    assert_eq!(seen, controller.current_state());
    assert!(matches!(seen, ProductsUiState::ResumedGrid(_)));
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_fetch_and_rejects_intents() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("Motorola", vec![item("123", "Motorola", 1499.0)])
            .with_latency(Duration::from_secs(30)),
    );
    let controller = controller(&repository);

    let mut handle = controller.handle_action(start("Motorola")).unwrap();
    controller.shutdown(Duration::from_secs(1)).await.unwrap();
    handle.wait().await;

    assert!(matches!(controller.current_state(), ProductsUiState::Loading(_)));
    assert_eq!(
        controller.handle_action(ProductsUiAction::Retry).unwrap_err(),
        StoreError::ShutdownInProgress
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_cancels_fetch() {
    let repository = Arc::new(
        InMemoryProductsRepository::new()
            .with_results("Motorola", vec![item("123", "Motorola", 1499.0)])
            .with_latency(Duration::from_secs(30)),
    );
    let controller = controller(&repository);
    let mut state = controller.ui_state();

    let mut handle = controller.handle_action(start("Motorola")).unwrap();
    drop(controller);

    assert!(handle.wait_with_timeout(Duration::from_secs(1)).await.is_ok());
    assert!(matches!(*state.borrow_and_update(), ProductsUiState::Loading(_)));
}
