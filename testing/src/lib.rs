//! # Storefront Testing
//!
//! Testing utilities and helpers for the storefront UDF architecture.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then testing of reducers without a runtime
//! - [`assertions`]: Assertion helpers for reducer effects
//! - [`StateRecorder`]: Captures every state a store publishes
//! - [`init_test_tracing`]: Opt-in log output for failing tests
//!
//! ## Example
//!
//! ```ignore
//! use storefront_testing::StateRecorder;
//!
//! #[tokio::test]
//! async fn start_shows_loading_then_grid() {
//!     let controller = ProductsController::new(env);
//!     let mut recorder = StateRecorder::attach(controller.store());
//!
//!     controller.handle_action(ProductsUiAction::StartScreen("tv".into()))?
//!         .wait()
//!         .await;
//!
//!     assert_eq!(recorder.drain().len(), 3);
//! }
//! ```

/// Reducer test harness and effect assertions
pub mod reducer_test;

/// State recording for store-level tests
pub mod recorder;

pub use recorder::StateRecorder;
pub use reducer_test::{ReducerTest, assertions};

/// Install a `tracing` subscriber for tests
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
