//! # Storefront Products
//!
//! Product search feature of the storefront: a search screen over the user's
//! term history and a paged product grid for a query.
//!
//! Each screen is a reducer run by a [`Store`](storefront_runtime::Store)
//! and wrapped in a controller exposing the three things a view needs:
//!
//! - `handle_action(ui_action)`: dispatch a user intent
//! - `ui_state()`: the current state, redelivered to every observer
//! - `side_effects()`: one-shot instructions, delivered once
//!
//! ## Example
//!
//! ```ignore
//! use storefront_products::presentation::products::{ProductsController, ProductsUiAction};
//!
//! let controller = ProductsController::new(env);
//! let mut state = controller.ui_state();
//!
//! controller.handle_action(ProductsUiAction::StartScreen("Motorola".into()))?;
//!
//! while state.changed().await.is_ok() {
//!     render(&state.borrow_and_update());
//! }
//! ```

pub mod config;
pub mod data;
pub mod domain;
pub mod presentation;

pub use config::{HistoryConfig, PagingConfig};
pub use presentation::products::{ProductsController, ProductsEnvironment};
pub use presentation::search::{SearchController, SearchEnvironment};
