//! Product grid screen: results of one query, paged in as they arrive.

pub mod controller;
pub mod mapper;
pub mod reducer;
pub mod udf;

pub use controller::{ProductsController, ProductsStore};
pub use reducer::{FETCH, ProductsEnvironment, ProductsReducer};
pub use udf::{
    FREE_SHIPPING_LABEL, ProductUi, ProductsAction, ProductsPage, ProductsUiAction,
    ProductsUiModel, ProductsUiSideEffect, ProductsUiState,
};
