//! Search screen: term entry over a filterable search history.

pub mod controller;
pub mod reducer;
pub mod udf;

pub use controller::{SearchController, SearchStore, SearchUiStateReceiver};
pub use reducer::{SearchEnvironment, SearchReducer, filter_terms};
pub use udf::{
    ImeAction, SearchAction, SearchState, SearchUiAction, SearchUiModel, SearchUiSideEffect,
    SearchUiState,
};
