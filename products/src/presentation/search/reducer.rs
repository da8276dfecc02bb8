//! Reducer of the search screen.

use super::udf::{
    ImeAction, SearchAction, SearchState, SearchUiAction, SearchUiModel, SearchUiSideEffect,
    SearchUiState,
};
use crate::config::HistoryConfig;
use crate::domain::error::RepositoryError;
use crate::domain::repository::TermsRepository;
use crate::domain::usecase::{GetTermsHistoryUseCase, SaveTermUseCase};
use std::sync::Arc;
use storefront_core::effect::Effect;
use storefront_core::reducer::{Effects, Reducer};
use storefront_core::smallvec;
use storefront_runtime::retry::retry_with_predicate;

/// Dependencies of the search screen
#[derive(Clone)]
pub struct SearchEnvironment {
    /// History lookup
    pub get_history: GetTermsHistoryUseCase,
    /// History recording
    pub save_term: SaveTermUseCase,
    /// History loading behaviour
    pub history: HistoryConfig,
}

impl SearchEnvironment {
    /// Environment over a terms repository
    #[must_use]
    pub fn new(repository: Arc<dyn TermsRepository>, history: HistoryConfig) -> Self {
        Self {
            get_history: GetTermsHistoryUseCase::new(Arc::clone(&repository)),
            save_term: SaveTermUseCase::new(repository),
            history,
        }
    }
}

/// Reducer for [`SearchState`]
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchReducer;

impl Reducer for SearchReducer {
    type State = SearchState;
    type Action = SearchAction;
    type Event = SearchUiSideEffect;
    type Environment = SearchEnvironment;

    fn reduce(
        &self,
        state: &mut SearchState,
        action: SearchAction,
        env: &SearchEnvironment,
    ) -> Effects<SearchAction, SearchUiSideEffect> {
        match action {
            SearchAction::LoadHistory => {
                state.ui = SearchUiState::Loading;
                smallvec![load_history(env)]
            },
            SearchAction::HistoryLoaded(terms) => {
                let mut model = state.take_model();
                model.products_history = filter_terms(&terms, &model.product_name);
                state.original_terms = terms;
                state.ui = SearchUiState::Resumed(model);
                smallvec![]
            },
            SearchAction::View(SearchUiAction::TextChanged(text)) => {
                state.ui = SearchUiState::Resumed(SearchUiModel {
                    products_history: filter_terms(&state.original_terms, &text),
                    ime_action: ime_action_for(&text),
                    product_name: text,
                });
                smallvec![]
            },
            SearchAction::View(SearchUiAction::ClickSearch {
                product_name,
                network_available,
            }) => {
                if !network_available {
                    return smallvec![Effect::Emit(SearchUiSideEffect::ShowToast)];
                }

                let mut effects = Effects::new();
                if !product_name.is_empty() {
                    effects.push(save_term(env, product_name.clone()));
                }
                effects.push(Effect::Emit(SearchUiSideEffect::NavigateToProducts(product_name)));
                effects
            },
            SearchAction::View(SearchUiAction::CancelSearch) => {
                state.ui = SearchUiState::Resumed(SearchUiModel {
                    product_name: String::new(),
                    ime_action: ImeAction::None,
                    products_history: state.original_terms.clone(),
                });
                smallvec![]
            },
        }
    }
}

/// History entries containing `text`, ignoring case, in their original order
#[must_use]
pub fn filter_terms(terms: &[String], text: &str) -> Vec<String> {
    if text.is_empty() {
        return terms.to_vec();
    }

    let needle = text.to_lowercase();
    terms
        .iter()
        .filter(|term| term.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

fn ime_action_for(text: &str) -> ImeAction {
    if text.is_empty() {
        ImeAction::None
    } else {
        ImeAction::Search
    }
}

/// Load the history, retrying transient failures
fn load_history(env: &SearchEnvironment) -> Effect<SearchAction, SearchUiSideEffect> {
    let use_case = env.get_history.clone();
    let config = env.history.clone();

    Effect::future(async move {
        let result = retry_with_predicate(
            &config.retry,
            || use_case.history(),
            RepositoryError::is_transient,
        )
        .await;

        match result {
            Ok(terms) => Some(SearchAction::HistoryLoaded(terms)),
            Err(error) if config.fallback_to_empty => {
                tracing::warn!(%error, "Search history unavailable, showing empty history");
                Some(SearchAction::HistoryLoaded(Vec::new()))
            },
            Err(error) => {
                tracing::error!(%error, "Search history unavailable");
                None
            },
        }
    })
}

/// Record a searched term; failures are logged and otherwise ignored
fn save_term(env: &SearchEnvironment, term: String) -> Effect<SearchAction, SearchUiSideEffect> {
    let use_case = env.save_term.clone();

    Effect::future(async move {
        if let Err(error) = use_case.save(term.as_str()).await {
            tracing::warn!(%error, term = %term, "Failed to save search term");
        }
        None
    })
}
