//! State, actions and side effects of the search screen.

/// Keyboard action offered by the search field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImeAction {
    /// Searching is possible
    Search,
    /// Nothing to search for
    #[default]
    None,
}

/// Snapshot of everything the search screen shows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchUiModel {
    /// Text typed in the search field
    pub product_name: String,
    /// Whether the search affordance is enabled
    pub ime_action: ImeAction,
    /// History entries matching the typed text
    pub products_history: Vec<String>,
}

/// State of the search screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SearchUiState {
    /// History is being loaded
    #[default]
    Loading,
    /// Ready for input
    Resumed(SearchUiModel),
}

impl SearchUiState {
    /// The model shown in the current state, if any
    #[must_use]
    pub const fn model(&self) -> Option<&SearchUiModel> {
        match self {
            Self::Loading => None,
            Self::Resumed(model) => Some(model),
        }
    }
}

/// Store state of the search screen
///
/// Wraps the published [`SearchUiState`] together with the full history it
/// is filtered from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    pub(super) ui: SearchUiState,
    pub(super) original_terms: Vec<String>,
}

impl SearchState {
    /// The state shown by the view
    #[must_use]
    pub const fn ui(&self) -> &SearchUiState {
        &self.ui
    }

    /// The model being edited, or an empty one while loading
    pub(super) fn take_model(&mut self) -> SearchUiModel {
        match std::mem::take(&mut self.ui) {
            SearchUiState::Loading => SearchUiModel::default(),
            SearchUiState::Resumed(model) => model,
        }
    }
}

/// User intents on the search screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchUiAction {
    /// The search field's text changed
    TextChanged(String),
    /// The search affordance was used
    ClickSearch {
        /// Term to search for
        product_name: String,
        /// Whether the device is online
        network_available: bool,
    },
    /// The search field was cleared
    CancelSearch,
}

/// One-shot instructions to the search screen's view
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchUiSideEffect {
    /// Tell the user the device is offline
    ShowToast,
    /// Open the results of a term
    NavigateToProducts(String),
}

/// Everything the search reducer handles
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchAction {
    /// Intent from the view
    View(SearchUiAction),
    /// Start loading the history
    LoadHistory,
    /// The history was loaded
    HistoryLoaded(Vec<String>),
}

impl From<SearchUiAction> for SearchAction {
    fn from(action: SearchUiAction) -> Self {
        Self::View(action)
    }
}
