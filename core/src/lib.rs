//! # Storefront Core
//!
//! Core traits and types for the storefront unidirectional data flow (UDF)
//! architecture.
//!
//! Every screen of the storefront is driven by a reducer: user actions and
//! asynchronous results flow one way into the reducer, which folds them into
//! a single published UI state and describes the side effects the runtime
//! should perform.
//!
//! ## Core Concepts
//!
//! - **State**: The screen's UI state (a tagged variant carrying a model)
//! - **Action**: All inputs to a reducer (user intents and async results)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Event**: One-shot instruction for the view, delivered at most once
//! - **Environment**: Injected dependencies (use cases, configuration)
//!
//! ## Example
//!
//! ```ignore
//! use storefront_core::*;
//!
//! impl Reducer for SearchReducer {
//!     type State = SearchState;
//!     type Action = SearchAction;
//!     type Event = SearchUiSideEffect;
//!     type Environment = SearchEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut SearchState,
//!         action: SearchAction,
//!         env: &SearchEnvironment,
//!     ) -> SmallVec<[Effect<SearchAction, SearchUiSideEffect>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use smallvec::{smallvec, SmallVec};

pub mod fault;

pub use fault::Fault;

/// Reducer module - The core trait for screen logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all presentation logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Effects returned by a single reduction.
    ///
    /// Most actions produce zero to two effects, so four inline slots avoid
    /// heap allocation on the hot path.
    pub type Effects<A, Ev> = SmallVec<[Effect<A, Ev>; 4]>;

    /// The Reducer trait - core abstraction for screen logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The UI state this reducer folds actions into
    /// - `Action`: The action type this reducer processes
    /// - `Event`: One-shot side effects emitted towards the view
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for ProductsReducer {
    ///     type State = ProductsUiState;
    ///     type Action = ProductsAction;
    ///     type Event = ProductsUiSideEffect;
    ///     type Environment = ProductsEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut ProductsUiState,
    ///         action: ProductsAction,
    ///         env: &ProductsEnvironment,
    ///     ) -> Effects<ProductsAction, ProductsUiSideEffect> {
    ///         match action {
    ///             ProductsAction::View(ProductsUiAction::ClickSearchBar) => {
    ///                 smallvec![Effect::Emit(ProductsUiSideEffect::BackToSearch)]
    ///             }
    ///             _ => smallvec![],
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The one-shot event type this reducer emits
        type Event;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Replaces or updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// The effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Action, Self::Event>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use crate::fault::Fault;
    use futures::Stream;
    use std::borrow::Cow;
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Boxed future producing an optional feedback action
    pub type EffectFuture<A> = Pin<Box<dyn Future<Output = Option<A>> + Send>>;

    /// Boxed stream of feedback actions
    ///
    /// The first `Err` terminates the stream and is reported as a [`Fault`].
    pub type EffectStream<A> = Pin<Box<dyn Stream<Item = Result<A, Fault>> + Send>>;

    /// Identifier for cancellable effects
    ///
    /// Starting an effect with an id that is already in flight cancels the
    /// older effect first (last request wins).
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct EffectId(Cow<'static, str>);

    impl EffectId {
        /// Create an id from a static name
        #[must_use]
        pub const fn new(name: &'static str) -> Self {
            Self(Cow::Borrowed(name))
        }

        /// Create an id from a runtime string
        #[must_use]
        pub fn owned(name: impl Into<String>) -> Self {
            Self(Cow::Owned(name.into()))
        }

        /// Get the id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    /// - `Event`: The one-shot event type delivered to the view
    pub enum Effect<Action, Event = ()> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action, Event>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action, Event>>),

        /// Delayed action (for timeouts, debouncing)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(EffectFuture<Action>),

        /// Long-running stream of feedback actions
        ///
        /// Every `Ok` item is fed back into the reducer in order. With an id,
        /// the stream replaces any in-flight effect registered under that id
        /// and stops feeding actions as soon as it is cancelled.
        Stream {
            /// Cancellation id, if the stream may be superseded
            id: Option<EffectId>,
            /// The stream to drive
            stream: EffectStream<Action>,
        },

        /// Cancel the in-flight effect registered under this id
        Cancel(EffectId),

        /// Deliver a one-shot event to the view
        Emit(Event),
    }

    // Manual Debug implementation since Future and Stream don't implement Debug
    impl<Action, Event> fmt::Debug for Effect<Action, Event>
    where
        Action: fmt::Debug,
        Event: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Stream { id, .. } => f
                    .debug_struct("Effect::Stream")
                    .field("id", id)
                    .finish_non_exhaustive(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
                Effect::Emit(event) => f.debug_tuple("Effect::Emit").field(event).finish(),
            }
        }
    }

    impl<Action, Event> Effect<Action, Event> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action, Event>>) -> Effect<Action, Event> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action, Event>>) -> Effect<Action, Event> {
            Effect::Sequential(effects)
        }

        /// Wrap a future as an effect
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Wrap a stream as a cancellable effect that replaces any in-flight
        /// effect with the same id
        pub fn cancellable_stream<S>(id: EffectId, stream: S) -> Self
        where
            S: Stream<Item = Result<Action, Fault>> + Send + 'static,
        {
            Effect::Stream {
                id: Some(id),
                stream: Box::pin(stream),
            }
        }

        /// Returns the event carried by an `Emit` effect
        #[must_use]
        pub const fn as_event(&self) -> Option<&Event> {
            match self {
                Effect::Emit(event) => Some(event),
                _ => None,
            }
        }
    }
}

pub use effect::{Effect, EffectId};
pub use reducer::{Effects, Reducer};
