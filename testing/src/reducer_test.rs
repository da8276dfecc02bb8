//! Given-When-Then harness for reducers.
//!
//! Reducers are pure, so most screen logic can be tested without a store or
//! a runtime: set a state, reduce one or more actions, then assert on the
//! resulting state and on the effects the last action asked for.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use storefront_core::effect::Effect;
use storefront_core::reducer::{Effects, Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectsCheck<A, Ev> = Box<dyn FnOnce(&[Effect<A, Ev>])>;

/// Builder-style reducer test
///
/// # Example
///
/// ```ignore
/// use storefront_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(SearchReducer)
///     .with_env(test_environment())
///     .given_state(SearchState::default())
///     .when_action(SearchUiAction::TextChanged("tv".into()).into())
///     .then_state(|state| {
///         assert_eq!(state.ui().model().unwrap().product_name, "tv");
///     })
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, Ev, E>
where
    R: Reducer<State = S, Action = A, Event = Ev, Environment = E>,
{
    reducer: R,
    env: Option<E>,
    given: Option<S>,
    actions: Vec<A>,
    state_checks: Vec<StateCheck<S>>,
    effect_checks: Vec<EffectsCheck<A, Ev>>,
}

impl<R, S, A, Ev, E> ReducerTest<R, S, A, Ev, E>
where
    R: Reducer<State = S, Action = A, Event = Ev, Environment = E>,
{
    /// Start a test of `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            given: None,
            actions: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment passed to every reduction
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.env = Some(env);
        self
    }

    /// Given: the state before the first action
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.given = Some(state);
        self
    }

    /// When: reduce `action`
    ///
    /// Actions are reduced in the order they were added; effect checks only
    /// see the effects of the last one.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Then: check the final state
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Then: check the effects of the last action
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<A, Ev>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Reduce every action and run the checks
    ///
    /// # Panics
    ///
    /// Panics if the state, the environment or an action is missing, or if
    /// a check fails.
    #[allow(clippy::panic)] // Test helper
    pub fn run(self) {
        let Some(mut state) = self.given else {
            panic!("given_state() was not called");
        };
        let Some(env) = self.env else {
            panic!("with_env() was not called");
        };
        assert!(!self.actions.is_empty(), "when_action() was not called");

        let mut effects = Effects::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env);
        }

        for check in self.state_checks {
            check(&state);
        }
        for check in self.effect_checks {
            check(&effects);
        }
    }
}

/// Checks for the effects a reducer returns
pub mod assertions {
    use std::fmt::Debug;
    use storefront_core::effect::{Effect, EffectId};

    /// Assert that nothing but `Effect::None` was returned
    ///
    /// # Panics
    ///
    /// Panics if any real effect is present.
    #[allow(clippy::panic)] // Test helper
    pub fn assert_no_effects<A: Debug, Ev: Debug>(effects: &[Effect<A, Ev>]) {
        assert!(
            effects.iter().all(|effect| matches!(effect, Effect::None)),
            "expected no effects, got {effects:?}"
        );
    }

    /// Assert how many effects were returned
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    #[allow(clippy::panic)] // Test helper
    pub fn assert_effects_count<A, Ev>(effects: &[Effect<A, Ev>], expected: usize) {
        assert_eq!(effects.len(), expected, "unexpected number of effects");
    }

    /// Assert that some background future was started
    ///
    /// # Panics
    ///
    /// Panics if no `Effect::Future` is present.
    #[allow(clippy::panic)] // Test helper
    pub fn assert_has_future_effect<A, Ev>(effects: &[Effect<A, Ev>]) {
        assert!(
            effects.iter().any(|effect| matches!(effect, Effect::Future(_))),
            "expected a future effect"
        );
    }

    /// Assert that a stream registered under `id` was started
    ///
    /// # Panics
    ///
    /// Panics if no such `Effect::Stream` is present.
    #[allow(clippy::panic)] // Test helper
    pub fn assert_has_stream_effect<A, Ev>(effects: &[Effect<A, Ev>], id: &EffectId) {
        assert!(
            effects
                .iter()
                .any(|effect| matches!(effect, Effect::Stream { id: Some(found), .. } if found == id)),
            "expected a stream effect registered as `{id}`"
        );
    }

    /// Events of the `Emit` effects, in order
    #[must_use]
    pub fn emitted_events<A, Ev: Clone>(effects: &[Effect<A, Ev>]) -> Vec<Ev> {
        effects.iter().filter_map(Effect::as_event).cloned().collect()
    }

    /// Assert the exact events emitted, in order
    ///
    /// # Panics
    ///
    /// Panics if the emitted events differ.
    #[allow(clippy::panic)] // Test helper
    pub fn assert_emits<A, Ev>(effects: &[Effect<A, Ev>], expected: &[Ev])
    where
        Ev: Clone + PartialEq + Debug,
    {
        assert_eq!(emitted_events(effects), expected, "unexpected emitted events");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::effect::EffectId;
    use storefront_core::smallvec;

    /// Search box that suggests while typing
    #[derive(Clone, Debug, Default)]
    struct Draft {
        text: String,
        submitted: Vec<String>,
    }

    #[derive(Clone, Debug)]
    enum DraftAction {
        Type(char),
        Clear,
        Submit,
        Suggest,
    }

    struct DraftReducer;

    const SUGGEST: EffectId = EffectId::new("draft.suggest");

    impl Reducer for DraftReducer {
        type State = Draft;
        type Action = DraftAction;
        type Event = String;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Draft,
            action: DraftAction,
            _env: &(),
        ) -> Effects<DraftAction, String> {
            match action {
                DraftAction::Type(c) => {
                    state.text.push(c);
                    smallvec![Effect::None]
                },
                DraftAction::Clear => {
                    state.text.clear();
                    smallvec![]
                },
                DraftAction::Submit => {
                    state.submitted.push(state.text.clone());
                    smallvec![Effect::Emit(state.text.clone())]
                },
                DraftAction::Suggest => smallvec![
                    Effect::cancellable_stream(SUGGEST, futures::stream::empty()),
                    Effect::future(async { None }),
                ],
            }
        }
    }

    #[test]
    fn actions_fold_in_order() {
        ReducerTest::new(DraftReducer)
            .with_env(())
            .given_state(Draft::default())
            .when_action(DraftAction::Type('t'))
            .when_action(DraftAction::Type('v'))
            .then_state(|draft| assert_eq!(draft.text, "tv"))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn effect_checks_see_last_action_only() {
        ReducerTest::new(DraftReducer)
            .with_env(())
            .given_state(Draft {
                text: "radio".into(),
                ..Draft::default()
            })
            .when_action(DraftAction::Submit)
            .when_action(DraftAction::Clear)
            .when_action(DraftAction::Type('x'))
            .when_action(DraftAction::Submit)
            .then_state(|draft| assert_eq!(draft.submitted, vec!["radio", "x"]))
            .then_effects(|effects| assertions::assert_emits(effects, &["x".to_string()]))
            .run();
    }

    #[test]
    fn background_work_is_detected() {
        ReducerTest::new(DraftReducer)
            .with_env(())
            .given_state(Draft::default())
            .when_action(DraftAction::Suggest)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_stream_effect(effects, &SUGGEST);
                assertions::assert_has_future_effect(effects);
                assert!(assertions::emitted_events(effects).is_empty());
            })
            .run();
    }

    #[test]
    fn empty_effects_count_as_none() {
        assertions::assert_no_effects::<DraftAction, String>(&[]);
        assertions::assert_no_effects::<DraftAction, String>(&[Effect::None, Effect::None]);
    }

    #[test]
    #[should_panic(expected = "given_state() was not called")]
    fn missing_state_is_reported() {
        ReducerTest::new(DraftReducer)
            .with_env(())
            .when_action(DraftAction::Clear)
            .run();
    }
}
