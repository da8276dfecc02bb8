//! Recording of published UI states.
//!
//! Screen tests usually assert on the whole sequence of states a screen went
//! through (e.g. `[Loading, ResumedGrid]`), not just the final one.
//! [`StateRecorder`] captures that sequence from a store's transition feed.

use std::time::Duration;
use storefront_core::reducer::Reducer;
use storefront_runtime::Store;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Records every state a store publishes, starting with the current one
///
/// # Example
///
/// ```ignore
/// let mut recorder = StateRecorder::attach(&store);
/// store.send(action)?.wait().await;
///
/// assert_eq!(recorder.drain().len(), 3);
/// ```
#[derive(Debug)]
pub struct StateRecorder<S> {
    recorded: Vec<S>,
    rx: broadcast::Receiver<S>,
}

impl<S: Clone> StateRecorder<S> {
    /// Start recording from the store's current state
    #[must_use]
    pub fn attach<A, E, R>(store: &Store<S, A, E, R>) -> Self
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        R::Event: Send + 'static,
        A: Send + 'static,
        S: PartialEq + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let (current, rx) = store.transitions();
        Self {
            recorded: vec![current],
            rx,
        }
    }

    /// Collect every transition published so far
    ///
    /// # Panics
    ///
    /// Panics if the recorder fell behind the store's transition buffer.
    #[allow(clippy::panic)] // Test helper
    pub fn collect(&mut self) -> &[S] {
        loop {
            match self.rx.try_recv() {
                Ok(state) => self.recorded.push(state),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    panic!("State recorder missed {missed} transitions")
                },
            }
        }
        &self.recorded
    }

    /// Collect, then take every state recorded so far
    pub fn drain(&mut self) -> Vec<S> {
        self.collect();
        std::mem::take(&mut self.recorded)
    }

    /// Wait until `count` states have been recorded in total
    ///
    /// # Panics
    ///
    /// Panics if `timeout` elapses first.
    #[allow(clippy::panic)] // Test helper
    pub async fn wait_for(&mut self, count: usize, timeout: Duration) -> &[S] {
        let deadline = tokio::time::Instant::now() + timeout;
        self.collect();

        while self.recorded.len() < count {
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Ok(state)) => self.recorded.push(state),
                Ok(Err(error)) => panic!("State recorder stopped: {error}"),
                Err(_) => panic!(
                    "Timed out waiting for {count} states, recorded {}",
                    self.recorded.len()
                ),
            }
        }
        &self.recorded
    }
}
