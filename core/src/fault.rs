//! Faults: failures that must not be turned into UI state.
//!
//! A fault is a programming-level failure raised from an effect (for example
//! an error kind the screen does not know how to present). The runtime never
//! feeds a fault back into the reducer; it terminates the effect and hands
//! the fault to the store's fault handler.

use std::fmt;
use thiserror::Error;

/// An unrecoverable failure raised by an effect.
#[derive(Error, Debug)]
#[error("fault in {origin}: {source}")]
pub struct Fault {
    origin: &'static str,
    #[source]
    source: anyhow::Error,
}

impl Fault {
    /// Create a fault from any error.
    ///
    /// `origin` names the pipeline the fault escaped from (e.g. `"products.fetch"`).
    pub fn new<E>(origin: &'static str, error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self {
            origin,
            source: error.into(),
        }
    }

    /// The pipeline the fault escaped from.
    #[must_use]
    pub const fn origin(&self) -> &'static str {
        self.origin
    }

    /// The underlying error.
    #[must_use]
    pub const fn error(&self) -> &anyhow::Error {
        &self.source
    }

    /// Attempt to downcast the underlying error to a concrete type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.source.downcast_ref::<E>()
    }
}
