//! Screen state machines.

pub mod error;
pub mod products;
pub mod search;
