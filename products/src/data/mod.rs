//! Repository implementations.

pub mod memory;
