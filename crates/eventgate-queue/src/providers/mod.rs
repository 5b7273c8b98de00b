//! Queue provider implementations.
//!
//! This module contains concrete implementations of the `QueueProvider`
//! trait for different queue backends. Only an in-memory backend ships
//! today; the trait boundary leaves room for a durable backend later.

pub mod memory;

pub use memory::InMemoryProvider;
