//! # EventGate Queue
//!
//! The Durable Queue backing the Workflow Runner (spec §4.2): a batched,
//! FIFO-ish in-process queue with per-message visibility timeout and bounded
//! redelivery. Batches of up to ~100 messages are handed to the workflow
//! runner's handler; a message whose handler reports failure becomes visible
//! again after an exponential backoff, and a message that exhausts its
//! redelivery budget moves to the provider's dead-letter queue.
//!
//! ## Module Organization
//!
//! - [error] - Error types for all queue operations
//! - [message] - Message structures and receipt handles
//! - [provider] - Provider types and configuration
//! - [client] - Client traits and implementations
//! - [providers] - Concrete `QueueProvider` implementations

// Module declarations
pub mod client;
pub mod error;
pub mod message;
pub mod provider;
pub mod providers;

// Re-export commonly used types at crate root for convenience
pub use client::{QueueClient, QueueClientFactory, QueueProvider, StandardQueueClient};
pub use error::{ConfigurationError, QueueError, SerializationError, ValidationError};
pub use message::{
    Message, MessageId, QueueName, ReceiveOptions, ReceivedMessage, ReceiptHandle, SendOptions,
};
pub use provider::{InMemoryConfig, ProviderConfig, ProviderType, QueueConfig};
pub use providers::InMemoryProvider;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
