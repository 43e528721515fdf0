//! Ports: interfaces the application layer depends on.
//!
//! Implementations (adapters) live in the infrastructure layer.

pub mod event_relay;
pub mod gateway;
pub mod memory_store;
pub mod progress;
