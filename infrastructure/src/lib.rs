//! Infrastructure layer for reader-panel
//!
//! Concrete adapters behind the application layer's ports: the HTTP
//! inference gateway, the in-memory reader-memory store, and the
//! configuration loader.

pub mod config;
pub mod gateway;
pub mod memory;

pub use config::{ConfigLoader, FocusGroupConfig, GatewayConfig, PanelConfig, ReaderConfig};
pub use gateway::HttpInferenceGateway;
pub use memory::InMemoryMemoryStore;
