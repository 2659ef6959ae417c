//! WebSocket push channel for chain tip notifications.

pub mod handler;
pub mod registry;

pub use handler::serve_connection;
pub use registry::{ConnectionRegistry, RegistryError};
