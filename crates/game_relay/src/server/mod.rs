//! Server module: the accept loop and per-connection WebSocket handling.

pub mod core;
pub mod handlers;

pub use core::RelayServer;
