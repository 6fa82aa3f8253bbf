//! Connection management for client connections.
//!
//! This module holds the per-connection handle with its outbound queue and
//! the registry mapping open connections to their player IDs.

pub mod client;
pub mod registry;

pub use client::{ClientConnection, OutboundReceiver, OutboundSender};
pub use registry::{ConnectionRegistry, RegistryEntry};
