//! Server side: registry, router, connection lifecycle, control surface.

pub mod console;
pub mod core;
pub(crate) mod connection;
pub mod registry;
pub mod router;

pub use console::ServerConsole;
pub use core::ChatServer;
