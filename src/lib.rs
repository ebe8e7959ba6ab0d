//! Chat Relay
//!
//! A minimal multi-client chat service: a TCP server that requires a one-time
//! `#login <id>` handshake per connection and relays every subsequent chat
//! line to all authenticated connections, plus the matching line-console
//! client. Both sides are driven by `#`-prefixed commands.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::{ChatClient, ClientConsole};
pub use config::ChatConfig;
pub use server::{ChatServer, ServerConsole};
