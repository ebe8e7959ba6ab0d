//! Client side: session state machine, connection handling, user console.

pub mod console;
pub mod core;
pub mod session;

pub use console::ClientConsole;
pub use core::ChatClient;
pub use session::{ClientSession, DisconnectOutcome, SessionState};
