//! Wire and console command protocol
//!
//! All commands are line-oriented, case-insensitive, and `#`-prefixed; any
//! other line is chat payload.

pub mod parser;

pub use parser::{ClientCommand, ServerCommand, WireCommand};
