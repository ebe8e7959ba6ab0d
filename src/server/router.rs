//! Message router
//!
//! Formats chat and operator messages and fans them out through the registry.
//! Callers hold the registry lock across a call, which serializes one
//! message's fan-out against another's; the per-connection sends themselves
//! are non-blocking, so a slow connection only delays itself.

use crate::server::registry::Registry;

/// Prefix for operator broadcasts and lifecycle notices sent to clients.
pub const SERVER_PREFIX: &str = "SERVER MESSAGE>";

/// Relay a chat line from an authenticated sender to every authenticated
/// connection, sender included. The echo doubles as delivery confirmation.
pub fn broadcast_chat(registry: &Registry, identity: &str, message: &str) {
    registry.send_to_authenticated(&format_chat(identity, message));
}

/// Send operator free text to every connection. The operator is implicitly
/// trusted and never authenticates.
pub fn broadcast_server_message(registry: &Registry, text: &str) {
    registry.send_to_all(&format!("{SERVER_PREFIX} {text}"));
}

pub fn format_chat(identity: &str, message: &str) -> String {
    format!("{identity}> {message}")
}
