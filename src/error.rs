//! Error types
//!
//! Domain-specific error types for the handshake, the server control surface,
//! and the client session.

use std::fmt;
use std::io;

/// Login handshake failures. Each of these terminates the offending
/// connection after one explanatory message; none of them crash the server.
#[derive(Debug)]
pub enum HandshakeError {
    EmptyIdentity,
    AlreadyAuthenticated,
    IdentityTaken(String),
    UnknownConnection,
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::EmptyIdentity => write!(f, "login requires a non-empty id"),
            HandshakeError::AlreadyAuthenticated => {
                write!(f, "connection is already logged in")
            }
            HandshakeError::IdentityTaken(id) => {
                write!(f, "login id '{}' is already in use", id)
            }
            HandshakeError::UnknownConnection => write!(f, "connection is not registered"),
        }
    }
}

impl std::error::Error for HandshakeError {}

/// Server control surface errors.
#[derive(Debug)]
pub enum ServerError {
    AlreadyListening,
    PortChangeWhileListening,
    Bind(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::AlreadyListening => write!(f, "server is already listening"),
            ServerError::PortChangeWhileListening => {
                write!(f, "port can only be changed while the server is idle")
            }
            ServerError::Bind(e) => write!(f, "failed to bind listener: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::Bind(error)
    }
}

/// Client session errors.
#[derive(Debug)]
pub enum ClientError {
    AlreadyConnected,
    NotConnected,
    Connect(io::Error),
    Send(io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::AlreadyConnected => write!(f, "already connected"),
            ClientError::NotConnected => write!(f, "not connected"),
            ClientError::Connect(e) => write!(f, "could not connect: {}", e),
            ClientError::Send(e) => write!(f, "could not send: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}
