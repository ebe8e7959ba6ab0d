//! Client session state machine
//!
//! Pure state, no sockets. The point of this type is the "why was this
//! connection closed" question: a user-initiated logoff, a user-initiated
//! quit, and a server-side shutdown all surface as the same disconnect
//! signal, so the intent is recorded here *before* the close is issued and
//! read back synchronously when the signal arrives.

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Open,
    LoggingOff,
    /// Terminal; suppresses all further status output.
    Quitting,
}

/// What the disconnect handler should do, derived from the recorded intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// User quit: terminate without any notice.
    ExitSilently,
    /// User logged off: print a neutral notice and stay alive for `#login`.
    StayAlive,
    /// Server went away: print the shutdown notice and terminate.
    ExitWithNotice,
}

/// Per-client view of the connection. The identity is fixed at process start
/// and survives logoff/login cycles.
#[derive(Debug)]
pub struct ClientSession {
    identity: String,
    host: String,
    port: u16,
    state: SessionState,
}

impl ClientSession {
    pub fn new(identity: String, host: String, port: u16) -> Self {
        Self {
            identity,
            host,
            port,
            state: SessionState::Disconnected,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            self.state,
            SessionState::Connecting | SessionState::Authenticating | SessionState::Open
        )
    }

    /// Start opening a connection. Valid only while disconnected.
    pub fn begin_connect(&mut self) -> Result<(), ClientError> {
        if self.state != SessionState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        self.state = SessionState::Connecting;
        Ok(())
    }

    /// The transport reports the connection established; the caller sends the
    /// login handshake next.
    pub fn on_connected(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Authenticating;
        }
    }

    /// A connect attempt failed before the transport came up.
    pub fn on_connect_failed(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Disconnected;
        }
    }

    /// First server response doubles as the handshake acknowledgement.
    pub fn on_server_message(&mut self) {
        if self.state == SessionState::Authenticating {
            self.state = SessionState::Open;
        }
    }

    /// Record logoff intent. The caller closes the connection afterwards.
    pub fn begin_logoff(&mut self) -> Result<(), ClientError> {
        match self.state {
            SessionState::Authenticating | SessionState::Open => {
                self.state = SessionState::LoggingOff;
                Ok(())
            }
            _ => Err(ClientError::NotConnected),
        }
    }

    /// Record quit intent. Terminal from any state.
    pub fn begin_quit(&mut self) {
        self.state = SessionState::Quitting;
    }

    /// The transport reports the connection closed (gracefully or not).
    pub fn on_disconnect(&mut self) -> DisconnectOutcome {
        match self.state {
            SessionState::Quitting => DisconnectOutcome::ExitSilently,
            SessionState::LoggingOff => {
                self.state = SessionState::Disconnected;
                DisconnectOutcome::StayAlive
            }
            _ => {
                self.state = SessionState::Disconnected;
                DisconnectOutcome::ExitWithNotice
            }
        }
    }

    /// Retarget the client. Only while disconnected.
    pub fn set_host(&mut self, host: String) -> Result<(), ClientError> {
        if self.state != SessionState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ClientError> {
        if self.state != SessionState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        self.port = port;
        Ok(())
    }
}
