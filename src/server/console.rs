//! Server operator console
//!
//! Line loop over stdin: `#`-commands drive the control surface, anything
//! else is broadcast to all connections as an operator message.

use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::ServerError;
use crate::protocol::ServerCommand;
use crate::server::ChatServer;

pub struct ServerConsole {
    server: ChatServer,
}

impl ServerConsole {
    pub fn new(server: ChatServer) -> Self {
        Self { server }
    }

    /// Run until stdin closes or the operator issues `#quit`.
    pub async fn run(&self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.dispatch(line).await;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Error reading from server console: {}", e);
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, line: &str) {
        match ServerCommand::parse(line) {
            ServerCommand::Broadcast(text) => {
                self.server.broadcast_server_message(&text).await;
            }
            ServerCommand::Quit => {
                self.server.close().await;
                std::process::exit(0);
            }
            ServerCommand::Stop => {
                if self.server.stop().await {
                    println!("Server has stopped listening for connections.");
                } else {
                    println!("Server is not listening.");
                }
            }
            ServerCommand::Start => match self.server.start().await {
                Ok(()) => {
                    println!(
                        "Server listening for connections on port {}",
                        self.server.port().await
                    );
                }
                Err(ServerError::AlreadyListening) => println!("Server is already listening."),
                Err(e) => println!("ERROR - Could not listen for clients! ({})", e),
            },
            ServerCommand::Close => {
                self.server.close().await;
                println!("Server closed; all clients disconnected.");
            }
            ServerCommand::SetPort(arg) => match arg.parse::<u16>() {
                Ok(port) => match self.server.set_port(port).await {
                    Ok(()) => println!("Port set to: {}", port),
                    Err(e) => println!("Error: {}", e),
                },
                Err(_) => println!("Usage: #setport <port>"),
            },
            ServerCommand::GetPort => {
                println!("Current port: {}", self.server.port().await);
            }
            ServerCommand::Unknown(cmd) => println!("Unknown command: {}", cmd),
        }
    }
}
