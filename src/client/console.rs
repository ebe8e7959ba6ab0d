//! Client user console
//!
//! Line loop over stdin: `#`-commands drive the session lifecycle, anything
//! else is sent to the server as chat. Command misuse is reported inline and
//! changes nothing.

use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::ChatClient;
use crate::error::ClientError;
use crate::protocol::ClientCommand;

pub struct ClientConsole {
    client: ChatClient,
}

impl ClientConsole {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// Run until stdin closes or the user issues `#quit`.
    pub async fn run(&self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.dispatch(&line).await;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Error reading from console: {}", e);
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, line: &str) {
        match ClientCommand::parse(line) {
            ClientCommand::Chat(message) => match self.client.send(&message).await {
                Ok(()) => {}
                Err(ClientError::NotConnected) => {
                    println!("Not connected. Use #login to reconnect.");
                }
                Err(_) => {
                    println!("Could not send message to server. Terminating client.");
                    self.client.quit().await;
                }
            },
            ClientCommand::Quit => self.client.quit().await,
            ClientCommand::Logoff => {
                if self.client.logoff().await.is_err() {
                    println!("Not connected.");
                }
            }
            ClientCommand::Login => {
                if self.client.is_connected().await {
                    println!("Already connected.");
                } else if self.client.connect().await.is_err() {
                    println!("Cannot connect to server.");
                }
            }
            ClientCommand::GetHost => println!("Current host: {}", self.client.host().await),
            ClientCommand::GetPort => println!("Current port: {}", self.client.port().await),
            ClientCommand::SetHost(host) => {
                if self.client.set_host(host).await.is_err() {
                    println!("Cannot change host while connected.");
                }
            }
            ClientCommand::SetPort(arg) => match arg.parse::<u16>() {
                Ok(port) => {
                    if self.client.set_port(port).await.is_err() {
                        println!("Cannot change port while connected.");
                    }
                }
                Err(_) => println!("Usage: #setport <port>"),
            },
            ClientCommand::Unknown(cmd) => println!("Unknown command: {}", cmd),
        }
    }
}
