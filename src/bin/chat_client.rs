//! Chat Relay client - entry point
//!
//! Args: `chat-client <loginid> [host] [port]`. The login id is required;
//! host defaults to localhost and port to 5555. A malformed port argument
//! falls back to the default.

use chat_relay::config::{DEFAULT_HOST, DEFAULT_PORT};
use chat_relay::{ChatClient, ClientConsole};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let identity = match args.next() {
        Some(identity) => identity,
        None => {
            eprintln!("ERROR - No login ID specified. Connection aborted.");
            std::process::exit(1);
        }
    };
    let host = args.next().unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = args
        .next()
        .and_then(|arg| arg.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let client = ChatClient::new(identity, host, port);
    if client.connect().await.is_err() {
        eprintln!("ERROR - Can't setup connection! Terminating client.");
        std::process::exit(1);
    }

    ClientConsole::new(client).run().await;
}
