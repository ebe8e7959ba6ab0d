//! Chat Relay server - entry point

use log::info;

use chat_relay::{ChatConfig, ChatServer, ServerConsole};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = match ChatConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR - Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Optional positional port argument overrides the configured port; a
    // malformed value falls back silently, matching the client's contract.
    if let Some(arg) = std::env::args().nth(1) {
        if let Ok(port) = arg.parse::<u16>() {
            config.port = port;
        }
    }

    info!("Launching chat server...");

    let server = ChatServer::new(&config);
    if let Err(e) = server.start().await {
        eprintln!("ERROR - Could not listen for clients! ({})", e);
        std::process::exit(1);
    }

    ServerConsole::new(server).run().await;
}
