// Command enums for the wire protocol and the two consoles.

/// A line received by the server from a client connection.
#[derive(Debug, PartialEq)]
pub enum WireCommand {
    /// `#login <id>` — only meaningful as the first message of a connection.
    Login(String),
    /// Anything else; relayed verbatim once the sender is authenticated.
    Chat(String),
}

/// A line typed on the client console.
#[derive(Debug, PartialEq)]
pub enum ClientCommand {
    Quit,
    Logoff,
    Login,
    GetHost,
    GetPort,
    SetHost(String),
    SetPort(String),
    Unknown(String),
    Chat(String),
}

/// A line typed on the server console.
#[derive(Debug, PartialEq)]
pub enum ServerCommand {
    Quit,
    Stop,
    Start,
    Close,
    GetPort,
    SetPort(String),
    Unknown(String),
    Broadcast(String),
}

fn split_command(line: &str) -> (String, &str) {
    let trimmed = line.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next().unwrap_or("").trim();
    (cmd, arg)
}

impl WireCommand {
    pub fn parse(line: &str) -> WireCommand {
        let (cmd, arg) = split_command(line);
        if cmd == "#login" {
            WireCommand::Login(arg.to_string())
        } else {
            WireCommand::Chat(line.to_string())
        }
    }
}

impl ClientCommand {
    pub fn parse(line: &str) -> ClientCommand {
        if !line.trim_start().starts_with('#') {
            return ClientCommand::Chat(line.to_string());
        }

        let (cmd, arg) = split_command(line);
        match (cmd.as_str(), arg) {
            ("#quit", "") => ClientCommand::Quit,
            ("#logoff", "") => ClientCommand::Logoff,
            ("#login", "") => ClientCommand::Login,
            ("#gethost", "") => ClientCommand::GetHost,
            ("#getport", "") => ClientCommand::GetPort,
            ("#sethost", host) if !host.is_empty() => ClientCommand::SetHost(host.to_string()),
            ("#setport", port) if !port.is_empty() => ClientCommand::SetPort(port.to_string()),
            _ => ClientCommand::Unknown(line.trim().to_string()),
        }
    }
}

impl ServerCommand {
    pub fn parse(line: &str) -> ServerCommand {
        if !line.trim_start().starts_with('#') {
            return ServerCommand::Broadcast(line.to_string());
        }

        let (cmd, arg) = split_command(line);
        match (cmd.as_str(), arg) {
            ("#quit", "") => ServerCommand::Quit,
            ("#stop", "") => ServerCommand::Stop,
            ("#start", "") => ServerCommand::Start,
            ("#close", "") => ServerCommand::Close,
            ("#getport", "") => ServerCommand::GetPort,
            ("#setport", port) if !port.is_empty() => ServerCommand::SetPort(port.to_string()),
            _ => ServerCommand::Unknown(line.trim().to_string()),
        }
    }
}
