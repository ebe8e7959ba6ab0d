//! Chat client
//!
//! Network half of the client: opens the connection, sends the login
//! handshake, prints relayed lines, and turns disconnect signals into the
//! outcome the session state machine decides.

use std::sync::Arc;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::client::session::{ClientSession, DisconnectOutcome};
use crate::error::ClientError;

/// Handle to a client session. Cloning yields another handle to the same
/// session, shared between the console loop and the connection reader task.
#[derive(Clone)]
pub struct ChatClient {
    session: Arc<Mutex<ClientSession>>,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
}

impl ChatClient {
    pub fn new(identity: String, host: String, port: u16) -> Self {
        Self {
            session: Arc::new(Mutex::new(ClientSession::new(identity, host, port))),
            writer: Arc::new(Mutex::new(None)),
        }
    }

    /// Open the connection and send the `#login` handshake with the stored
    /// identity. Used both at startup and for `#login` reconnects.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let (host, port, identity) = {
            let mut session = self.session.lock().await;
            session.begin_connect()?;
            (
                session.host().to_string(),
                session.port(),
                session.identity().to_string(),
            )
        };

        let stream = match TcpStream::connect((host.as_str(), port)).await {
            Ok(stream) => stream,
            Err(e) => {
                self.session.lock().await.on_connect_failed();
                return Err(ClientError::Connect(e));
            }
        };

        let (read_half, mut write_half) = stream.into_split();
        if let Err(e) = write_line(&mut write_half, &format!("#login {}", identity)).await {
            self.session.lock().await.on_connect_failed();
            return Err(ClientError::Connect(e));
        }
        self.session.lock().await.on_connected();
        info!("Connected to {}:{} as {}", host, port, identity);

        *self.writer.lock().await = Some(write_half);
        tokio::spawn(read_loop(
            Arc::clone(&self.session),
            Arc::clone(&self.writer),
            read_half,
        ));
        Ok(())
    }

    /// Send a chat line to the server.
    pub async fn send(&self, message: &str) -> Result<(), ClientError> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(write_half) => write_line(write_half, message)
                .await
                .map_err(ClientError::Send),
            None => Err(ClientError::NotConnected),
        }
    }

    /// Close the connection but keep the process alive and the identity
    /// retained for a later `#login`.
    pub async fn logoff(&self) -> Result<(), ClientError> {
        self.session.lock().await.begin_logoff()?;
        self.close_writer().await;
        Ok(())
    }

    /// Close the connection and terminate. The quit intent is recorded before
    /// the close, so the resulting disconnect event stays silent.
    pub async fn quit(&self) -> ! {
        self.session.lock().await.begin_quit();
        self.close_writer().await;
        std::process::exit(0);
    }

    async fn close_writer(&self) {
        if let Some(mut write_half) = self.writer.lock().await.take() {
            let _ = write_half.shutdown().await;
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_connected()
    }

    pub async fn host(&self) -> String {
        self.session.lock().await.host().to_string()
    }

    pub async fn port(&self) -> u16 {
        self.session.lock().await.port()
    }

    pub async fn set_host(&self, host: String) -> Result<(), ClientError> {
        self.session.lock().await.set_host(host)
    }

    pub async fn set_port(&self, port: u16) -> Result<(), ClientError> {
        self.session.lock().await.set_port(port)
    }
}

/// Print every relayed line, then resolve the disconnect according to the
/// intent recorded in the session.
async fn read_loop(
    session: Arc<Mutex<ClientSession>>,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
    read_half: OwnedReadHalf,
) {
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                session.lock().await.on_server_message();
                println!("{}", line.trim_end_matches(['\r', '\n']));
            }
            Err(e) => {
                warn!("Connection error: {}", e);
                break;
            }
        }
    }

    if let Some(mut write_half) = writer.lock().await.take() {
        let _ = write_half.shutdown().await;
    }

    match session.lock().await.on_disconnect() {
        DisconnectOutcome::ExitSilently => std::process::exit(0),
        DisconnectOutcome::StayAlive => println!("Connection closed."),
        DisconnectOutcome::ExitWithNotice => {
            println!("Server has shut down. Client will terminate.");
            std::process::exit(0);
        }
    }
}

async fn write_line(write_half: &mut OwnedWriteHalf, text: &str) -> std::io::Result<()> {
    write_half.write_all(text.as_bytes()).await?;
    write_half.write_all(b"\n").await?;
    write_half.flush().await
}
