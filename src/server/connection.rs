//! Per-connection task
//!
//! One accepted connection becomes two tasks: a writer that drains the
//! outbound queue onto the write half, and a reader that owns the inbound
//! line loop and drives the lifecycle (unauthenticated → login handshake on
//! the first line → chat relay → removal from the registry on disconnect).
//! The split keeps an in-flight `read_line` from ever being cancelled by a
//! concurrent broadcast, which would lose the bytes already buffered and
//! truncate the client's message.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

use crate::protocol::WireCommand;
use crate::server::core::ServerShared;
use crate::server::registry::{ClientRecord, ConnectionId, Outbound};
use crate::server::router;

pub(crate) async fn handle_connection(
    shared: Arc<ServerShared>,
    stream: TcpStream,
    addr: SocketAddr,
    id: ConnectionId,
) {
    let (read_half, write_half) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();
    let (closed_tx, mut closed_rx) = oneshot::channel();
    let writer_task = tokio::spawn(write_loop(write_half, rx, closed_tx));

    {
        let mut registry = shared.registry.lock().await;
        registry.insert(id, addr, tx.clone());
        info!("Client connected: {} ({} online)", addr, registry.len());
    }

    let mut reader = BufReader::new(read_half);
    let mut line = String::new();
    loop {
        tokio::select! {
            // The writer shut the socket down (forced close); the connection
            // is gone, so abandoning a partial read loses nothing.
            _ = &mut closed_rx => break,
            read = reader.read_line(&mut line) => match read {
                Ok(0) => break,
                Ok(_) => {
                    let message = line.trim_end_matches(['\r', '\n']).to_string();
                    line.clear();
                    if !handle_inbound(&shared, id, addr, &message, &tx).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Read error from {}: {}", addr, e);
                    break;
                }
            },
        }
    }

    {
        let mut registry = shared.registry.lock().await;
        match registry.remove(id) {
            Some((_, ClientRecord::Authenticated { identity })) => {
                info!("{} has disconnected.", identity);
            }
            _ => info!("Client disconnected: {}", addr),
        }
    }

    // All senders are gone now, so the writer drains what is queued, closes
    // the socket, and exits.
    drop(tx);
    let _ = writer_task.await;
}

/// Drain the outbound queue onto the socket. Exits on `Shutdown`, on a write
/// failure, or once every sender is dropped; always closes the write half
/// and signals the reader on the way out.
async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut rx: UnboundedReceiver<Outbound>,
    closed: oneshot::Sender<()>,
) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Line(text) => {
                if write_line(&mut write_half, &text).await.is_err() {
                    break;
                }
            }
            Outbound::Shutdown => break,
        }
    }
    let _ = write_half.shutdown().await;
    let _ = closed.send(());
}

/// Dispatch one inbound line. Returns false when the connection must close.
async fn handle_inbound(
    shared: &Arc<ServerShared>,
    id: ConnectionId,
    addr: SocketAddr,
    message: &str,
    tx: &UnboundedSender<Outbound>,
) -> bool {
    let registry = shared.registry.lock().await;
    if let Some(identity) = registry.identity_of(id).map(str::to_string) {
        // Authenticated traffic is chat, even lines that look like #login.
        router::broadcast_chat(&registry, &identity, message);
        return true;
    }
    drop(registry);

    // First message on an unauthenticated connection: the handshake fires
    // exactly once, here.
    match WireCommand::parse(message) {
        WireCommand::Login(requested) => {
            let mut registry = shared.registry.lock().await;
            match registry.bind_identity(id, &requested) {
                Ok(()) => {
                    let identity = requested.trim();
                    info!("{} has logged on.", identity);
                    // Confirmation enqueued under the registry lock, before
                    // any broadcast can observe the new identity.
                    let _ = tx.send(Outbound::Line(format!("{} has logged on.", identity)));
                    true
                }
                Err(e) => {
                    drop(registry);
                    warn!("Login rejected for {}: {}", addr, e);
                    let _ = tx.send(Outbound::Line(format!("ERROR - {}", e)));
                    let _ = tx.send(Outbound::Shutdown);
                    false
                }
            }
        }
        WireCommand::Chat(_) => {
            warn!("Message before login from {}; closing connection", addr);
            let _ = tx.send(Outbound::Line(
                "ERROR - You must login before sending messages.".to_string(),
            ));
            let _ = tx.send(Outbound::Shutdown);
            false
        }
    }
}

async fn write_line(write_half: &mut OwnedWriteHalf, text: &str) -> std::io::Result<()> {
    write_half.write_all(text.as_bytes()).await?;
    write_half.write_all(b"\n").await?;
    write_half.flush().await
}
