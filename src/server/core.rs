//! Server core
//!
//! Owns the connection registry and the listener lifecycle, and exposes the
//! operator control surface. Every operation is safe to call from the console
//! task while connections are concurrently accepted, authenticated, and
//! broadcast to.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{error, info};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

use crate::config::ChatConfig;
use crate::error::ServerError;
use crate::server::connection::handle_connection;
use crate::server::registry::{ConnectionId, Registry};
use crate::server::router;

/// State shared with every connection task.
pub(crate) struct ServerShared {
    pub(crate) registry: Mutex<Registry>,
    next_conn_id: AtomicU64,
}

/// Listener state: `Idle(port)` when `shutdown` is `None`, `Listening(port)`
/// otherwise. The port may only change while idle.
struct ListenerControl {
    port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    accept_task: Option<JoinHandle<()>>,
}

/// A chat relay server instance.
///
/// Cloning yields another handle to the same instance, which is how the
/// console and tests drive a running server.
#[derive(Clone)]
pub struct ChatServer {
    shared: Arc<ServerShared>,
    bind_address: String,
    control: Arc<Mutex<ListenerControl>>,
}

impl ChatServer {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            shared: Arc::new(ServerShared {
                registry: Mutex::new(Registry::new()),
                next_conn_id: AtomicU64::new(0),
            }),
            bind_address: config.bind_address.clone(),
            control: Arc::new(Mutex::new(ListenerControl {
                port: config.port,
                shutdown: None,
                accept_task: None,
            })),
        }
    }

    /// Bind the listener and spawn the accept loop. Binding port 0 picks an
    /// ephemeral port, which is then reported by [`ChatServer::port`].
    pub async fn start(&self) -> Result<(), ServerError> {
        let mut control = self.control.lock().await;
        if control.shutdown.is_some() {
            return Err(ServerError::AlreadyListening);
        }

        let listener = TcpListener::bind((self.bind_address.as_str(), control.port)).await?;
        control.port = listener.local_addr()?.port();

        let (tx, rx) = oneshot::channel();
        control.shutdown = Some(tx);
        control.accept_task = Some(tokio::spawn(accept_loop(
            Arc::clone(&self.shared),
            listener,
            rx,
        )));

        info!("Server listening for connections on port {}", control.port);
        Ok(())
    }

    /// Stop accepting new connections. Established connections stay open and
    /// keep receiving broadcasts. No-op when already idle; the return value
    /// says whether the listener was actually stopped.
    pub async fn stop(&self) -> bool {
        let mut control = self.control.lock().await;
        match control.shutdown.take() {
            Some(shutdown) => {
                let _ = shutdown.send(());
                if let Some(task) = control.accept_task.take() {
                    let _ = task.await;
                }
                info!("Server has stopped listening for connections.");
                true
            }
            None => false,
        }
    }

    /// Notify every connection that the server is closing, disconnect them
    /// all, and stop accepting. The notice is enqueued ahead of the shutdown
    /// on each connection's queue, so it is attempted before the disconnect
    /// lands; a client that is already gone simply misses it.
    pub async fn close(&self) {
        {
            let registry = self.shared.registry.lock().await;
            router::broadcast_server_message(&registry, "The server is closing.");
            registry.shutdown_all();
        }
        self.stop().await;
        info!("Server closed.");
    }

    /// Change the listening port. Rejected while the listener is live so a
    /// pending accept never sees its port change underneath it.
    pub async fn set_port(&self, port: u16) -> Result<(), ServerError> {
        let mut control = self.control.lock().await;
        if control.shutdown.is_some() {
            return Err(ServerError::PortChangeWhileListening);
        }
        control.port = port;
        Ok(())
    }

    pub async fn port(&self) -> u16 {
        self.control.lock().await.port
    }

    pub async fn is_listening(&self) -> bool {
        self.control.lock().await.shutdown.is_some()
    }

    /// Send operator free text to all connections, formatted like chat but
    /// without requiring authentication.
    pub async fn broadcast_server_message(&self, text: &str) {
        let registry = self.shared.registry.lock().await;
        router::broadcast_server_message(&registry, text);
    }

    pub async fn client_count(&self) -> usize {
        self.shared.registry.lock().await.len()
    }
}

async fn accept_loop(
    shared: Arc<ServerShared>,
    listener: TcpListener,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let id = ConnectionId::new(shared.next_conn_id.fetch_add(1, Ordering::Relaxed));
                    tokio::spawn(handle_connection(Arc::clone(&shared), stream, addr, id));
                }
                Err(e) => error!("Error accepting connection: {}", e),
            },
        }
    }
}
