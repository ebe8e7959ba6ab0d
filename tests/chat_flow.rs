//! End-to-end tests: a real server on an ephemeral port, driven by raw TCP
//! clients so the wire protocol itself is what gets asserted.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::{sleep, timeout};

use chat_relay::error::ServerError;
use chat_relay::{ChatClient, ChatConfig, ChatServer};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

async fn start_server() -> (ChatServer, u16) {
    let config = ChatConfig {
        bind_address: "127.0.0.1".to_string(),
        port: 0,
    };
    let server = ChatServer::new(&config);
    server.start().await.expect("server failed to start");
    let port = server.port().await;
    (server, port)
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(port: u16) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("failed to connect");
        let (read_half, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    async fn login(port: u16, identity: &str) -> Self {
        let mut client = Self::connect(port).await;
        client.send(&format!("#login {identity}")).await;
        assert_eq!(
            client.recv().await.as_deref(),
            Some(format!("{identity} has logged on.").as_str())
        );
        client
    }

    async fn send(&mut self, line: &str) {
        self.send_raw(&format!("{line}\n")).await;
    }

    /// Write bytes as-is, without a trailing newline.
    async fn send_raw(&mut self, bytes: &str) {
        self.writer
            .write_all(bytes.as_bytes())
            .await
            .expect("send failed");
        self.writer.flush().await.expect("flush failed");
    }

    /// Next line from the server, or None on EOF. Panics after two seconds.
    async fn recv(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for server")
            .expect("read failed");
        if read == 0 {
            None
        } else {
            Some(line.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

#[tokio::test]
async fn login_confirms_identity() {
    let (_server, port) = start_server().await;
    let mut client = TestClient::connect(port).await;
    client.send("#login cora").await;
    assert_eq!(client.recv().await.as_deref(), Some("cora has logged on."));
}

#[tokio::test]
async fn login_is_case_insensitive() {
    let (_server, port) = start_server().await;
    let mut client = TestClient::connect(port).await;
    client.send("#LOGIN cora").await;
    assert_eq!(client.recv().await.as_deref(), Some("cora has logged on."));
}

#[tokio::test]
async fn message_before_login_is_rejected() {
    let (_server, port) = start_server().await;
    let mut violator = TestClient::connect(port).await;
    violator.send("hello?").await;

    let error = violator.recv().await.expect("expected an error line");
    assert!(error.starts_with("ERROR"), "got: {error}");
    // Closed after the single explanatory message, so the violator can never
    // observe a broadcast.
    assert_eq!(violator.recv().await, None);

    // The server is unaffected.
    let mut client = TestClient::login(port, "cora").await;
    client.send("hi").await;
    assert_eq!(client.recv().await.as_deref(), Some("cora> hi"));
}

#[tokio::test]
async fn empty_login_identity_is_rejected() {
    let (_server, port) = start_server().await;
    let mut client = TestClient::connect(port).await;
    client.send("#login").await;
    let error = client.recv().await.expect("expected an error line");
    assert!(error.starts_with("ERROR"), "got: {error}");
    assert_eq!(client.recv().await, None);
}

#[tokio::test]
async fn duplicate_identity_rejects_newcomer_only() {
    let (_server, port) = start_server().await;
    let mut incumbent = TestClient::login(port, "a1").await;

    let mut newcomer = TestClient::connect(port).await;
    newcomer.send("#login a1").await;
    let error = newcomer.recv().await.expect("expected an error line");
    assert!(error.starts_with("ERROR"), "got: {error}");
    assert_eq!(newcomer.recv().await, None);

    // The incumbent keeps its identity and its connection.
    incumbent.send("still here").await;
    assert_eq!(
        incumbent.recv().await.as_deref(),
        Some("a1> still here")
    );
}

#[tokio::test]
async fn broadcast_is_echo_inclusive() {
    let (_server, port) = start_server().await;
    let mut a1 = TestClient::login(port, "a1").await;
    let mut a2 = TestClient::login(port, "a2").await;

    a1.send("hi").await;
    assert_eq!(a1.recv().await.as_deref(), Some("a1> hi"));
    assert_eq!(a2.recv().await.as_deref(), Some("a1> hi"));

    a2.send("yo").await;
    assert_eq!(a1.recv().await.as_deref(), Some("a2> yo"));
    assert_eq!(a2.recv().await.as_deref(), Some("a2> yo"));
}

#[tokio::test]
async fn partial_line_survives_concurrent_broadcast() {
    let (_server, port) = start_server().await;
    let mut a1 = TestClient::login(port, "a1").await;
    let mut a2 = TestClient::login(port, "a2").await;

    // a1's line arrives in two pieces with a broadcast landing in between;
    // the half-read prefix must not be lost to the concurrent delivery.
    a1.send_raw("hel").await;
    sleep(Duration::from_millis(100)).await;

    a2.send("trigger").await;
    assert_eq!(a1.recv().await.as_deref(), Some("a2> trigger"));
    assert_eq!(a2.recv().await.as_deref(), Some("a2> trigger"));

    a1.send_raw("lo\n").await;
    assert_eq!(a1.recv().await.as_deref(), Some("a1> hello"));
    assert_eq!(a2.recv().await.as_deref(), Some("a1> hello"));
}

#[tokio::test]
async fn login_line_after_handshake_is_chat() {
    let (_server, port) = start_server().await;
    let mut a1 = TestClient::login(port, "a1").await;

    // The handshake fires once per connection; this is plain chat now.
    a1.send("#login b2").await;
    assert_eq!(a1.recv().await.as_deref(), Some("a1> #login b2"));

    // And it did not rebind anything: b2 is still free.
    let _b2 = TestClient::login(port, "b2").await;
}

#[tokio::test]
async fn server_broadcast_reaches_all_clients() {
    let (server, port) = start_server().await;
    let mut client = TestClient::login(port, "cora").await;

    server.broadcast_server_message("maintenance at noon").await;
    assert_eq!(
        client.recv().await.as_deref(),
        Some("SERVER MESSAGE> maintenance at noon")
    );
}

#[tokio::test]
async fn close_notifies_disconnects_and_stops_accepting() {
    let (server, port) = start_server().await;
    let mut client = TestClient::login(port, "cora").await;

    server.close().await;

    assert_eq!(
        client.recv().await.as_deref(),
        Some("SERVER MESSAGE> The server is closing.")
    );
    assert_eq!(client.recv().await, None);
    assert!(!server.is_listening().await);
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());

    // #start brings the listener back on the same port.
    server.start().await.expect("restart failed");
    let _client = TestClient::login(port, "cora").await;
}

#[tokio::test]
async fn stop_keeps_existing_connections_open() {
    let (server, port) = start_server().await;
    let mut client = TestClient::login(port, "cora").await;

    assert!(server.stop().await);
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());

    // Established connections still receive broadcasts.
    client.send("anyone there").await;
    assert_eq!(client.recv().await.as_deref(), Some("cora> anyone there"));

    // stop is a no-op when already idle, and says so.
    assert!(!server.stop().await);
    assert!(!server.is_listening().await);
}

#[tokio::test]
async fn set_port_only_while_idle() {
    let (server, port) = start_server().await;

    assert!(matches!(
        server.set_port(port.wrapping_add(1)).await,
        Err(ServerError::PortChangeWhileListening)
    ));
    assert_eq!(server.port().await, port);

    assert!(server.stop().await);
    server.set_port(0).await.expect("set_port while idle");
    server.start().await.expect("restart failed");
    let new_port = server.port().await;
    assert_ne!(new_port, 0);
    let _client = TestClient::login(new_port, "cora").await;
}

#[tokio::test]
async fn start_twice_is_rejected() {
    let (server, _port) = start_server().await;
    assert!(matches!(
        server.start().await,
        Err(ServerError::AlreadyListening)
    ));
}

#[tokio::test]
async fn identity_is_freed_on_disconnect() {
    let (_server, port) = start_server().await;
    let first = TestClient::login(port, "cora").await;
    drop(first);
    sleep(Duration::from_millis(100)).await;

    let _second = TestClient::login(port, "cora").await;
}

#[tokio::test]
async fn abrupt_disconnect_does_not_break_broadcast() {
    let (_server, port) = start_server().await;
    let mut survivor = TestClient::login(port, "a1").await;
    let casualty = TestClient::login(port, "a2").await;

    drop(casualty);
    sleep(Duration::from_millis(100)).await;

    survivor.send("hi").await;
    assert_eq!(survivor.recv().await.as_deref(), Some("a1> hi"));
}

#[tokio::test]
async fn client_logoff_then_login_reuses_identity() {
    let (server, port) = start_server().await;
    let client = ChatClient::new("remy".to_string(), "127.0.0.1".to_string(), port);

    client.connect().await.expect("initial connect failed");
    sleep(Duration::from_millis(100)).await;
    assert!(client.is_connected().await);
    assert_eq!(server.client_count().await, 1);

    client.logoff().await.expect("logoff failed");
    sleep(Duration::from_millis(200)).await;
    assert!(!client.is_connected().await);
    assert_eq!(server.client_count().await, 0);

    // Reconnect with the retained identity, no re-entry required.
    client.connect().await.expect("reconnect failed");
    sleep(Duration::from_millis(100)).await;
    assert!(client.is_connected().await);
    assert_eq!(server.client_count().await, 1);
}
