//! In-process renderer stub speaking the session wire protocol.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpListener,
    sync::{broadcast, broadcast::error::RecvError, mpsc},
};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum StubCommand {
    Frame(Vec<u8>),
    Close,
}

#[derive(Clone)]
struct StubState {
    accepted: Arc<AtomicUsize>,
    received: mpsc::UnboundedSender<(usize, String)>,
    commands: broadcast::Sender<StubCommand>,
}

pub struct RendererStub {
    pub endpoint: String,
    accepted: Arc<AtomicUsize>,
    received: mpsc::UnboundedReceiver<(usize, String)>,
    commands: broadcast::Sender<StubCommand>,
}

impl RendererStub {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let accepted = Arc::new(AtomicUsize::new(0));
        let (received_tx, received) = mpsc::unbounded_channel();
        let (commands, _) = broadcast::channel(64);
        let state = StubState {
            accepted: Arc::clone(&accepted),
            received: received_tx,
            commands: commands.clone(),
        };
        let app = Router::new()
            .route("/render", get(ws_handler))
            .with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            endpoint: format!("ws://{addr}/render"),
            accepted,
            received,
            commands,
        }
    }

    /// Number of WebSocket upgrade requests the stub has seen.
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Next text message as `(connection number, body)`.
    pub async fn next_message(&mut self) -> (usize, String) {
        tokio::time::timeout(WAIT, self.received.recv())
            .await
            .expect("timed out waiting for control message")
            .expect("stub stopped")
    }

    pub fn try_next_message(&mut self) -> Option<(usize, String)> {
        self.received.try_recv().ok()
    }

    pub fn send_frame(&self, frame: Vec<u8>) {
        self.commands
            .send(StubCommand::Frame(frame))
            .expect("no stub connection subscribed");
    }

    pub fn close_all(&self) {
        let _ = self.commands.send(StubCommand::Close);
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<StubState>) -> impl IntoResponse {
    // Subscribe before the handshake completes so no frame sent after
    // `connect` returns can be missed.
    let commands = state.commands.subscribe();
    let connection = state.accepted.fetch_add(1, Ordering::SeqCst) + 1;
    ws.on_upgrade(move |socket| stub_connection(socket, connection, state.received, commands))
}

async fn stub_connection(
    socket: WebSocket,
    connection: usize,
    received: mpsc::UnboundedSender<(usize, String)>,
    mut commands: broadcast::Receiver<StubCommand>,
) {
    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = received.send((connection, text));
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            command = commands.recv() => match command {
                Ok(StubCommand::Frame(bytes)) => {
                    if sender.send(Message::Binary(bytes)).await.is_err() {
                        break;
                    }
                }
                Ok(StubCommand::Close) | Err(RecvError::Closed) => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                Err(RecvError::Lagged(_)) => {}
            },
        }
    }
}

/// Accepts TCP connections and never answers the WebSocket handshake.
pub async fn spawn_silent_listener() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind silent");
    let addr = listener.local_addr().expect("silent addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("ws://{addr}/render")
}

/// An endpoint nothing listens on.
pub async fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("ws://{addr}/render")
}
