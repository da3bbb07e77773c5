//! WebSocket transport ownership and lifecycle.
//!
//! The connection moves through `Closed -> Connecting -> Open -> Closed`.
//! Reconnection is never automatic; a new `connect` call is required.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use shared::protocol::ControlMessage;
use tokio::{
    net::TcpStream,
    sync::{oneshot, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::{codec, error::ConnectionError};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Closed,
    Connecting,
    Open,
}

enum ConnectionState {
    Closed,
    Connecting {
        id: u64,
        // Dropping the sender cancels the pending attempt.
        _cancel: oneshot::Sender<()>,
    },
    Open(OpenConnection),
}

impl ConnectionState {
    fn phase(&self) -> ConnectionPhase {
        match self {
            Self::Closed => ConnectionPhase::Closed,
            Self::Connecting { .. } => ConnectionPhase::Connecting,
            Self::Open(_) => ConnectionPhase::Open,
        }
    }

    fn is_pending(&self, attempt: u64) -> bool {
        matches!(self, Self::Connecting { id, .. } if *id == attempt)
    }

    fn is_open(&self, connection_id: u64) -> bool {
        matches!(self, Self::Open(open) if open.id == connection_id)
    }
}

struct OpenConnection {
    id: u64,
    endpoint: String,
    writer: WsWriter,
    reader_task: Option<JoinHandle<()>>,
}

/// Read half of an open connection, handed to whoever dispatches inbound frames.
pub struct Inbound {
    id: u64,
    reader: WsReader,
}

impl fmt::Debug for Inbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbound").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Inbound {
    pub fn connection_id(&self) -> u64 {
        self.id
    }

    /// Next binary message, or `None` once the remote closed or the stream failed.
    pub async fn next_binary(&mut self) -> Option<Vec<u8>> {
        while let Some(message) = self.reader.next().await {
            match message {
                Ok(Message::Binary(bytes)) => return Some(bytes),
                Ok(Message::Close(frame)) => {
                    debug!(connection_id = self.id, ?frame, "close frame received");
                    return None;
                }
                Ok(Message::Text(text)) => {
                    trace!(connection_id = self.id, len = text.len(), "ignoring text message");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(connection_id = self.id, error = %err, "websocket receive failed");
                    return None;
                }
            }
        }
        None
    }
}

/// Owns at most one WebSocket connection to the renderer.
#[derive(Clone)]
pub struct ConnectionManager {
    state: Arc<Mutex<ConnectionState>>,
    next_id: Arc<AtomicU64>,
    connect_timeout: Duration,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl ConnectionManager {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConnectionState::Closed)),
            next_id: Arc::new(AtomicU64::new(1)),
            connect_timeout,
        }
    }

    pub async fn phase(&self) -> ConnectionPhase {
        self.state.lock().await.phase()
    }

    pub async fn is_ready(&self) -> bool {
        self.phase().await == ConnectionPhase::Open
    }

    /// Opens a new connection and writes `opening` as its first message.
    ///
    /// The connection only becomes `Open` after `opening` was written, so no
    /// other send can overtake it. Fails with `Busy` unless the manager is
    /// `Closed`.
    pub async fn connect(
        &self,
        endpoint: &str,
        opening: &ControlMessage,
    ) -> Result<Inbound, ConnectionError> {
        let url = normalize_endpoint(endpoint)?;
        let endpoint = url.to_string();
        let opening = codec::encode(opening)?;
        let attempt = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        {
            let mut state = self.state.lock().await;
            if !matches!(*state, ConnectionState::Closed) {
                return Err(ConnectionError::Busy(state.phase()));
            }
            *state = ConnectionState::Connecting {
                id: attempt,
                _cancel: cancel_tx,
            };
        }
        debug!(connection_id = attempt, endpoint = %endpoint, "connecting");

        let dial = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()));
        let outcome = tokio::select! {
            dialed = dial => match dialed {
                Ok(Ok((stream, _response))) => Ok(stream),
                Ok(Err(source)) => Err(ConnectionError::Open {
                    endpoint: endpoint.clone(),
                    source: Box::new(source),
                }),
                Err(_) => Err(ConnectionError::Timeout {
                    endpoint: endpoint.clone(),
                    timeout: self.connect_timeout,
                }),
            },
            _ = cancel_rx => Err(ConnectionError::Cancelled {
                endpoint: endpoint.clone(),
            }),
        };

        let mut state = self.state.lock().await;
        let pending = state.is_pending(attempt);
        let stream = match outcome {
            Ok(stream) if pending => stream,
            Ok(mut stream) => {
                // close() ran while the handshake was finishing.
                let _ = stream.close(None).await;
                return Err(ConnectionError::Cancelled { endpoint });
            }
            Err(err) => {
                if pending {
                    *state = ConnectionState::Closed;
                }
                warn!(connection_id = attempt, error = %err, "connection attempt failed");
                return Err(err);
            }
        };

        let (mut writer, reader) = stream.split();
        if let Err(source) = writer.send(Message::Text(opening)).await {
            *state = ConnectionState::Closed;
            warn!(connection_id = attempt, error = %source, "opening message send failed");
            return Err(ConnectionError::Send(Box::new(source)));
        }

        info!(connection_id = attempt, endpoint = %endpoint, "connection open");
        *state = ConnectionState::Open(OpenConnection {
            id: attempt,
            endpoint,
            writer,
            reader_task: None,
        });

        Ok(Inbound {
            id: attempt,
            reader,
        })
    }

    /// Hands the task draining `connection_id`'s inbound half to the manager,
    /// so `close` can stop it. Aborts the task and returns `false` if that
    /// connection is gone.
    pub async fn attach_reader(&self, connection_id: u64, task: JoinHandle<()>) -> bool {
        let mut state = self.state.lock().await;
        match &mut *state {
            ConnectionState::Open(open) if open.id == connection_id => {
                open.reader_task = Some(task);
                true
            }
            _ => {
                debug!(connection_id, "connection gone before its reader was attached");
                task.abort();
                false
            }
        }
    }

    /// Sends `message` if the connection is open. Returns `Ok(false)` when the
    /// message was dropped because nothing is open.
    pub async fn send(&self, message: &ControlMessage) -> Result<bool, ConnectionError> {
        let mut state = self.state.lock().await;
        let ConnectionState::Open(open) = &mut *state else {
            trace!("connection not open; dropping control message");
            return Ok(false);
        };

        let payload = codec::encode(message)?;
        if let Err(source) = open.writer.send(Message::Text(payload)).await {
            warn!(connection_id = open.id, error = %source, "control message send failed; closing connection");
            if let ConnectionState::Open(open) = std::mem::replace(&mut *state, ConnectionState::Closed) {
                if let Some(task) = open.reader_task {
                    task.abort();
                }
            }
            return Err(ConnectionError::Send(Box::new(source)));
        }
        Ok(true)
    }

    /// Gracefully closes the connection, or cancels a pending attempt.
    /// Returns `false` when there was nothing to close.
    pub async fn close(&self) -> bool {
        let previous = std::mem::replace(&mut *self.state.lock().await, ConnectionState::Closed);
        match previous {
            ConnectionState::Closed => false,
            ConnectionState::Connecting { id, .. } => {
                info!(connection_id = id, "pending connection attempt cancelled");
                true
            }
            ConnectionState::Open(mut open) => {
                if let Err(err) = open.writer.close().await {
                    debug!(connection_id = open.id, error = %err, "close handshake failed");
                }
                if let Some(task) = open.reader_task.take() {
                    task.abort();
                }
                info!(connection_id = open.id, endpoint = %open.endpoint, "connection closed");
                true
            }
        }
    }

    /// Records a remote-initiated close. Returns `true` only if
    /// `connection_id` was still the open connection.
    pub async fn mark_closed(&self, connection_id: u64) -> bool {
        let mut state = self.state.lock().await;
        if !state.is_open(connection_id) {
            return false;
        }
        *state = ConnectionState::Closed;
        info!(connection_id, "connection closed by remote");
        true
    }
}

/// Accepts `ws://` and `wss://` endpoints and rewrites `http(s)://` to them.
pub fn normalize_endpoint(endpoint: &str) -> Result<Url, ConnectionError> {
    let trimmed = endpoint.trim();
    let invalid = |reason: String| ConnectionError::InvalidEndpoint {
        endpoint: trimmed.to_string(),
        reason,
    };
    if trimmed.is_empty() {
        return Err(invalid("endpoint is empty".to_string()));
    }

    let mut url = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    let scheme = match url.scheme() {
        "ws" | "wss" => return Ok(url),
        "http" => "ws",
        "https" => "wss",
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid(format!("cannot switch scheme to '{scheme}'")))?;
    Ok(url)
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
