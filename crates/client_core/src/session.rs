//! Session orchestration: start/end, pointer routing, inbound dispatch.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{CameraState, RenderConfig},
    protocol::ControlMessage,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    codec::{self, InboundFrame},
    connection::{ConnectionManager, ConnectionPhase, Inbound, DEFAULT_CONNECT_TIMEOUT},
    error::ConnectionError,
    input::{InputTranslator, PointerButton},
    presentation::{ConnectionStatus, PresentationSink},
};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub connect_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

struct SessionState {
    camera: CameraState,
    config: RenderConfig,
    input: InputTranslator,
}

pub struct SessionController {
    presentation: Arc<dyn PresentationSink>,
    connection: ConnectionManager,
    inner: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(presentation: Arc<dyn PresentationSink>, settings: SessionSettings) -> Arc<Self> {
        Arc::new(Self {
            presentation,
            connection: ConnectionManager::new(settings.connect_timeout),
            inner: Mutex::new(SessionState {
                camera: CameraState::default(),
                config: RenderConfig::default(),
                input: InputTranslator::default(),
            }),
        })
    }

    pub async fn camera(&self) -> CameraState {
        self.inner.lock().await.camera
    }

    pub async fn render_config(&self) -> RenderConfig {
        self.inner.lock().await.config.clone()
    }

    pub async fn phase(&self) -> ConnectionPhase {
        self.connection.phase().await
    }

    /// Sends a full snapshot, reusing the open connection or lazily opening
    /// one. A fresh connection always carries the snapshot as its first
    /// message.
    pub async fn start(self: &Arc<Self>) -> Result<(), ConnectionError> {
        info!("start");
        let snapshot = {
            let mut inner = self.inner.lock().await;
            inner.config = RenderConfig::from_input(&self.presentation.max_spp_input());
            let snapshot = ControlMessage::snapshot(&inner.camera, &inner.config);
            // Guard stays held across the send, as in `pointer_move`.
            if self.connection.is_ready().await {
                return self.send(&snapshot).await;
            }
            snapshot
        };

        let endpoint = self.presentation.endpoint_url();
        self.presentation
            .set_connection_status(ConnectionStatus::Connecting);
        let inbound = match self.connection.connect(&endpoint, &snapshot).await {
            Ok(inbound) => inbound,
            Err(err) => {
                // Busy: another attempt owns the status. Cancelled: end() already reported it.
                if !matches!(
                    err,
                    ConnectionError::Busy(_) | ConnectionError::Cancelled { .. }
                ) {
                    self.presentation
                        .set_connection_status(ConnectionStatus::Disconnected);
                }
                return Err(err);
            }
        };

        self.presentation
            .set_connection_status(ConnectionStatus::Connected);
        let connection_id = inbound.connection_id();
        let reader = self.spawn_dispatch(inbound);
        if !self.connection.attach_reader(connection_id, reader).await {
            // Ended or closed remotely before the reader was attached.
            self.presentation
                .set_connection_status(ConnectionStatus::Disconnected);
        }
        Ok(())
    }

    /// Closes the connection, or cancels a pending connect. Returns `false`
    /// when there was nothing to end.
    pub async fn end(&self) -> bool {
        if !self.connection.close().await {
            return false;
        }
        info!("end");
        self.presentation
            .set_connection_status(ConnectionStatus::Disconnected);
        true
    }

    pub async fn pointer_down(&self, button: PointerButton, x: f64, y: f64) {
        let connected = self.connection.is_ready().await;
        self.inner
            .lock()
            .await
            .input
            .drag_start(connected, button, x, y);
    }

    /// The session lock is held across the send so messages leave in the
    /// order their events were processed.
    pub async fn pointer_move(&self, x: f64, y: f64) {
        let connected = self.connection.is_ready().await;
        let mut inner = self.inner.lock().await;
        let SessionState { camera, input, .. } = &mut *inner;
        let Some(message) = input.drag_move(connected, x, y, camera) else {
            return;
        };
        if let Err(err) = self.send(&message).await {
            warn!(error = %err, "dropping control message");
        }
    }

    pub async fn pointer_up(&self) {
        self.inner.lock().await.input.drag_end();
    }

    async fn send(&self, message: &ControlMessage) -> Result<(), ConnectionError> {
        match self.connection.send(message).await {
            Ok(_) => Ok(()),
            Err(err) => {
                if matches!(err, ConnectionError::Send(_)) {
                    self.presentation
                        .set_connection_status(ConnectionStatus::Disconnected);
                }
                Err(err)
            }
        }
    }

    fn spawn_dispatch(self: &Arc<Self>, mut inbound: Inbound) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let connection_id = inbound.connection_id();
            while let Some(message) = inbound.next_binary().await {
                match codec::decode_frame(message).await {
                    Ok(Some(frame)) => session.present(frame),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(connection_id, error = %err, "dropping undecodable frame");
                    }
                }
            }
            debug!(connection_id, "inbound stream ended");
            if session.connection.mark_closed(connection_id).await {
                session
                    .presentation
                    .set_connection_status(ConnectionStatus::Disconnected);
            }
        })
    }

    fn present(&self, frame: InboundFrame) {
        match frame {
            InboundFrame::Image(image) => {
                self.presentation
                    .set_canvas_size(image.width(), image.height());
                self.presentation.draw_image(&image);
            }
            InboundFrame::Telemetry { sample_count } => {
                self.presentation.set_sample_count_display(sample_count);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
