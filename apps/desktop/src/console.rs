//! Terminal presentation: a [`Canvas`] that also reports what changed.

use client_core::{Canvas, ConnectionPhase, ConnectionStatus, PresentationSink};
use image::RgbaImage;
use shared::domain::{CameraState, RenderConfig};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    StatusChanged(ConnectionStatus),
    FrameDrawn { width: u32, height: u32 },
    SampleCount(usize),
}

pub struct ConsoleSink {
    canvas: Canvas,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl ConsoleSink {
    pub fn new(canvas: Canvas) -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { canvas, events }, rx)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn emit(&self, event: UiEvent) {
        // The receiver goes away only during shutdown.
        let _ = self.events.send(event);
    }
}

impl PresentationSink for ConsoleSink {
    fn set_canvas_size(&self, width: u32, height: u32) {
        self.canvas.set_canvas_size(width, height);
    }

    fn draw_image(&self, image: &RgbaImage) {
        self.canvas.draw_image(image);
        let (width, height) = self.canvas.dimensions();
        self.emit(UiEvent::FrameDrawn { width, height });
    }

    fn set_sample_count_display(&self, sample_count: usize) {
        self.canvas.set_sample_count_display(sample_count);
        self.emit(UiEvent::SampleCount(sample_count));
    }

    fn set_connection_status(&self, status: ConnectionStatus) {
        if self.canvas.status() == status {
            return;
        }
        self.canvas.set_connection_status(status);
        self.emit(UiEvent::StatusChanged(status));
    }

    fn endpoint_url(&self) -> String {
        self.canvas.endpoint_url()
    }

    fn max_spp_input(&self) -> String {
        self.canvas.max_spp_input()
    }
}

/// True once the renderer has reported the full sample budget. An empty
/// budget never completes.
pub fn budget_reached(config: &RenderConfig, sample_count: usize) -> bool {
    match config.max_spp_value() {
        Some(budget) => u64::try_from(sample_count).is_ok_and(|count| count >= budget),
        None => false,
    }
}

pub fn status_label(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Disconnected => "disconnected",
        ConnectionStatus::Connecting => "connecting",
        ConnectionStatus::Connected => "connected",
    }
}

/// Multi-line answer to the `status` command.
pub fn status_report(camera: &CameraState, phase: ConnectionPhase, canvas: &Canvas) -> String {
    let (width, height) = canvas.dimensions();
    let samples = canvas
        .sample_count()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".into());
    format!(
        "status: {} (phase {phase:?})\n\
         camera: theta={:.4} phi={:.4} moveX={:.4} moveY={:.4}\n\
         canvas: {width}x{height}, samples: {samples}\n\
         endpoint: {}, max spp: '{}'",
        status_label(canvas.status()),
        camera.theta,
        camera.phi,
        camera.pan_x,
        camera.pan_y,
        canvas.endpoint_url(),
        canvas.max_spp_input(),
    )
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
