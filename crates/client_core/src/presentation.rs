//! Presentation sink contract and an in-memory canvas implementing it.

use std::sync::{PoisonError, RwLock};

use image::{imageops, RgbaImage};
use shared::domain::sanitize_digits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Where decoded frames go and where session inputs come from.
pub trait PresentationSink: Send + Sync {
    fn set_canvas_size(&self, width: u32, height: u32);
    fn draw_image(&self, image: &RgbaImage);
    fn set_sample_count_display(&self, sample_count: usize);
    fn set_connection_status(&self, status: ConnectionStatus);
    fn endpoint_url(&self) -> String;
    fn max_spp_input(&self) -> String;
}

#[derive(Default)]
struct CanvasState {
    pixels: RgbaImage,
    sample_count: Option<usize>,
    status: ConnectionStatus,
    endpoint_url: String,
    max_spp_input: String,
}

/// Thread-safe canvas holding the latest frame and the session form fields.
#[derive(Default)]
pub struct Canvas {
    state: RwLock<CanvasState>,
}

impl Canvas {
    pub fn new(endpoint_url: impl Into<String>, max_spp_input: &str) -> Self {
        Self {
            state: RwLock::new(CanvasState {
                endpoint_url: endpoint_url.into(),
                max_spp_input: sanitize_digits(max_spp_input),
                ..CanvasState::default()
            }),
        }
    }

    pub fn set_endpoint_url(&self, endpoint_url: impl Into<String>) {
        self.write().endpoint_url = endpoint_url.into();
    }

    /// Edits the budget field; non-digits are stripped on entry.
    pub fn set_max_spp_input(&self, raw: &str) {
        self.write().max_spp_input = sanitize_digits(raw);
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.read().pixels.dimensions()
    }

    pub fn pixels(&self) -> RgbaImage {
        self.read().pixels.clone()
    }

    pub fn sample_count(&self) -> Option<usize> {
        self.read().sample_count
    }

    pub fn status(&self) -> ConnectionStatus {
        self.read().status
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CanvasState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CanvasState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PresentationSink for Canvas {
    /// Resizing clears the canvas.
    fn set_canvas_size(&self, width: u32, height: u32) {
        self.write().pixels = RgbaImage::new(width, height);
    }

    fn draw_image(&self, image: &RgbaImage) {
        imageops::replace(&mut self.write().pixels, image, 0, 0);
    }

    fn set_sample_count_display(&self, sample_count: usize) {
        self.write().sample_count = Some(sample_count);
    }

    fn set_connection_status(&self, status: ConnectionStatus) {
        self.write().status = status;
    }

    fn endpoint_url(&self) -> String {
        self.read().endpoint_url.clone()
    }

    fn max_spp_input(&self) -> String {
        self.read().max_spp_input.clone()
    }
}
