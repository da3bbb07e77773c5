/// Scale applied to every pointer delta before it touches the camera.
pub const DRAG_SENSITIVITY: f64 = 0.01;

/// Orbit angles and pan offsets of the remote camera.
///
/// Values are unbounded: angles never wrap and pan offsets are never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraState {
    pub theta: f64,
    pub phi: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl CameraState {
    pub fn apply_orbit_delta(&mut self, dx: f64, dy: f64) {
        self.theta += dx * DRAG_SENSITIVITY;
        self.phi += dy * DRAG_SENSITIVITY;
    }

    /// Horizontal pan moves against the drag direction, vertical pan follows it.
    pub fn apply_pan_delta(&mut self, dx: f64, dy: f64) {
        self.pan_x -= dx * DRAG_SENSITIVITY;
        self.pan_y += dy * DRAG_SENSITIVITY;
    }
}

/// Sampling budget sent with every session snapshot.
///
/// `max_spp` only ever holds ASCII digits. An empty budget means the renderer
/// keeps refining until the session is restarted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderConfig {
    max_spp: String,
}

impl RenderConfig {
    pub fn from_input(raw: &str) -> Self {
        Self {
            max_spp: sanitize_digits(raw),
        }
    }

    pub fn max_spp(&self) -> &str {
        &self.max_spp
    }

    pub fn max_spp_value(&self) -> Option<u64> {
        self.max_spp.parse().ok()
    }
}

/// Strips every non-digit character, e.g. `"12a3b"` becomes `"123"`.
pub fn sanitize_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
