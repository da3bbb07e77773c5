//! Pointer drags to camera mutations and control messages.

use shared::{domain::CameraState, protocol::ControlMessage};

/// Pointer button as reported by the event source (DOM numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other(i16),
}

impl PointerButton {
    pub fn from_id(id: i16) -> Self {
        match id {
            0 => Self::Primary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveButton {
    #[default]
    None,
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerDragState {
    pub active_button: ActiveButton,
    pub last_x: f64,
    pub last_y: f64,
}

#[derive(Debug, Default)]
pub struct InputTranslator {
    drag: PointerDragState,
}

impl InputTranslator {
    pub fn drag_state(&self) -> PointerDragState {
        self.drag
    }

    /// Starts tracking a drag. Ignored entirely while disconnected; input is
    /// never buffered for later replay.
    pub fn drag_start(&mut self, connected: bool, button: PointerButton, x: f64, y: f64) {
        if !connected {
            return;
        }
        self.drag = PointerDragState {
            active_button: match button {
                PointerButton::Primary => ActiveButton::Primary,
                PointerButton::Secondary => ActiveButton::Secondary,
                PointerButton::Other(_) => ActiveButton::None,
            },
            last_x: x,
            last_y: y,
        };
    }

    /// Applies the delta since the previous move and returns the message to
    /// send for it, if any.
    pub fn drag_move(
        &mut self,
        connected: bool,
        x: f64,
        y: f64,
        camera: &mut CameraState,
    ) -> Option<ControlMessage> {
        if !connected {
            return None;
        }
        let (dx, dy) = (x - self.drag.last_x, y - self.drag.last_y);
        let message = match self.drag.active_button {
            ActiveButton::None => return None,
            ActiveButton::Primary => {
                camera.apply_orbit_delta(dx, dy);
                ControlMessage::orbit(camera)
            }
            ActiveButton::Secondary => {
                camera.apply_pan_delta(dx, dy);
                ControlMessage::pan(camera)
            }
        };
        self.drag.last_x = x;
        self.drag.last_y = y;
        Some(message)
    }

    pub fn drag_end(&mut self) {
        self.drag.active_button = ActiveButton::None;
    }
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
