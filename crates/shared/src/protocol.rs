//! Wire records exchanged with the remote renderer.
//!
//! Client to server traffic is JSON text. Server to client traffic is binary:
//! a 4-byte ASCII tag followed by the payload.

use serde::Serialize;

use crate::{
    domain::{CameraState, RenderConfig},
    error::ProtocolError,
};

pub const TAG_LEN: usize = 4;
pub const IMAGE_FRAME_TAG: [u8; TAG_LEN] = *b"0000";
pub const TELEMETRY_FRAME_TAG: [u8; TAG_LEN] = *b"0001";

/// Control record sent to the renderer.
///
/// Drag updates carry only the axis pair they changed; the snapshot carries
/// everything the renderer needs to re-anchor a session. All values are
/// cumulative camera state, not per-event deltas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlMessage {
    Snapshot {
        theta: f64,
        phi: f64,
        #[serde(rename = "moveX")]
        move_x: f64,
        #[serde(rename = "moveY")]
        move_y: f64,
        #[serde(rename = "maxSpp")]
        max_spp: String,
    },
    Orbit {
        theta: f64,
        phi: f64,
    },
    Pan {
        #[serde(rename = "moveX")]
        move_x: f64,
        #[serde(rename = "moveY")]
        move_y: f64,
    },
}

impl ControlMessage {
    pub fn snapshot(camera: &CameraState, config: &RenderConfig) -> Self {
        Self::Snapshot {
            theta: camera.theta,
            phi: camera.phi,
            move_x: camera.pan_x,
            move_y: camera.pan_y,
            max_spp: config.max_spp().to_string(),
        }
    }

    pub fn orbit(camera: &CameraState) -> Self {
        Self::Orbit {
            theta: camera.theta,
            phi: camera.phi,
        }
    }

    pub fn pan(camera: &CameraState) -> Self {
        Self::Pan {
            move_x: camera.pan_x,
            move_y: camera.pan_y,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTag {
    Image,
    Telemetry,
    Unrecognized([u8; TAG_LEN]),
}

impl FrameTag {
    pub fn from_bytes(tag: [u8; TAG_LEN]) -> Self {
        match tag {
            IMAGE_FRAME_TAG => Self::Image,
            TELEMETRY_FRAME_TAG => Self::Telemetry,
            other => Self::Unrecognized(other),
        }
    }
}

/// Splits an inbound binary message into its tag and payload.
///
/// Returns `None` when the message is too short to carry a tag.
pub fn split_frame(message: &[u8]) -> Option<(FrameTag, &[u8])> {
    let (tag, payload) = message.split_first_chunk::<TAG_LEN>()?;
    Some((FrameTag::from_bytes(*tag), payload))
}

/// Builds a binary frame the way the renderer does. Telemetry payloads are
/// `sample_count` filler bytes.
pub fn encode_frame(tag: [u8; TAG_LEN], payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(TAG_LEN + payload.len());
    frame.extend_from_slice(&tag);
    frame.extend_from_slice(payload);
    frame
}

pub fn telemetry_frame(sample_count: usize) -> Vec<u8> {
    encode_frame(TELEMETRY_FRAME_TAG, &vec![0u8; sample_count])
}
