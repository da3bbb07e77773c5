//! Inbound frame decoding and outbound control encoding.

use image::RgbaImage;
use shared::{
    error::ProtocolError,
    protocol::{split_frame, ControlMessage, FrameTag},
};
use tracing::trace;

use crate::error::FrameDecodeError;

/// Typed payload of one inbound binary message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Image(RgbaImage),
    Telemetry { sample_count: usize },
}

pub fn encode(message: &ControlMessage) -> Result<String, ProtocolError> {
    message.to_json()
}

/// Decodes one inbound message.
///
/// Returns `Ok(None)` for messages that carry no recognised tag. The sample
/// count of a telemetry frame is the payload length; its bytes are never read.
/// Image payloads are decoded on the blocking pool and own their bytes, so
/// concurrent decodes never share a buffer.
pub async fn decode_frame(message: Vec<u8>) -> Result<Option<InboundFrame>, FrameDecodeError> {
    let Some((tag, payload)) = split_frame(&message) else {
        trace!(len = message.len(), "ignoring message shorter than a frame tag");
        return Ok(None);
    };

    match tag {
        FrameTag::Image => {
            let header_len = message.len() - payload.len();
            let image =
                tokio::task::spawn_blocking(move || decode_image(&message[header_len..])).await??;
            Ok(Some(InboundFrame::Image(image)))
        }
        FrameTag::Telemetry => Ok(Some(InboundFrame::Telemetry {
            sample_count: payload.len(),
        })),
        FrameTag::Unrecognized(tag) => {
            trace!(tag = %String::from_utf8_lossy(&tag), "ignoring frame with unrecognized tag");
            Ok(None)
        }
    }
}

pub fn decode_image(payload: &[u8]) -> Result<RgbaImage, image::ImageError> {
    Ok(image::load_from_memory(payload)?.to_rgba8())
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
