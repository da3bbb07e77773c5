use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use shared::protocol::{encode_frame, telemetry_frame, IMAGE_FRAME_TAG};

use super::*;

fn encoded_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

fn encoded_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([90, 90, 90]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .expect("encode jpeg");
    bytes
}

#[tokio::test]
async fn image_frame_decodes_to_intrinsic_dimensions() {
    let message = encode_frame(IMAGE_FRAME_TAG, &encoded_png(7, 3));
    let frame = decode_frame(message).await.expect("decode").expect("frame");
    let InboundFrame::Image(image) = frame else {
        panic!("expected image frame, got {frame:?}");
    };
    assert_eq!(image.dimensions(), (7, 3));
    assert_eq!(*image.get_pixel(6, 2), Rgba([200, 100, 50, 255]));
}

#[tokio::test]
async fn jpeg_payloads_are_accepted() {
    let message = encode_frame(IMAGE_FRAME_TAG, &encoded_jpeg(16, 9));
    let frame = decode_frame(message).await.expect("decode").expect("frame");
    assert!(matches!(frame, InboundFrame::Image(ref image) if image.dimensions() == (16, 9)));
}

#[tokio::test]
async fn telemetry_sample_count_is_payload_length() {
    for sample_count in [0usize, 1, 64, 4096] {
        let frame = decode_frame(telemetry_frame(sample_count))
            .await
            .expect("decode")
            .expect("frame");
        assert_eq!(frame, InboundFrame::Telemetry { sample_count });
    }
}

#[tokio::test]
async fn telemetry_payload_content_is_never_parsed() {
    let frame = decode_frame(b"000142".to_vec())
        .await
        .expect("decode")
        .expect("frame");
    assert_eq!(frame, InboundFrame::Telemetry { sample_count: 2 });
}

#[tokio::test]
async fn unrecognized_tags_and_short_messages_are_ignored() {
    assert_eq!(decode_frame(b"0002payload".to_vec()).await.expect("decode"), None);
    assert_eq!(decode_frame(b"abcd".to_vec()).await.expect("decode"), None);
    assert_eq!(decode_frame(b"00".to_vec()).await.expect("decode"), None);
    assert_eq!(decode_frame(Vec::new()).await.expect("decode"), None);
}

#[tokio::test]
async fn corrupt_image_payload_is_an_error() {
    let err = decode_frame(encode_frame(IMAGE_FRAME_TAG, b"not an image"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, FrameDecodeError::Image(_)), "unexpected error: {err}");
}

#[test]
fn encode_delegates_to_wire_format() {
    let message = ControlMessage::Orbit {
        theta: 0.5,
        phi: 0.0,
    };
    assert_eq!(encode(&message).expect("encode"), r#"{"theta":0.5,"phi":0.0}"#);
}
