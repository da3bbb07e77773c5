use image::Rgba;

use super::*;

fn drain(rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[test]
fn frames_and_telemetry_reach_canvas_and_events() {
    let (sink, mut rx) = ConsoleSink::new(Canvas::new("ws://127.0.0.1:8030", "64"));

    sink.set_canvas_size(4, 3);
    sink.draw_image(&RgbaImage::from_pixel(4, 3, Rgba([9, 8, 7, 255])));
    sink.set_sample_count_display(12);

    assert_eq!(sink.canvas().dimensions(), (4, 3));
    assert_eq!(sink.canvas().sample_count(), Some(12));
    assert_eq!(
        drain(&mut rx),
        vec![
            UiEvent::FrameDrawn { width: 4, height: 3 },
            UiEvent::SampleCount(12),
        ]
    );
}

#[test]
fn repeated_status_is_reported_once() {
    let (sink, mut rx) = ConsoleSink::new(Canvas::default());

    sink.set_connection_status(ConnectionStatus::Disconnected);
    sink.set_connection_status(ConnectionStatus::Connecting);
    sink.set_connection_status(ConnectionStatus::Connected);
    sink.set_connection_status(ConnectionStatus::Connected);
    sink.set_connection_status(ConnectionStatus::Disconnected);

    assert_eq!(
        drain(&mut rx),
        vec![
            UiEvent::StatusChanged(ConnectionStatus::Connecting),
            UiEvent::StatusChanged(ConnectionStatus::Connected),
            UiEvent::StatusChanged(ConnectionStatus::Disconnected),
        ]
    );
    assert_eq!(status_label(sink.canvas().status()), "disconnected");
}

#[test]
fn form_fields_come_from_canvas() {
    let (sink, _rx) = ConsoleSink::new(Canvas::new("ws://render:8030", "1k6"));
    assert_eq!(sink.endpoint_url(), "ws://render:8030");
    assert_eq!(sink.max_spp_input(), "16");

    sink.canvas().set_max_spp_input("2x0");
    assert_eq!(sink.max_spp_input(), "20");
}

#[test]
fn budget_completion() {
    let budget = RenderConfig::from_input("16");
    assert!(!budget_reached(&budget, 15));
    assert!(budget_reached(&budget, 16));
    assert!(budget_reached(&budget, 40));
    assert!(!budget_reached(&RenderConfig::from_input(""), usize::MAX));
}

#[test]
fn status_report_reads_canvas_fields() {
    let canvas = Canvas::new("ws://render:8030", "3a2");
    canvas.set_canvas_size(8, 2);
    canvas.set_sample_count_display(5);
    let camera = CameraState {
        theta: 0.5,
        phi: -0.25,
        pan_x: 1.0,
        pan_y: 0.0,
    };

    let report = status_report(&camera, ConnectionPhase::Closed, &canvas);
    assert_eq!(
        report,
        "status: disconnected (phase Closed)\n\
         camera: theta=0.5000 phi=-0.2500 moveX=1.0000 moveY=0.0000\n\
         canvas: 8x2, samples: 5\n\
         endpoint: ws://render:8030, max spp: '32'"
    );
    assert!(status_report(&CameraState::default(), ConnectionPhase::Open, &Canvas::default())
        .contains("samples: -"));
}
