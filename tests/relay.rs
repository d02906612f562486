//! End-to-end relay tests against a real listener.

#![allow(clippy::panic)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::{SinkExt, StreamExt};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use image_transceiver::config::TransceiverConfig;
use image_transceiver::domain::NotificationPayload;
use image_transceiver::lifecycle::{self, Transceiver};
use image_transceiver::ws::connection::ACKNOWLEDGEMENT;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn launch_started() -> (Transceiver, SocketAddr) {
    let config = TransceiverConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        restart_settle: Duration::from_millis(20),
        ..TransceiverConfig::default()
    };
    let transceiver = lifecycle::launch(config, &tokio::runtime::Handle::current());
    let Ok(status) = transceiver.lifecycle.start().await else {
        panic!("start should succeed");
    };
    let Some(addr) = status.local_addr else {
        panic!("listener should be bound after start returns");
    };
    (transceiver, addr)
}

async fn connect(addr: SocketAddr) -> Client {
    let Ok((client, _)) = connect_async(format!("ws://{addr}/")).await else {
        panic!("could not connect to {addr}");
    };
    client
}

async fn send_and_ack(client: &mut Client, frame: &str) {
    if let Err(err) = client.send(Message::text(frame.to_owned())).await {
        panic!("send failed: {err}");
    }
    let reply = tokio::time::timeout(Duration::from_secs(5), client.next()).await;
    let Ok(Some(Ok(Message::Text(text)))) = reply else {
        panic!("expected a text acknowledgement, got {reply:?}");
    };
    assert_eq!(text.as_str(), ACKNOWLEDGEMENT);
}

fn png_base64() -> String {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255])));
    let mut bytes = Vec::new();
    if let Err(err) = image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png) {
        panic!("png encoding failed: {err}");
    }
    STANDARD.encode(bytes)
}

fn free_port() -> u16 {
    let Ok(reserved) = std::net::TcpListener::bind("127.0.0.1:0") else {
        panic!("could not reserve a port");
    };
    let Ok(addr) = reserved.local_addr() else {
        panic!("reserved listener has no address");
    };
    addr.port()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn png_frame_is_published_once_and_becomes_current_image() {
    let (transceiver, addr) = launch_started().await;
    let mut notifications = transceiver.context.notifications.subscribe();
    let mut client = connect(addr).await;

    send_and_ack(&mut client, &png_base64()).await;

    let Ok(notification) = notifications.try_recv() else {
        panic!("expected one pict_cha notification");
    };
    let NotificationPayload::PictCha(uri) = &notification.payload else {
        panic!("expected pict_cha, got {:?}", notification.payload);
    };
    assert!(uri.starts_with("data:image/png;base64,"));
    assert!(notifications.try_recv().is_err(), "exactly one publish per image");

    let image = transceiver.context.current_image.snapshot();
    assert_eq!(image.dimensions(), (1, 1));
    assert_eq!(image.as_bytes(), &[10, 20, 30, 255]);

    let _ = transceiver.lifecycle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_frames_are_acknowledged_and_connection_survives() {
    let (transceiver, addr) = launch_started().await;
    let mut notifications = transceiver.context.notifications.subscribe();
    let before = transceiver.context.current_image.fingerprint();
    let mut client = connect(addr).await;

    send_and_ack(&mut client, "%%% definitely not base64 %%%").await;
    assert_eq!(transceiver.context.current_image.fingerprint(), before);

    send_and_ack(&mut client, r#"{"command": "dance"}"#).await;
    send_and_ack(&mut client, r#"{"command": "command"}"#).await;
    send_and_ack(&mut client, r#"{"no_command": true}"#).await;

    send_and_ack(&mut client, r#"{"command": "abort_workflow"}"#).await;

    // The malformed image frame still published its data URI first.
    let Ok(first) = notifications.try_recv() else {
        panic!("expected the data URI of the malformed frame");
    };
    assert_eq!(first.payload.key(), "pict_cha");
    let Ok(second) = notifications.try_recv() else {
        panic!("expected the forwarded command");
    };
    assert_eq!(
        second.payload,
        NotificationPayload::ComfyuiCommand("abort_workflow".to_string())
    );

    let _ = transceiver.lifecycle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_utf8_binary_frame_is_acknowledged() {
    let (transceiver, addr) = launch_started().await;
    let before = transceiver.context.current_image.fingerprint();
    let mut client = connect(addr).await;

    if let Err(err) = client.send(Message::binary(vec![0xff, 0xfe, 0x00])).await {
        panic!("send failed: {err}");
    }
    let reply = tokio::time::timeout(Duration::from_secs(5), client.next()).await;
    let Ok(Some(Ok(Message::Text(text)))) = reply else {
        panic!("expected a text acknowledgement, got {reply:?}");
    };
    assert_eq!(text.as_str(), ACKNOWLEDGEMENT);
    assert_eq!(transceiver.context.current_image.fingerprint(), before);

    send_and_ack(&mut client, r#"{"command": "config"}"#).await;

    let _ = transceiver.lifecycle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn config_port_restarts_listener_on_new_port() {
    let (transceiver, addr) = launch_started().await;
    let new_port = free_port();
    let mut client = connect(addr).await;

    let config = format!(r#"{{"command": "config", "port": {new_port}}}"#);
    if let Err(err) = client.send(Message::text(config)).await {
        panic!("send failed: {err}");
    }

    let mut restarted = None;
    for _ in 0..100 {
        if let Ok(status) = transceiver.lifecycle.report().await
            && status.running
            && status.local_addr.map(|a| a.port()) == Some(new_port)
        {
            restarted = Some(status);
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let Some(status) = restarted else {
        panic!("listener did not come back on port {new_port}");
    };
    assert_eq!(status.port, new_port);
    assert_eq!(transceiver.context.server_config.port().await, new_port);

    let Some(new_addr) = status.local_addr else {
        panic!("restarted listener should be bound");
    };
    let mut client = connect(new_addr).await;
    send_and_ack(&mut client, &png_base64()).await;

    let Ok(report) = transceiver.lifecycle.report().await else {
        panic!("report should succeed");
    };
    assert_eq!(report.port, new_port);

    let _ = transceiver.lifecycle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lifecycle_operations_are_idempotent() {
    let (transceiver, addr) = launch_started().await;

    let Ok(again) = transceiver.lifecycle.start().await else {
        panic!("second start should not fail");
    };
    assert_eq!(again.local_addr, Some(addr));

    let Ok(first) = transceiver.lifecycle.report().await else {
        panic!("report should succeed");
    };
    let Ok(second) = transceiver.lifecycle.report().await else {
        panic!("report should succeed");
    };
    assert_eq!(first, second);

    let Ok(stopped) = transceiver.lifecycle.stop().await else {
        panic!("stop should succeed");
    };
    assert!(!stopped.running);
    let Ok(stopped_again) = transceiver.lifecycle.stop().await else {
        panic!("stop when stopped should be a no-op");
    };
    assert_eq!(stopped, stopped_again);

    let _ = transceiver.lifecycle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_closes_open_connections() {
    let (transceiver, addr) = launch_started().await;
    let mut client = connect(addr).await;
    send_and_ack(&mut client, r#"{"command": "config"}"#).await;

    let Ok(status) = transceiver.lifecycle.stop().await else {
        panic!("stop should succeed");
    };
    assert!(!status.running);

    let next = tokio::time::timeout(Duration::from_secs(5), client.next()).await;
    let Ok(next) = next else {
        panic!("connection should end after stop");
    };
    assert!(!matches!(next, Some(Ok(Message::Text(_)))));

    let _ = transceiver.lifecycle.shutdown().await;
}
