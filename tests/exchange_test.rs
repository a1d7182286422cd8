use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use base64::{engine::general_purpose, Engine as _};
use ndarray::{ArrayD, IxDyn};
use serde_json::{json, Value};

use oxley_bridge::client::{NON_JSON_MESSAGE, PUSH_STATUS};
use oxley_bridge::common::envelope;
use oxley_bridge::node::{NodeAdapter, WebsocketDownloadImageNode, WebsocketReceiveJsonNode};
use oxley_bridge::server::{image_message, OneShotPeer};
use oxley_bridge::{BridgeError, Exchange, ImageCodec};

fn sample_jpeg(height: usize, width: usize, level: f32) -> Vec<u8> {
    let tensor = ArrayD::<f32>::from_elem(IxDyn(&[height, width, 3]), level);
    ImageCodec::default().encode(tensor.view()).unwrap()
}

/// Spawn a peer that sends `payload` to the first client and return its URL.
/// Joining the handle tells whether the client sent a close frame.
fn serve(payload: String) -> (String, thread::JoinHandle<bool>) {
    let peer = OneShotPeer::bind("127.0.0.1:0").unwrap();
    let url = peer.url();
    let handle = thread::spawn(move || peer.send_one(payload).unwrap());
    (url, handle)
}

#[test]
fn test_pull_image_with_data_uri() {
    let (url, peer) = serve(image_message(&sample_jpeg(30, 40, 0.6), true));

    let image = Exchange::default().pull_image(&url).unwrap().unwrap();
    assert!(peer.join().unwrap(), "client must close the session");

    let batch = image.into_batched();
    assert_eq!(batch.shape(), &[1, 30, 40, 3]);
    assert!(batch.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_pull_image_non_json_is_no_result() {
    let (url, peer) = serve("not valid json".to_string());

    let result = Exchange::default().pull_image(&url).unwrap();
    assert!(peer.join().unwrap(), "client must close the session");

    assert!(result.is_none());
}

#[test]
fn test_pull_image_without_image_key_is_no_result() {
    let (url, peer) = serve(r#"{"other": 1}"#.to_string());

    let result = Exchange::default().pull_image(&url).unwrap();
    assert!(peer.join().unwrap(), "client must close the session");

    assert!(result.is_none());
}

#[test]
fn test_pull_image_undecodable_is_no_result() {
    let payload = json!({"image": format!("data:image/jpeg;base64,{}", general_purpose::STANDARD.encode(b"not a jpeg"))});
    let (url, peer) = serve(payload.to_string());

    let result = Exchange::default().pull_image(&url).unwrap();
    assert!(peer.join().unwrap(), "client must close the session");

    assert!(result.is_none());
}

#[test]
fn test_pull_image_peer_hangs_up_is_connection_error() {
    let peer = OneShotPeer::bind("127.0.0.1:0").unwrap();
    let url = peer.url();
    let handle = thread::spawn(move || peer.hang_up().unwrap());

    let err = Exchange::default().pull_image(&url).unwrap_err();
    handle.join().unwrap();

    assert!(matches!(err, BridgeError::Connection(_)));
}

#[test]
fn test_pull_from_unreachable_endpoint_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    drop(listener);

    assert!(matches!(
        Exchange::default().pull_image(&url),
        Err(BridgeError::Connection(_))
    ));
}

#[test]
fn test_push_channel_first_mid_gray() {
    let peer = OneShotPeer::bind("127.0.0.1:0").unwrap();
    let url = peer.url();
    let handle = thread::spawn(move || peer.receive_one().unwrap());

    let tensor = ArrayD::<f32>::from_elem(IxDyn(&[3, 64, 64]), 0.5);
    let status = Exchange::default().push_image(&url, tensor.view()).unwrap();
    let message = handle.join().unwrap();

    assert_eq!(status, PUSH_STATUS);

    let fields = envelope::unwrap(message.as_bytes()).unwrap();
    let encoded = fields["image"].as_str().unwrap();
    let jpeg = general_purpose::STANDARD.decode(encoded).unwrap();
    let decoded = ImageCodec::default().decode(&jpeg).unwrap();

    assert_eq!((decoded.height(), decoded.width()), (64, 64));
    for &v in decoded.pixels().iter() {
        assert!((v * 255.0 - 127.0).abs() <= 3.0);
    }
}

#[test]
fn test_push_then_pull_round_trip() {
    let exchange = Exchange::default();

    let receiver = OneShotPeer::bind("127.0.0.1:0").unwrap();
    let push_url = receiver.url();
    let received = thread::spawn(move || receiver.receive_one().unwrap());

    let tensor = ArrayD::<f32>::from_elem(IxDyn(&[1, 20, 24, 3]), 0.3);
    exchange.push_image(&push_url, tensor.view()).unwrap();
    let message = received.join().unwrap();

    // Relay the pushed envelope unchanged to a puller.
    let (pull_url, sender) = serve(message);
    let image = exchange.pull_image(&pull_url).unwrap().unwrap();
    sender.join().unwrap();

    assert_eq!((image.height(), image.width()), (20, 24));
    assert!(image.pixels().iter().all(|&v| (v - 0.3).abs() <= 10.0 / 255.0));
}

#[test]
fn test_pull_fields_with_missing_field() {
    let (url, peer) = serve(r#"{"a":"x","b":"y"}"#.to_string());

    let fields = Exchange::default().pull_fields(&url, ["a", "b", "c"]).unwrap();
    assert!(peer.join().unwrap(), "client must close the session");

    assert_eq!(fields, (json!("x"), json!("y"), json!("N/A")));
}

#[test]
fn test_pull_fields_keeps_value_types() {
    let (url, peer) = serve(r#"{"seed": 7, "tags": ["a", "b"], "ok": true}"#.to_string());

    let (seed, tags, ok) = Exchange::default()
        .pull_fields(&url, ["seed", "tags", "ok"])
        .unwrap();
    peer.join().unwrap();

    assert_eq!(seed, json!(7));
    assert_eq!(tags, json!(["a", "b"]));
    assert_eq!(ok, Value::Bool(true));
}

#[test]
fn test_pull_fields_non_json_reports_in_first_slot() {
    let (url, peer) = serve("plain text".to_string());

    let fields = Exchange::default().pull_fields(&url, ["a", "b", "c"]).unwrap();
    assert!(peer.join().unwrap(), "client must close the session");

    assert_eq!(fields, (json!(NON_JSON_MESSAGE), json!(""), json!("")));
}

#[test]
fn test_download_image_over_http() {
    let jpeg = sample_jpeg(8, 10, 0.9);
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/frame.jpg", listener.local_addr().unwrap());
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = [0u8; 1024];
        let _ = stream.read(&mut request);
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            jpeg.len()
        )
        .unwrap();
        stream.write_all(&jpeg).unwrap();
    });

    let image = Exchange::default().download_image(&url).unwrap();
    server.join().unwrap();

    assert_eq!((image.height(), image.width(), image.channels()), (8, 10, 3));
}

#[test]
fn test_nodes_run_through_exchange() {
    let exchange = Exchange::default();

    let (url, peer) = serve(image_message(&sample_jpeg(6, 9, 0.1), false));
    let batch = WebsocketDownloadImageNode.run(&exchange, &url).unwrap().unwrap();
    peer.join().unwrap();
    assert_eq!(batch.shape(), &[1, 6, 9, 3]);

    let (url, peer) = serve(r#"{"first": "one"}"#.to_string());
    let node = WebsocketReceiveJsonNode;
    let (first, second, _) = node.run(&exchange, &url, "first", "second", "third").unwrap();
    peer.join().unwrap();
    assert_eq!(first, json!("one"));
    assert_eq!(second, json!("N/A"));
    assert_eq!(node.declare_outputs().len(), 3);
}
