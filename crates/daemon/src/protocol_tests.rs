// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol unit tests

use super::*;

#[test]
fn chat_request_survives_encoding() {
    let request = Request::Chat {
        user: "mod_mia".to_string(),
        level: AuthorizationLevel::Moderator,
        text: "!activate bubbles".to_string(),
    };

    let encoded = encode(&request).expect("encode failed");
    let decoded: Request = decode(&encoded).expect("decode failed");

    assert_eq!(request, decoded);
}

#[test]
fn requests_are_tagged_by_type() {
    let encoded = encode(&Request::Status).expect("encode failed");
    let json: serde_json::Value = serde_json::from_slice(&encoded).expect("valid json");

    assert_eq!(json, serde_json::json!({ "type": "Status" }));
}

#[test]
fn donation_message_defaults_to_empty() {
    let decoded: Request =
        decode(br#"{"type":"Donation","name":"dana","amount":5.0}"#).expect("decode failed");

    assert_eq!(
        decoded,
        Request::Donation {
            name: "dana".to_string(),
            amount: 5.0,
            message: String::new(),
        }
    );
}

#[test]
fn status_response_keeps_fields() {
    let response = Response::Status {
        uptime_secs: 3600,
        enabled: true,
        active: false,
        blast_duration: 10.0,
        donation_threshold: 5.0,
    };

    let encoded = encode(&response).expect("encode failed");
    let decoded: Response = decode(&encoded).expect("decode failed");

    assert_eq!(response, decoded);
}

#[test]
fn unknown_device_state_is_null() {
    let encoded = encode(&Response::DeviceState { on: None }).expect("encode failed");
    let json: serde_json::Value = serde_json::from_slice(&encoded).expect("valid json");

    assert_eq!(json["on"], serde_json::Value::Null);
}

#[test]
fn encode_returns_json_without_length_prefix() {
    let response = Response::Ok;
    let encoded = encode(&response).expect("encode failed");

    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(
        json_str.starts_with('{'),
        "should be JSON object: {}",
        json_str
    );
}

#[test]
fn unknown_request_type_is_rejected() {
    let result: Result<Request, _> = decode(br#"{"type":"Launch"}"#);
    assert!(matches!(result, Err(ProtocolError::Json(_))));
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original)
        .await
        .expect("write failed");

    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data)
        .await
        .expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;

    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn empty_stream_reads_as_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());

    let result = read_message(&mut cursor).await;

    assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));
}

#[tokio::test]
async fn oversized_frame_is_refused() {
    let len = (MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes();
    let mut cursor = std::io::Cursor::new(len.to_vec());

    let result = read_message(&mut cursor).await;

    assert!(matches!(result, Err(ProtocolError::MessageTooLarge { .. })));
}

#[tokio::test]
async fn read_request_decodes_frame() {
    let mut buffer = Vec::new();
    let data = encode(&Request::Ping).expect("encode failed");
    write_message(&mut buffer, &data)
        .await
        .expect("write failed");

    let mut cursor = std::io::Cursor::new(buffer);
    let request = read_request(&mut cursor, DEFAULT_TIMEOUT)
        .await
        .expect("read failed");

    assert_eq!(request, Request::Ping);
}
