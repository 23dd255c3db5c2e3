//! Integration tests for register_tag against a loopback server.
//!
//! Each test runs a one-connection server that reads the request frame and
//! answers with raw bytes, so malformed and truncated answers can be sent
//! exactly as a broken server would.

use std::time::Duration;

use rstest::rstest;
use tagbridge_core::{Error, Rarity, TagUid, UnitKind};
use tagbridge_network::{RegistrationError, TcpClientConfig, TcpClientError, register_tag};
use tagbridge_protocol::{MessageType, RegistrationRequest, RegistrationStatus};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

fn request() -> RegistrationRequest {
    let uid = TagUid::from_hex("ABCDEF01").unwrap();
    RegistrationRequest::new(uid, UnitKind::Cat, Rarity::Rare)
}

/// Serve one connection: capture the request frame, reply with `reply`,
/// then report whether the client closed its side.
async fn serve_once(reply: Vec<u8>) -> (TcpClientConfig, oneshot::Receiver<(Vec<u8>, bool)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut header = [0u8; 5];
        stream.read_exact(&mut header).await.unwrap();
        let len = u16::from_be_bytes([header[3], header[4]]) as usize;
        let mut frame = header.to_vec();
        frame.resize(5 + len, 0);
        stream.read_exact(&mut frame[5..]).await.unwrap();

        stream.write_all(&reply).await.unwrap();
        stream.shutdown().await.unwrap();

        let mut rest = Vec::new();
        let closed = matches!(stream.read_to_end(&mut rest).await, Ok(0));
        let _ = tx.send((frame, closed));
    });

    let config =
        TcpClientConfig::new("127.0.0.1", addr.port()).with_timeout(Duration::from_secs(2));
    (config, rx)
}

fn data_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x4A, 0x4D, 0x91];
    frame.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

#[tokio::test]
async fn test_request_bytes_on_the_wire() {
    let reply = data_frame(&[0x04, 0xAB, 0xCD, 0xEF, 0x01, 0x00, 0x02, 0x01]);
    let (config, rx) = serve_once(reply).await;

    register_tag(&config, request()).await.unwrap();

    let (frame, _) = rx.await.unwrap();
    assert_eq!(
        frame,
        vec![0x4A, 0x4D, 0x12, 0x00, 0x07, 0x04, 0xAB, 0xCD, 0xEF, 0x01, 0x02, 0x01]
    );
}

#[tokio::test]
async fn test_success_with_abilities() {
    let payload = [
        0x04, 0xAB, 0xCD, 0xEF, 0x01, 0x00, 0x02, 0x01, 0x03, 0x01, 0xFF, 0x00, 0x07, 0x02, 0xFF,
        0x00,
    ];
    let (config, rx) = serve_once(data_frame(&payload)).await;

    let response = register_tag(&config, request()).await.unwrap();
    assert_eq!(response.status, RegistrationStatus::Ok);
    assert_eq!(response.type_index, Some(2));
    assert_eq!(response.rarity, Some(1));
    assert_eq!(response.active_abilities().count(), 2);

    let (_, closed) = rx.await.unwrap();
    assert!(closed, "client must close the connection");
}

#[tokio::test]
async fn test_minimal_success_response() {
    let (config, _rx) = serve_once(data_frame(&[0x01, 0xAB, 0x00, 0x02, 0x01])).await;
    let response = register_tag(&config, request()).await.unwrap();
    assert!(response.is_success());
}

#[tokio::test]
async fn test_rejected_status() {
    let (config, rx) = serve_once(data_frame(&[0x04, 0xAB, 0xCD, 0xEF, 0x01, 0x03])).await;

    let err = register_tag(&config, request()).await.unwrap_err();
    assert!(matches!(err, RegistrationError::Rejected { status: 3, .. }));

    let (_, closed) = rx.await.unwrap();
    assert!(closed);
}

#[tokio::test]
async fn test_unexpected_response_type() {
    let reply = vec![0x4A, 0x4D, 0x12, 0x00, 0x01, 0x00];
    let (config, rx) = serve_once(reply).await;

    let err = register_tag(&config, request()).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::UnexpectedResponse(MessageType::NfcRegister)
    ));
    assert!(rx.await.unwrap().1);
}

#[rstest]
#[case::bad_magic(b"HTTP/1.1 400\r\n".to_vec())]
#[case::swapped_magic(vec![0x4D, 0x4A, 0x91, 0x00, 0x00])]
#[tokio::test]
async fn test_bad_magic_is_protocol_error(#[case] reply: Vec<u8>) {
    let (config, _rx) = serve_once(reply).await;

    let err = register_tag(&config, request()).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Transport(TcpClientError::Protocol(Error::BadMagic { .. }))
    ));
}

#[rstest]
#[case::mid_header(vec![0x4A, 0x4D, 0x91])]
#[case::mid_payload(vec![0x4A, 0x4D, 0x91, 0x00, 0x08, 0x04, 0xAB])]
#[case::nothing(Vec::new())]
#[tokio::test]
async fn test_server_closes_early(#[case] reply: Vec<u8>) {
    let (config, _rx) = serve_once(reply).await;

    let err = register_tag(&config, request()).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Transport(TcpClientError::ConnectionLost(_))
    ));
}

#[tokio::test]
async fn test_response_without_status() {
    let (config, _rx) = serve_once(data_frame(&[0x04, 0xAB, 0xCD, 0xEF, 0x01])).await;

    let err = register_tag(&config, request()).await.unwrap_err();
    assert!(matches!(err, RegistrationError::Malformed(_)));
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        // Read the request, never answer; wait for the client to give up
        let mut sink = Vec::new();
        let _ = stream.read_to_end(&mut sink).await;
    });

    let config =
        TcpClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_millis(200));
    let err = register_tag(&config, request()).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Transport(TcpClientError::ReadTimeout(200))
    ));
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then drop to get a port with nothing listening
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let config =
        TcpClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_millis(500));
    let err = register_tag(&config, request()).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Transport(TcpClientError::Io(_))
    ));
}
