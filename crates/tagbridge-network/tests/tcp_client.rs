//! TcpClient against a framed loopback server.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tagbridge_network::{TcpClient, TcpClientConfig, TcpClientError};
use tagbridge_protocol::{FrameCodec, Message, MessageType};
use tokio::net::TcpListener;
use tokio_util::codec::Framed;

/// Echo server: answers every frame with an `NfcData` frame carrying the
/// same payload.
async fn echo_server() -> TcpClientConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, FrameCodec::new());
        while let Some(Ok(message)) = framed.next().await {
            let reply = Message::new(MessageType::NfcData, message.payload).unwrap();
            if framed.send(reply).await.is_err() {
                break;
            }
        }
    });

    TcpClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn test_connect_send_recv_close() {
    let mut client = TcpClient::new(echo_server().await);
    client.connect().await.unwrap();
    assert!(client.is_connected());

    let request = Message::new(MessageType::NfcRegister, vec![0x01, 0xAB, 0x02, 0x01]).unwrap();
    client.send(request).await.unwrap();

    let reply = client.recv().await.unwrap();
    assert_eq!(reply.message_type, MessageType::NfcData);
    assert_eq!(&reply.payload[..], &[0x01, 0xAB, 0x02, 0x01]);

    client.close().await.unwrap();
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_several_exchanges_on_one_connection() {
    let mut client = TcpClient::new(echo_server().await);
    client.connect().await.unwrap();

    for n in 0..5u8 {
        let request = Message::new(MessageType::NfcRegister, vec![n; n as usize]).unwrap();
        client.send(request).await.unwrap();
        let reply = client.recv().await.unwrap();
        assert_eq!(reply.payload_len(), n as usize);
    }

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_large_frame_round_trip() {
    let mut client = TcpClient::new(echo_server().await);
    client.connect().await.unwrap();

    let payload: Vec<u8> = (0..4096u32).map(|i| i as u8).collect();
    let request = Message::new(MessageType::Other(0x20), payload.clone()).unwrap();
    client.send(request).await.unwrap();

    let reply = client.recv().await.unwrap();
    assert_eq!(&reply.payload[..], &payload[..]);
}

#[tokio::test]
async fn test_recv_after_server_hangs_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let config = TcpClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_secs(2));
    let mut client = TcpClient::new(config);
    client.connect().await.unwrap();

    assert!(matches!(
        client.recv().await,
        Err(TcpClientError::ConnectionLost(_)) | Err(TcpClientError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_close_then_send_is_not_connected() {
    let mut client = TcpClient::new(echo_server().await);
    client.connect().await.unwrap();
    client.close().await.unwrap();

    let request = Message::new(MessageType::NfcRegister, vec![0x00]).unwrap();
    assert!(matches!(
        client.send(request).await,
        Err(TcpClientError::NotConnected)
    ));
}
