//! TCP transport integration tests over loopback

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use sfs_protocol::config::ProtocolConfig;
use sfs_protocol::core::SFSObject;
use sfs_protocol::error::ProtocolError;
use sfs_protocol::protocol::{self, Dispatcher, Message};
use sfs_protocol::transport::{client_from_url, server_from_url, TcpAcceptor, TcpTransport, Transport};
use tokio::task::JoinSet;

/// Serves every accepted connection with `dispatcher` until the peer hangs up.
fn serve(acceptor: &mut TcpAcceptor, dispatcher: Dispatcher) -> tokio::task::JoinHandle<()> {
    let mut incoming = acceptor.incoming();
    tokio::spawn(async move {
        let mut sessions = JoinSet::new();
        while let Some(mut conn) = incoming.next().await {
            let dispatcher = dispatcher.clone();
            sessions.spawn(async move {
                while let Ok(msg) = conn.recv().await {
                    if let Ok(Some(reply)) = dispatcher.dispatch(&msg) {
                        if conn.send(&reply).await.is_err() {
                            break;
                        }
                    }
                }
            });
        }
        while sessions.join_next().await.is_some() {}
    })
}

fn echo_dispatcher() -> Dispatcher {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(1, 13, |msg: &Message| Ok(Some(msg.clone())))
        .unwrap();
    dispatcher
        .register(0, 29, |_msg: &Message| Ok(Some(Message::ping())))
        .unwrap();
    dispatcher
}

fn chat(text: &str) -> Message {
    let mut params = SFSObject::new();
    params.put_utf_string("m", text).put_int("r", 1);
    Message::new(1, 13, params)
}

#[tokio::test]
async fn test_echo_roundtrip() {
    let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let server = serve(&mut acceptor, echo_dispatcher());

    let mut client = TcpTransport::new(acceptor.local_addr().to_string());
    client.open().await.unwrap();
    assert!(client.is_open());
    assert_eq!(client.peer_addr(), Some(acceptor.local_addr()));

    for text in ["hello", "", "w\u{f6}rld"] {
        client.send(&chat(text)).await.unwrap();
        assert_eq!(client.recv().await.unwrap(), chat(text));
    }

    client.send(&Message::ping()).await.unwrap();
    assert_eq!(client.recv().await.unwrap(), Message::ping());

    client.close().await.unwrap();
    assert!(!client.is_open());

    acceptor.shutdown().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_open_is_idempotent() {
    let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let server = serve(&mut acceptor, echo_dispatcher());

    let mut client = TcpTransport::new(acceptor.local_addr().to_string());
    client.open().await.unwrap();
    client.open().await.unwrap();
    client.send(&chat("once")).await.unwrap();
    assert_eq!(client.recv().await.unwrap(), chat("once"));

    client.close().await.unwrap();
    client.close().await.unwrap();

    acceptor.shutdown().await.unwrap();
    server.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_clients() {
    let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let addr = acceptor.local_addr().to_string();
    let server = serve(&mut acceptor, echo_dispatcher());

    let mut clients = JoinSet::new();
    for id in 0..16 {
        let addr = addr.clone();
        clients.spawn(async move {
            let mut client = TcpTransport::new(addr);
            client.open().await.unwrap();
            for round in 0..20 {
                let msg = chat(&format!("client {id} round {round}"));
                client.send(&msg).await.unwrap();
                assert_eq!(client.recv().await.unwrap(), msg);
            }
            client.close().await.unwrap();
        });
    }
    while let Some(res) = clients.join_next().await {
        res.unwrap();
    }

    acceptor.shutdown().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_large_message_uses_big_size_frame() {
    let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let server = serve(&mut acceptor, echo_dispatcher());

    let mut client = TcpTransport::new(acceptor.local_addr().to_string());
    client.open().await.unwrap();

    let mut params = SFSObject::new();
    params.put_byte_array("a", vec![1; 50_000]).put_byte_array("b", vec![2; 50_000]);
    let msg = Message::new(1, 13, params);

    client.send(&msg).await.unwrap();
    let frame = client.recv_raw().await.unwrap();
    assert_eq!(frame[0], 0x88);
    assert_eq!(protocol::decode(&frame).unwrap(), msg);

    client.close().await.unwrap();
    acceptor.shutdown().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_rejected_frame_drops_server_connection() {
    let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let server = serve(&mut acceptor, echo_dispatcher());

    let mut client = TcpTransport::new(acceptor.local_addr().to_string());
    client.open().await.unwrap();

    // Encrypted flag: the server must refuse the stream and hang up.
    client
        .send_raw(Bytes::from_static(&[0xC0, 0x00, 0x01, 0x00]))
        .await
        .unwrap();
    assert!(matches!(
        client.recv().await,
        Err(ProtocolError::ConnectionClosed) | Err(ProtocolError::Io(_))
    ));
    assert!(!client.is_open());

    acceptor.shutdown().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_recv_timeout() {
    let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let mut incoming = acceptor.incoming();
    let holder = tokio::spawn(async move {
        // Accept and stay silent.
        let conn = incoming.next().await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(conn);
    });

    let mut client = TcpTransport::new(acceptor.local_addr().to_string())
        .with_timeouts(Duration::from_secs(1), Duration::from_millis(50));
    client.open().await.unwrap();
    assert!(matches!(client.recv().await, Err(ProtocolError::Timeout)));
    // A timeout does not desynchronize the stream.
    assert!(client.is_open());

    holder.await.unwrap();
    acceptor.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_connect_refused() {
    let acceptor = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let addr = acceptor.local_addr().to_string();
    drop(acceptor);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut client = TcpTransport::new(addr);
    assert!(client.open().await.is_err());
    assert!(!client.is_open());
}

#[tokio::test]
async fn test_url_factory_loopback() {
    let mut acceptor = server_from_url("tcp://127.0.0.1:0").await.unwrap();
    let server = serve(&mut acceptor, echo_dispatcher());

    let url = format!("tcp://127.0.0.1:{}", acceptor.local_addr().port());
    let mut client = client_from_url(&url).unwrap();
    assert!(!client.is_open());
    client.open().await.unwrap();
    client.send(&chat("via url")).await.unwrap();
    assert_eq!(client.recv().await.unwrap(), chat("via url"));
    client.close().await.unwrap();

    acceptor.shutdown().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_url_factory_rejects_other_schemes() {
    for url in ["ws://localhost:8080", "udp://127.0.0.1:9933", "http://example.org"] {
        assert!(matches!(
            client_from_url(url),
            Err(ProtocolError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            server_from_url(url).await,
            Err(ProtocolError::UnsupportedScheme(_))
        ));
    }
}

#[tokio::test]
async fn test_incoming_only_once() {
    let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let _first = acceptor.incoming();
    let mut second = acceptor.incoming();
    assert!(second.next().await.is_none());
    acceptor.shutdown().await.unwrap();
}

/// Polls until `acceptor` reports `count` live connections.
async fn wait_for_active(acceptor: &TcpAcceptor, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while acceptor.active_connections() != count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_connection_cap_is_per_acceptor() {
    // Live traffic on another acceptor must not count against the cap.
    let mut other = TcpAcceptor::bind("127.0.0.1:0").await.unwrap();
    let other_server = serve(&mut other, echo_dispatcher());
    let mut bystander = TcpTransport::new(other.local_addr().to_string());
    bystander.open().await.unwrap();
    bystander.send(&chat("elsewhere")).await.unwrap();
    assert_eq!(bystander.recv().await.unwrap(), chat("elsewhere"));

    let config = ProtocolConfig::default_with_overrides(|c| c.server.max_connections = 2);
    let mut acceptor = TcpAcceptor::bind_with("127.0.0.1:0", &config).await.unwrap();
    let addr = acceptor.local_addr().to_string();
    let server = serve(&mut acceptor, echo_dispatcher());

    let mut first = TcpTransport::new(addr.clone());
    first.open().await.unwrap();
    first.send(&chat("one")).await.unwrap();
    assert_eq!(first.recv().await.unwrap(), chat("one"));

    let mut second = TcpTransport::new(addr.clone());
    second.open().await.unwrap();
    second.send(&chat("two")).await.unwrap();
    assert_eq!(second.recv().await.unwrap(), chat("two"));
    assert_eq!(acceptor.active_connections(), 2);

    // One past the cap: the handshake completes, then the server hangs up.
    let mut extra = TcpTransport::new(addr.clone());
    extra.open().await.unwrap();
    assert!(matches!(
        extra.recv().await,
        Err(ProtocolError::ConnectionClosed) | Err(ProtocolError::Io(_))
    ));
    assert_eq!(acceptor.active_connections(), 2);

    // Served clients are unaffected by the refusal.
    first.send(&chat("still here")).await.unwrap();
    assert_eq!(first.recv().await.unwrap(), chat("still here"));

    // Closing a served client frees its slot for a new peer.
    second.close().await.unwrap();
    wait_for_active(&acceptor, 1).await;
    let mut late = TcpTransport::new(addr);
    late.open().await.unwrap();
    late.send(&chat("late")).await.unwrap();
    assert_eq!(late.recv().await.unwrap(), chat("late"));
    assert_eq!(acceptor.active_connections(), 2);

    first.close().await.unwrap();
    late.close().await.unwrap();
    bystander.close().await.unwrap();
    acceptor.shutdown().await.unwrap();
    server.await.unwrap();
    assert_eq!(acceptor.active_connections(), 0);
    other.shutdown().await.unwrap();
    other_server.await.unwrap();
}

#[tokio::test]
async fn test_acceptor_binds_configured_address() {
    let config = ProtocolConfig::default_with_overrides(|c| {
        c.server.address = "127.0.0.1:0".to_string();
        c.server.connection_timeout = Duration::from_secs(2);
    });
    let mut acceptor = TcpAcceptor::from_config(&config).await.unwrap();
    assert!(acceptor.local_addr().ip().is_loopback());
    assert_ne!(acceptor.local_addr().port(), 0);
    let server = serve(&mut acceptor, echo_dispatcher());

    let mut client = TcpTransport::new(acceptor.local_addr().to_string());
    client.open().await.unwrap();
    client.send(&chat("configured")).await.unwrap();
    assert_eq!(client.recv().await.unwrap(), chat("configured"));
    client.close().await.unwrap();

    acceptor.shutdown().await.unwrap();
    server.await.unwrap();
}

