//! Integration tests for the peer registry.
//!
//! A real loopback listener feeds accepted connections into the
//! registry while raw tokio-tungstenite clients play the peers.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use siglink_peers::PeerRegistry;
use siglink_transport::{Connection, WsListener};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

const TICK: Duration = Duration::from_secs(5);

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn connect_client(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

async fn next_text(ws: &mut ClientWs) -> String {
    loop {
        let msg = timeout(TICK, ws.next())
            .await
            .expect("client recv timed out")
            .expect("stream ended")
            .expect("recv failed");
        if let Message::Text(text) = msg {
            return text.as_str().to_owned();
        }
    }
}

/// Accepts one connection and registers it, returning its id.
async fn accept_into(
    listener: &mut WsListener,
    registry: &std::sync::Arc<PeerRegistry>,
) -> siglink_transport::ConnectionId {
    let conn = timeout(TICK, listener.accept())
        .await
        .expect("accept timed out")
        .expect("accept failed");
    registry.register(conn).await
}

/// Polls until `registry.len()` reaches `want` (reader-task cleanup is
/// asynchronous).
async fn wait_for_len(registry: &PeerRegistry, want: usize) {
    timeout(TICK, async {
        while registry.len().await != want {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("registry did not reach expected size");
}

#[tokio::test]
async fn test_broadcast_reaches_every_open_peer() {
    let mut listener = WsListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (registry, _inbound) = PeerRegistry::new();

    let (mut client_a, _) =
        tokio::join!(connect_client(&addr), accept_into(&mut listener, &registry));
    let (mut client_b, _) =
        tokio::join!(connect_client(&addr), accept_into(&mut listener, &registry));
    assert_eq!(registry.len().await, 2);

    registry.broadcast(&json!({"type": "answer", "sdp": "y"})).await;

    for client in [&mut client_a, &mut client_b] {
        let frame = next_text(client).await;
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({"type": "answer", "sdp": "y"}));
    }
}

#[tokio::test]
async fn test_closed_peer_is_removed_and_skipped() {
    let mut listener = WsListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (registry, _inbound) = PeerRegistry::new();

    let (mut client_a, _) =
        tokio::join!(connect_client(&addr), accept_into(&mut listener, &registry));
    let (mut client_c, _) =
        tokio::join!(connect_client(&addr), accept_into(&mut listener, &registry));

    // Peer C disconnects; its reader task removes it.
    client_c.close(None).await.unwrap();
    wait_for_len(&registry, 1).await;

    registry.broadcast(&json!({"still": "flowing"})).await;

    let frame = next_text(&mut client_a).await;
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value, json!({"still": "flowing"}));
}

#[tokio::test]
async fn test_send_failure_during_broadcast_removes_peer_and_continues() {
    let mut listener = WsListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (registry, _inbound) = PeerRegistry::new();

    let (mut client_a, _) =
        tokio::join!(connect_client(&addr), accept_into(&mut listener, &registry));

    // Peer B's sink is closed underneath the registry while its client
    // never polls, so no close handshake completes and B's reader task
    // stays parked in recv. B is still in the set when the broadcast
    // reaches it, and the send itself fails.
    let (_client_b, conn_b) = tokio::join!(connect_client(&addr), async {
        timeout(TICK, listener.accept())
            .await
            .expect("accept timed out")
            .expect("accept failed")
    });
    registry.register(conn_b.clone()).await;
    conn_b.close().await.unwrap();
    assert_eq!(registry.len().await, 2);

    registry.broadcast(&json!({"mid": "broadcast"})).await;

    // The failed peer was removed inside the broadcast and the
    // surviving peer still received the frame.
    assert_eq!(registry.len().await, 1);
    let frame = next_text(&mut client_a).await;
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value, json!({"mid": "broadcast"}));
}

#[tokio::test]
async fn test_inbound_frames_are_tagged_per_peer_and_ordered() {
    let mut listener = WsListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (registry, mut inbound) = PeerRegistry::new();

    let (mut client, id) =
        tokio::join!(connect_client(&addr), accept_into(&mut listener, &registry));

    client.send(Message::Text(r#"{"n":1}"#.into())).await.unwrap();
    client.send(Message::Text(r#"{"n":2}"#.into())).await.unwrap();

    for n in 1..=2 {
        let (from, frame) = timeout(TICK, inbound.recv())
            .await
            .expect("inbound timed out")
            .expect("stream ended");
        assert_eq!(from, id);
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({"n": n}));
    }
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let mut listener = WsListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (registry, _inbound) = PeerRegistry::new();

    let (_client, id) =
        tokio::join!(connect_client(&addr), accept_into(&mut listener, &registry));
    assert_eq!(registry.len().await, 1);

    registry.remove(id).await;
    registry.remove(id).await;
    assert_eq!(registry.len().await, 0);
}

#[tokio::test]
async fn test_close_all_empties_the_set_and_closes_clients() {
    let mut listener = WsListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (registry, _inbound) = PeerRegistry::new();

    let (mut client, _) =
        tokio::join!(connect_client(&addr), accept_into(&mut listener, &registry));

    registry.close_all().await;
    assert!(registry.is_empty().await);

    // The client sees the close frame (or the stream ending).
    let saw_close = timeout(TICK, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break,
            }
        }
    })
    .await;
    assert!(saw_close.is_ok(), "client never observed the close");
}
