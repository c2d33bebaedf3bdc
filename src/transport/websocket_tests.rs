use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::registry::Registry;
use crate::transport::auth::issue_token;
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::transport::websocket::serve;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const OWNER: &str = "owner";
const SECRET: &str = "ws_test_secret";

async fn setup_server() -> (SocketAddr, Arc<Mutex<Registry>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    let registry = Arc::new(Mutex::new(Registry::new(OWNER)));

    tokio::spawn(serve(listener, registry.clone(), SECRET.to_string()));

    (addr, registry)
}

async fn connect(addr: SocketAddr) -> WsStream {
    let (ws_stream, _) = connect_async(format!("ws://{addr}"))
        .await
        .expect("WebSocket handshake failed");
    ws_stream
}

async fn send(ws: &mut WsStream, msg: &ClientMessage) {
    ws.send(WsMessage::Text(serde_json::to_string(msg).unwrap().into()))
        .await
        .expect("Failed to send message");
}

async fn recv(ws: &mut WsStream) -> ServerMessage {
    let response = ws
        .next()
        .await
        .expect("Did not receive response")
        .unwrap();
    let raw_data = response.into_data();
    serde_json::from_slice(&raw_data).unwrap_or_else(|e| {
        panic!("Failed to deserialize ServerMessage from '{raw_data:?}': {e}");
    })
}

async fn authenticated_client(addr: SocketAddr, identity: &str) -> WsStream {
    let mut ws = connect(addr).await;
    let token = issue_token(SECRET, identity, Duration::hours(1)).unwrap();
    send(&mut ws, &ClientMessage::Auth { token }).await;
    assert_eq!(
        recv(&mut ws).await,
        ServerMessage::Authenticated {
            identity: identity.to_string()
        }
    );
    ws
}

#[tokio::test]
async fn test_request_before_auth_is_refused() {
    let (addr, registry) = setup_server().await;
    let mut ws = connect(addr).await;

    send(
        &mut ws,
        &ClientMessage::AddTopic {
            topic: "foo".to_string(),
        },
    )
    .await;

    match recv(&mut ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "unauthenticated"),
        other => panic!("Expected error, got {other:?}"),
    }
    assert_eq!(registry.lock().unwrap().total_topics(), 0);

    // The connection stays usable and can still authenticate.
    let token = issue_token(SECRET, OWNER, Duration::hours(1)).unwrap();
    send(&mut ws, &ClientMessage::Auth { token }).await;
    assert!(matches!(
        recv(&mut ws).await,
        ServerMessage::Authenticated { .. }
    ));
}

#[tokio::test]
async fn test_bad_token_closes_connection() {
    let (addr, _) = setup_server().await;
    let mut ws = connect(addr).await;

    let token = issue_token("wrong_secret", OWNER, Duration::hours(1)).unwrap();
    send(&mut ws, &ClientMessage::Auth { token }).await;

    match recv(&mut ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "auth_failed"),
        other => panic!("Expected error, got {other:?}"),
    }

    // Server closes after the error: either a close frame or end of stream.
    match ws.next().await {
        None | Some(Err(_)) => {}
        Some(Ok(msg)) => assert!(msg.is_close(), "Expected close, got {msg:?}"),
    }
}

#[tokio::test]
async fn test_invalid_frame_gets_error() {
    let (addr, _) = setup_server().await;
    let mut ws = authenticated_client(addr, OWNER).await;

    ws.send(WsMessage::Text("{\"type\":\"nope\"}".to_string().into()))
        .await
        .unwrap();

    match recv(&mut ws).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "invalid_request"),
        other => panic!("Expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_end_to_end_topics_and_subscriptions() {
    let (addr, registry) = setup_server().await;
    let mut admin = authenticated_client(addr, OWNER).await;
    let mut user = authenticated_client(addr, "user1").await;

    for topic in ["foo", "bar", "baz"] {
        send(
            &mut admin,
            &ClientMessage::AddTopic {
                topic: topic.to_string(),
            },
        )
        .await;
        assert_eq!(
            recv(&mut admin).await,
            ServerMessage::success("add_topic", topic.to_string())
        );
    }

    send(&mut user, &ClientMessage::TotalTopics).await;
    assert_eq!(recv(&mut user).await, ServerMessage::TotalTopics { count: 3 });

    // Non-admin cannot add topics over the wire either.
    send(
        &mut user,
        &ClientMessage::AddTopic {
            topic: "abc".to_string(),
        },
    )
    .await;
    match recv(&mut user).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "unauthorized"),
        other => panic!("Expected error, got {other:?}"),
    }

    send(
        &mut user,
        &ClientMessage::Subscribe {
            topic: "foo".to_string(),
        },
    )
    .await;
    assert_eq!(
        recv(&mut user).await,
        ServerMessage::success("subscribe", "foo".to_string())
    );

    // The admin sees the user's subscription.
    send(
        &mut admin,
        &ClientMessage::IsSubscribed {
            topic: "foo".to_string(),
            identity: "user1".to_string(),
        },
    )
    .await;
    assert_eq!(
        recv(&mut admin).await,
        ServerMessage::Subscription {
            topic: "foo".to_string(),
            identity: "user1".to_string(),
            subscribed: true,
        }
    );

    send(
        &mut user,
        &ClientMessage::Subscribe {
            topic: "xyz".to_string(),
        },
    )
    .await;
    match recv(&mut user).await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "unknown_topic"),
        other => panic!("Expected error, got {other:?}"),
    }

    let registry = registry.lock().unwrap();
    assert_eq!(registry.total_topics(), 3);
    assert!(registry.is_subscribed("foo", "user1"));
    assert!(!registry.is_subscribed("xyz", "user1"));
}

#[tokio::test]
async fn test_owner_query_and_reauthentication() {
    let (addr, _registry) = setup_server().await;
    let mut ws = authenticated_client(addr, "user1").await;

    send(&mut ws, &ClientMessage::Owner).await;
    assert_eq!(
        recv(&mut ws).await,
        ServerMessage::Owner {
            identity: OWNER.to_string()
        }
    );

    // A second auth on the same connection switches the caller identity.
    let token = issue_token(SECRET, OWNER, Duration::hours(1)).unwrap();
    send(&mut ws, &ClientMessage::Auth { token }).await;
    assert_eq!(
        recv(&mut ws).await,
        ServerMessage::Authenticated {
            identity: OWNER.to_string()
        }
    );

    send(
        &mut ws,
        &ClientMessage::AddTopic {
            topic: "alerts".to_string(),
        },
    )
    .await;
    assert_eq!(
        recv(&mut ws).await,
        ServerMessage::success("add_topic", "alerts".to_string())
    );
}
