//! WebSocket transport
//!
//! This file implements a minimal WebSocket server that translates protocol
//! JSON messages into registry operations. Responsibilities:
//! - Accept TCP/WebSocket connections
//! - Create a `Client` for each connection
//! - Require an `auth` frame carrying a valid token before any registry
//!   request; the token's subject becomes the caller identity
//! - Serialize/deserialize JSON messages and forward them to the registry
//!
//! Responses are queued on a per-client channel and written by a separate
//! send task, so the registry lock is never held across network I/O.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::Client;
use crate::config::Settings;
use crate::registry::Registry;
use crate::transport::auth::verify_token;
use crate::transport::handler::handle_request;
use crate::transport::message::{
    AUTH_FAILED, ClientMessage, INVALID_REQUEST, ServerMessage, UNAUTHENTICATED,
};

/// Binds `settings.server.host:port` and serves connections.
pub async fn start_websocket_server(
    registry: Arc<Mutex<Registry>>,
    settings: Settings,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, registry, settings.server.jwt_secret).await
}

/// Pause after a failed accept (e.g. EMFILE) before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Accepts connections on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<Mutex<Registry>>,
    jwt_secret: String,
) -> std::io::Result<()> {
    info!("WebSocket server listening on ws://{}", listener.local_addr()?);
    let jwt_secret: Arc<str> = jwt_secret.into();

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("failed to accept connection: {e}");
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                continue;
            }
        };
        let registry = registry.clone();
        let jwt_secret = jwt_secret.clone();

        tokio::spawn(async move {
            handle_connection(stream, registry, jwt_secret).await;
            debug!(%peer, "connection closed");
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    registry: Arc<Mutex<Registry>>,
    jwt_secret: Arc<str>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let mut client = Client::new(tx);
    let client_id = client.id.clone();
    info!(client = %client_id, "client connected");

    let send_loop = {
        let client_id = client_id.clone();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    warn!(client = %client_id, "failed to send message: {e}");
                    return;
                }
            }
            let _ = ws_sender.close().await;
            debug!(client = %client_id, "send loop closed");
        })
    };

    while let Some(Ok(msg)) = ws_receiver.next().await {
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Auth { token }) => match verify_token(&jwt_secret, &token) {
                Ok(identity) => {
                    if client.is_authenticated() {
                        info!(client = %client_id, %identity, "re-authenticated");
                    } else {
                        info!(client = %client_id, %identity, "authenticated");
                    }
                    client.authenticate(identity.clone());
                    respond(&client, &ServerMessage::Authenticated { identity });
                }
                Err(e) => {
                    warn!(client = %client_id, "authentication failed: {e}");
                    respond(&client, &ServerMessage::error(AUTH_FAILED, e.to_string()));
                    break;
                }
            },
            Ok(request) => match client.identity() {
                Some(caller) => {
                    let response = handle_request(&registry, caller, request);
                    respond(&client, &response);
                }
                None => {
                    warn!(client = %client_id, "request before authentication");
                    respond(
                        &client,
                        &ServerMessage::error(UNAUTHENTICATED, "must authenticate first"),
                    );
                }
            },
            Err(err) => {
                warn!(
                    client = %client_id,
                    "invalid client message: {err} | {}",
                    text.chars().take(100).collect::<String>()
                );
                respond(&client, &ServerMessage::error(INVALID_REQUEST, err.to_string()));
            }
        }
    }

    // Dropping the client closes the channel; the send loop drains what is
    // queued, then closes the socket.
    drop(client);
    let _ = send_loop.await;
    info!(client = %client_id, "client disconnected");
}

fn respond(client: &Client, response: &ServerMessage) {
    let text = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize response: {e}");
            return;
        }
    };
    if client.sender.send(WsMessage::text(text)).is_err() {
        debug!(client = %client.id, "send loop gone, dropping response");
    }
}
