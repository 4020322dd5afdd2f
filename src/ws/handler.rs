//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::session::{RoomKind, RoomRegistry};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Per-connection outbound queue depth
const OUTBOUND_CAPACITY: usize = 64;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let conn_id = Uuid::new_v4().to_string();
    debug!(conn_id = %conn_id, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, conn_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, conn_id: String, state: AppState) {
    info!(conn_id = %conn_id, "Player connected");

    let (mut ws_sink, mut ws_stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMsg>(OUTBOUND_CAPACITY);

    // Writer task: direct replies and room broadcasts -> WebSocket
    let writer_conn_id = conn_id.clone();
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn_id = %writer_conn_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    let mut session = Session {
        conn_id: conn_id.clone(),
        registry: &state.registry,
        out_tx,
        forwarder: None,
    };
    let rate_limiter = ConnectionRateLimiter::new();

    // Reader loop: WebSocket -> registry
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn_id = %conn_id, "Rate limited client message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => session.handle(msg).await,
                    Err(e) => {
                        warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    state.registry.disconnect(&conn_id);
    session.stop_forwarding();
    drop(session);
    writer_handle.abort();

    info!(conn_id = %conn_id, "Player disconnected");
}

/// One connection's view of the registry
struct Session<'a> {
    conn_id: String,
    registry: &'a RoomRegistry,
    out_tx: mpsc::Sender<ServerMsg>,
    /// Relays the current room's broadcast
    forwarder: Option<JoinHandle<()>>,
}

impl Session<'_> {
    async fn handle(&mut self, msg: ClientMsg) {
        match msg {
            ClientMsg::Join {
                room_id,
                player_name,
            } => {
                // A rejected join keeps the current room and its relay
                match self.registry.join(&self.conn_id, &room_id, &player_name) {
                    Ok(outcome) => {
                        self.reply(ServerMsg::Joined {
                            player_id: self.conn_id.clone(),
                            room_id: outcome.room_id,
                        })
                        .await;
                        self.forward(outcome.updates);
                    }
                    Err(e) => {
                        self.reply(ServerMsg::Error {
                            message: e.to_string(),
                        })
                        .await;
                    }
                }
            }
            ClientMsg::Input { input } => {
                self.registry.set_input(&self.conn_id, input);
            }
            ClientMsg::Practice => {
                if let Err(e) = self.registry.practice(&self.conn_id) {
                    debug!(conn_id = %self.conn_id, error = %e, "Practice ignored");
                }
            }
            ClientMsg::Spectate => {
                self.stop_forwarding();
                let outcome = self.registry.spectate(&self.conn_id);
                self.reply(ServerMsg::SpectateStart {
                    player_id: self.conn_id.clone(),
                    room_id: outcome.room_id,
                })
                .await;
                self.forward(outcome.updates);
            }
            ClientMsg::Restart => match self.registry.restart(&self.conn_id) {
                Ok(Some(RoomKind::Spectate)) => {
                    if let Some(room_id) = self.registry.room_of(&self.conn_id) {
                        self.reply(ServerMsg::SpectateStart {
                            player_id: self.conn_id.clone(),
                            room_id,
                        })
                        .await;
                    }
                }
                // Match restarts announce themselves through the room
                Ok(_) => {}
                Err(e) => {
                    debug!(conn_id = %self.conn_id, error = %e, "Restart ignored");
                }
            },
        }
    }

    async fn reply(&self, msg: ServerMsg) {
        if self.out_tx.send(msg).await.is_err() {
            debug!(conn_id = %self.conn_id, "Outbound channel closed");
        }
    }

    fn forward(&mut self, mut updates: broadcast::Receiver<ServerMsg>) {
        self.stop_forwarding();
        let out_tx = self.out_tx.clone();
        let conn_id = self.conn_id.clone();
        self.forwarder = Some(tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(msg) => {
                        if out_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            conn_id = %conn_id,
                            lagged_count = n,
                            "Client lagged, skipping updates"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(conn_id = %conn_id, "Room channel closed");
                        break;
                    }
                }
            }
        }));
    }

    fn stop_forwarding(&mut self) {
        if let Some(handle) = self.forwarder.take() {
            handle.abort();
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
