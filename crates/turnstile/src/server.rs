//! WebSocket transport for rooms.
//!
//! Each socket becomes one player: connecting is the join request, text
//! frames are client messages, and closing the socket is a leave.

use crate::config::ServerConfig;
use crate::lobby::Lobby;
use crate::protocol::{ClientMessage, Intent, ServerMessage};
use crate::room::{RoomHandle, RoomId, RoomSummary};
use crate::session::PlayerId;
use axum::{
    Json, Router,
    body::Body,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::Request,
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Builds the HTTP router around a lobby.
#[instrument(skip(lobby))]
pub fn router(lobby: Lobby) -> Router {
    Router::new()
        .route("/ws", get(join_or_create))
        .route("/ws/{room_id}", get(join_room))
        .route("/rooms", get(list_rooms))
        .route("/healthz", get(health))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(lobby)
}

/// Binds and serves until the process is stopped.
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let lobby = Lobby::new(config.room_config());
    let app = router(lobby);

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server ready at ws://{}:{}/ws", config.host(), config.port());

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn list_rooms(State(lobby): State<Lobby>) -> Json<Vec<RoomSummary>> {
    Json(lobby.rooms().await)
}

async fn join_or_create(State(lobby): State<Lobby>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(lobby, None, socket))
}

async fn join_room(
    State(lobby): State<Lobby>,
    Path(room_id): Path<RoomId>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(lobby, Some(room_id), socket))
}

#[instrument(skip(lobby, socket))]
async fn handle_socket(lobby: Lobby, room_id: Option<RoomId>, mut socket: WebSocket) {
    let player_id = PlayerId::generate();
    let (outbox, inbox) = mpsc::unbounded_channel();

    let admission = match room_id {
        Some(room_id) => lobby.join_room(room_id, player_id.clone(), outbox.clone()).await,
        None => lobby.join_or_create(player_id.clone(), outbox.clone()).await,
    };
    let room = match admission {
        Ok(admission) => {
            info!(player_id = %player_id, room_id = %admission.room().id(), "Client admitted");
            admission.room().clone()
        }
        Err(e) => {
            warn!(player_id = %player_id, error = %e, "Admission rejected");
            if let Ok(text) = serde_json::to_string(&ServerMessage::error(&e)) {
                let _ = socket.send(Message::Text(text.into())).await;
            }
            let _ = socket.close().await;
            return;
        }
    };

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_loop(sink, inbox));

    tokio::select! {
        () = read_loop(stream, &room, &player_id, &outbox) => {
            debug!(player_id = %player_id, "Client stopped sending");
            writer.abort();
        }
        _ = &mut writer => {
            debug!(player_id = %player_id, "Session stream closed");
        }
    }

    room.leave(player_id.clone());
    info!(player_id = %player_id, "Client disconnected");
}

/// Forwards room messages to the socket, closing it after the final result.
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(message) = inbox.recv().await {
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to encode server message");
                continue;
            }
        };
        if sink.send(Message::Text(text.into())).await.is_err() {
            break;
        }
        if message.is_terminal() {
            break;
        }
    }
    let _ = sink.close().await;
}

/// Turns socket frames into room commands until the client goes away.
async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    room: &RoomHandle,
    player_id: &PlayerId,
    outbox: &mpsc::UnboundedSender<ServerMessage>,
) {
    while let Some(Ok(frame)) = stream.next().await {
        match frame {
            Message::Text(text) => match ClientMessage::parse(text.as_str()) {
                Ok(Intent::Move { index }) => {
                    if room.submit_action(player_id.clone(), index).is_err() {
                        break;
                    }
                }
                Ok(Intent::Leave) => break,
                Err(e) => {
                    let _ = outbox.send(ServerMessage::error(&e));
                }
            },
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}
