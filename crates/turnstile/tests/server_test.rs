//! Tests for the WebSocket transport.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tower::ServiceExt;
use turnstile::{Lobby, router};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start(lobby: Lobby) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(lobby)).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, path: &str) -> Socket {
    let (socket, _) = connect_async(format!("ws://{}{}", addr, path))
        .await
        .expect("WebSocket handshake");
    socket
}

/// Next JSON message, or `None` once the server ends the stream.
async fn recv(socket: &mut Socket) -> Option<Value> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("No frame within 5s");
        match frame {
            Some(Ok(Message::Text(text))) => {
                return Some(serde_json::from_str(text.as_str()).expect("JSON frame"));
            }
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
            Some(Ok(_)) => {}
        }
    }
}

/// Reads until a message of type `kind`, failing on any error notice on the way.
async fn recv_type(socket: &mut Socket, kind: &str) -> Value {
    loop {
        let message = recv(socket)
            .await
            .unwrap_or_else(|| panic!("stream ended while waiting for {}", kind));
        if message["type"] == kind {
            return message;
        }
        assert_ne!(message["type"], "error", "unexpected notice {}", message);
    }
}

async fn send_text(socket: &mut Socket, text: &str) {
    socket
        .send(Message::text(text.to_string()))
        .await
        .expect("Send frame");
}

async fn get(lobby: &Lobby, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router(lobby.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_rejections_reach_sender_and_disconnect_forfeits() {
    let addr = start(Lobby::default()).await;

    let mut a = connect(addr, "/ws").await;
    let welcome = recv_type(&mut a, "welcome").await;
    assert_eq!(welcome["mark"], "X");
    let a_id = welcome["playerId"].clone();

    let mut b = connect(addr, "/ws").await;
    assert_eq!(recv_type(&mut b, "welcome").await["slot"], "second");
    assert_eq!(recv_type(&mut b, "turnChanged").await["playerId"], a_id);

    send_text(&mut b, "not json").await;
    let notice = recv_type(&mut b, "error").await;
    assert_eq!(notice["code"], "malformedAction");

    send_text(&mut b, r#"{"type":"action","index":-1}"#).await;
    let notice = recv_type(&mut b, "error").await;
    assert_eq!(notice["code"], "outOfRange");
    assert!(notice["message"].as_str().unwrap().contains("-1"));

    b.close(None).await.expect("Close frame");

    // Alice never sees Bob's rejections; she gets the forfeit and then the close.
    let ended = recv_type(&mut a, "gameEnded").await;
    assert_eq!(ended["outcome"]["kind"], "win");
    assert_eq!(ended["outcome"]["cause"], "forfeit");
    assert_eq!(ended["outcome"]["winner"], a_id);
    assert_eq!(recv(&mut a).await, None);
}

#[tokio::test]
async fn test_moves_over_the_wire() {
    let addr = start(Lobby::default()).await;
    let mut a = connect(addr, "/ws").await;
    recv_type(&mut a, "welcome").await;
    let mut b = connect(addr, "/ws").await;
    recv_type(&mut b, "turnChanged").await;
    recv_type(&mut a, "turnChanged").await;

    send_text(&mut a, r#"{"type":"action","x":1,"y":1}"#).await;
    let cell = recv_type(&mut b, "cellChanged").await;
    assert_eq!(cell["index"], 4);
    assert_eq!(cell["mark"], "X");

    send_text(&mut a, r#"{"type":"action","index":0}"#).await;
    let notice = recv_type(&mut a, "error").await;
    assert_eq!(notice["code"], "notYourTurn");
}

#[tokio::test]
async fn test_named_room_turns_away_third_socket() {
    let addr = start(Lobby::default()).await;
    let mut a = connect(addr, "/ws/den").await;
    recv_type(&mut a, "welcome").await;
    let mut b = connect(addr, "/ws/den").await;
    recv_type(&mut b, "welcome").await;

    let mut c = connect(addr, "/ws/den").await;
    let notice = recv(&mut c).await.expect("Admission notice");
    assert_eq!(notice["type"], "error");
    assert_eq!(notice["code"], "roomFull");
    assert_eq!(recv(&mut c).await, None);
}

#[tokio::test]
async fn test_rooms_and_health_endpoints() {
    let lobby = Lobby::default();
    let addr = start(lobby.clone()).await;

    let (status, body) = get(&lobby, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let (_, body) = get(&lobby, "/rooms").await;
    let rooms: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rooms, serde_json::json!([]));

    let mut a = connect(addr, "/ws").await;
    recv_type(&mut a, "welcome").await;
    let mut b = connect(addr, "/ws").await;
    recv_type(&mut b, "welcome").await;

    let (status, body) = get(&lobby, "/rooms").await;
    assert_eq!(status, StatusCode::OK);
    let rooms: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rooms.as_array().map(Vec::len), Some(1));
    assert_eq!(rooms[0]["players"], 2);
    assert_eq!(rooms[0]["connected"], 2);
    assert_eq!(rooms[0]["phase"], "inProgress");
}
