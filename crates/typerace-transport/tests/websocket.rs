//! Integration tests for the WebSocket transport: a real server and a
//! real `tokio-tungstenite` client exchanging text frames.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use typerace_transport::{WebSocketConnection, WebSocketListener};

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn connect_client(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

/// Binds on a random port, accepts one connection, and returns both ends.
async fn accept_one() -> (WebSocketConnection, ClientWs) {
    let mut listener = WebSocketListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have addr").to_string();

    let server_handle =
        tokio::spawn(async move { listener.accept().await.expect("should accept") });

    let client = connect_client(&addr).await;
    let conn = server_handle.await.expect("accept task should complete");
    (conn, client)
}

#[tokio::test]
async fn test_send_and_receive_text() {
    let (conn, mut client) = accept_one().await;

    // Server → client.
    conn.send("hello from relay").await.expect("send");
    let msg = client.next().await.unwrap().unwrap();
    assert_eq!(msg.into_text().unwrap().as_str(), "hello from relay");

    // Client → server.
    client
        .send(Message::Text("hello from client".into()))
        .await
        .unwrap();
    let received = conn.recv().await.expect("recv").expect("should have text");
    assert_eq!(received, "hello from client");
}

#[tokio::test]
async fn test_binary_utf8_frame_is_accepted_as_text() {
    let (conn, mut client) = accept_one().await;

    client
        .send(Message::Binary(b"still json".to_vec().into()))
        .await
        .unwrap();
    let received = conn.recv().await.expect("recv").expect("should have text");
    assert_eq!(received, "still json");
}

#[tokio::test]
async fn test_recv_returns_none_on_client_close() {
    let (conn, mut client) = accept_one().await;

    client.send(Message::Close(None)).await.unwrap();

    let result = conn.recv().await.expect("recv should not error");
    assert!(result.is_none(), "should return None on client close");
}

#[tokio::test]
async fn test_connection_ids_are_unique() {
    let (a, _client_a) = accept_one().await;
    let (b, _client_b) = accept_one().await;
    assert_ne!(a.id(), b.id());
    assert!(a.id().into_inner() > 0);
}

#[tokio::test]
async fn test_send_while_recv_pending() {
    // The command loop parks on recv while a writer task pushes frames;
    // the split halves must not block each other.
    let (conn, mut client) = accept_one().await;

    let reader = conn.clone();
    let recv_task = tokio::spawn(async move { reader.recv().await });

    conn.send("outbound while reading").await.expect("send");
    let msg = client.next().await.unwrap().unwrap();
    assert_eq!(msg.into_text().unwrap().as_str(), "outbound while reading");

    client.send(Message::Text("done".into())).await.unwrap();
    let received = recv_task.await.unwrap().expect("recv").expect("text");
    assert_eq!(received, "done");
}
