//! Integration tests for the WebSocket transport.
//!
//! These tests spin up a real WebSocket server and client to verify that
//! packets survive the trip as single binary messages.

#[cfg(feature = "websocket")]
mod websocket {
    use cobble_packet::Packet;
    use cobble_transport::{Connection, Transport, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on an OS-assigned port and connects one client to it.
    async fn connected_pair() -> (cobble_transport::WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address");

        let server_handle = tokio::spawn(async move {
            let conn = transport.accept().await.expect("should accept");
            conn.ready().await.expect("upgrade should succeed");
            conn
        });

        let (client_ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let server_conn = server_handle.await.expect("task should complete");
        (server_conn, client_ws)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (server_conn, mut client_ws) = connected_pair().await;
        assert!(server_conn.id().into_inner() > 0);
        assert!(server_conn.peer_addr().is_some());

        // --- Server sends, client receives ---
        server_conn
            .send(&Packet::new(0x0F, b"hello".to_vec()))
            .await
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"\x0Fhello");

        // --- Client sends, server receives ---
        client_ws
            .send(Message::Binary(b"\x03hi there".to_vec().into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have a packet");
        assert_eq!(received.id, 0x03);
        assert_eq!(&received.data[..], b"hi there");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_text_message_is_rejected() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Text("nope".into())).await.unwrap();
        assert!(server_conn.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (server_conn, mut client_ws) = connected_pair().await;

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_accept_does_not_wait_for_upgrade() {
        use std::time::Duration;

        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();

        // A peer that connects and never speaks HTTP.
        let _idle = tokio::net::TcpStream::connect(addr).await.unwrap();
        let idle_conn = tokio::time::timeout(Duration::from_secs(1), transport.accept())
            .await
            .expect("accept should not wait for the upgrade")
            .unwrap();

        // Before the upgrade no packet can be sent.
        assert!(idle_conn.send(&Packet::new(0, vec![])).await.is_err());

        // A later client still gets through while the first one idles.
        let server_handle = tokio::spawn(async move {
            let conn = transport.accept().await.unwrap();
            conn.ready().await.unwrap();
            conn
        });
        let (mut client_ws, _) = tokio::time::timeout(
            Duration::from_secs(2),
            tokio_tungstenite::connect_async(format!("ws://{addr}")),
        )
        .await
        .expect("second client should not be blocked")
        .unwrap();
        let server_conn = server_handle.await.unwrap();

        server_conn.send(&Packet::new(0x21, vec![1])).await.unwrap();
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"\x21\x01");

        idle_conn.close().await.unwrap();
    }
}
