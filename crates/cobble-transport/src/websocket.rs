//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! Every packet travels as one binary message holding `VarInt id ‖ data`;
//! the message boundary replaces the length prefix used on raw TCP.
//!
//! `accept` hands back the raw socket at once. The HTTP upgrade happens in
//! [`Connection::ready`], on the connection's own task.

use std::net::SocketAddr;
use std::sync::PoisonError;

use cobble_packet::Packet;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, OnceCell};
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::next();
        tracing::debug!(%id, %addr, "accepted TCP connection awaiting WebSocket upgrade");

        Ok(WebSocketConnection {
            id,
            peer: addr,
            pending: std::sync::Mutex::new(Some(stream)),
            halves: OnceCell::new(),
        })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct Halves {
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

/// A single WebSocket connection.
///
/// Starts as a bare TCP stream; [`ready`](Connection::ready) performs the
/// HTTP upgrade. Sending or receiving before that fails.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    pending: std::sync::Mutex<Option<TcpStream>>,
    halves: OnceCell<Halves>,
}

impl WebSocketConnection {
    fn halves(&self) -> Result<&Halves, TransportError> {
        self.halves
            .get()
            .ok_or_else(|| TransportError::ConnectionClosed("WebSocket upgrade not done".into()))
    }

    fn take_pending(&self) -> Option<TcpStream> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

fn broken_pipe(e: tokio_tungstenite::tungstenite::Error) -> TransportError {
    TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn ready(&self) -> Result<(), Self::Error> {
        let Some(stream) = self.take_pending() else {
            return match self.halves.get() {
                Some(_) => Ok(()),
                None => Err(TransportError::ConnectionClosed(
                    "WebSocket upgrade already attempted".into(),
                )),
            };
        };
        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;
        let (sink, stream) = ws.split();
        let _ = self.halves.set(Halves {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        });
        tracing::debug!(id = %self.id, peer = %self.peer, "WebSocket upgrade complete");
        Ok(())
    }

    async fn send(&self, packet: &Packet) -> Result<(), Self::Error> {
        let mut body = Vec::new();
        packet.pack(&mut body);
        self.halves()?
            .sink
            .lock()
            .await
            .send(Message::Binary(body.into()))
            .await
            .map_err(broken_pipe)
    }

    async fn recv(&self) -> Result<Option<Packet>, Self::Error> {
        let mut stream = self.halves()?.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Packet::unpack(data)?));
                }
                Some(Ok(Message::Text(_))) => {
                    return Err(TransportError::InvalidFrame(
                        "text message on a binary protocol".into(),
                    ));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self.halves.get() {
            Some(halves) => halves.sink.lock().await.close().await.map_err(broken_pipe),
            // Never upgraded: dropping the stream closes the socket.
            None => {
                drop(self.take_pending());
                Ok(())
            }
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}
