//! Raw TCP transport using length-prefixed frames.

use std::net::SocketAddr;

use cobble_packet::Packet;
use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::{Connection, ConnectionId, FrameCodec, Transport, TransportError};

/// A TCP [`Transport`] speaking the `VarInt length ‖ VarInt id ‖ data`
/// frame layout.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        let conn = TcpConnection::from_stream(stream, Some(addr));
        tracing::debug!(id = %conn.id, %addr, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A single framed TCP connection.
///
/// The read and write halves are locked independently, so one task may
/// block in [`recv`](Connection::recv) while another sends.
pub struct TcpConnection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    reader: Mutex<FramedRead<OwnedReadHalf, FrameCodec>>,
    writer: Mutex<FramedWrite<OwnedWriteHalf, FrameCodec>>,
}

impl TcpConnection {
    /// Opens a client connection to `addr`.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        let peer = stream.peer_addr().ok();
        Ok(Self::from_stream(stream, peer))
    }

    fn from_stream(stream: TcpStream, peer: Option<SocketAddr>) -> Self {
        let _ = stream.set_nodelay(true);
        let (read, write) = stream.into_split();
        Self {
            id: ConnectionId::next(),
            peer,
            reader: Mutex::new(FramedRead::new(read, FrameCodec)),
            writer: Mutex::new(FramedWrite::new(write, FrameCodec)),
        }
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, packet: &Packet) -> Result<(), Self::Error> {
        self.writer.lock().await.send(packet.clone()).await
    }

    async fn recv(&self) -> Result<Option<Packet>, Self::Error> {
        self.reader.lock().await.next().await.transpose()
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer.lock().await.close().await
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}
