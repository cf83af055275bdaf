//! WebSocket listener and dialer built on `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs. Shared between the
/// accept and dial paths so every connection in the process gets a
/// distinct id.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> ConnectionId {
    ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// A downstream peer connection accepted by [`WsListener`].
pub type PeerConn = WsConnection<TcpStream>;

/// A dialed client connection to the upstream endpoint.
pub type UpstreamConn = WsConnection<MaybeTlsStream<TcpStream>>;

/// A WebSocket listener that accepts downstream peer connections.
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    /// Binds a new WebSocket listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket listener bound");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and accepts the next incoming peer connection,
    /// completing the WebSocket handshake.
    pub async fn accept(&mut self) -> Result<PeerConn, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = next_id();
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        Ok(WsConnection::new(id, ws))
    }
}

/// Dials the upstream endpoint at `url` (e.g. `ws://host:port/path`)
/// and completes the client-side WebSocket handshake.
pub async fn connect(url: &str) -> Result<UpstreamConn, TransportError> {
    let (ws, _resp) = tokio_tungstenite::connect_async(url).await.map_err(|e| {
        TransportError::ConnectFailed(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            e,
        ))
    })?;

    let id = next_id();
    tracing::debug!(%id, url, "connected to upstream endpoint");

    Ok(WsConnection::new(id, ws))
}

/// A single WebSocket connection carrying text frames.
///
/// Generic over the underlying stream so the same type serves both
/// accepted peers (`TcpStream`) and the dialed upstream link
/// (`MaybeTlsStream<TcpStream>`).
///
/// The sink and stream halves are locked independently: one task can
/// sit in [`Connection::recv`] while another sends, which is exactly
/// what the relay does (a reader task per connection, writes coming
/// from broadcast).
pub struct WsConnection<S> {
    id: ConnectionId,
    sink: Arc<Mutex<SplitSink<WebSocketStream<S>, Message>>>,
    stream: Arc<Mutex<SplitStream<WebSocketStream<S>>>>,
}

impl<S> WsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(id: ConnectionId, ws: WebSocketStream<S>) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id,
            sink: Arc::new(Mutex::new(sink)),
            stream: Arc::new(Mutex::new(stream)),
        }
    }
}

// Hand-written so `S` does not need to be `Clone`; clones share the
// underlying halves.
impl<S> Clone for WsConnection<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            sink: Arc::clone(&self.sink),
            stream: Arc::clone(&self.stream),
        }
    }
}

impl<S> Connection for WsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Error = TransportError;

    async fn send(&self, frame: &str) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        let msg = Message::Text(frame.into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<String>, Self::Error> {
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    // The relay is a text protocol; tolerate peers that
                    // frame JSON as binary, skip anything that is not
                    // valid UTF-8.
                    match String::from_utf8(data.into()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => {
                            tracing::trace!(id = %self.id, "dropping non-UTF-8 binary frame");
                            continue;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
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
        use futures_util::SinkExt;
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
