//! Per-connection WebSocket handling.
//!
//! Each accepted stream gets a reader (this task) and a writer task draining
//! the connection's outbound queue into the socket.

use crate::config::ServerConfig;
use crate::connection::{ClientConnection, OutboundReceiver};
use crate::error::RelayError;
use crate::protocol::{ProtocolHandler, RelaySession};
use crate::types::ConnectionId;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tracing::{debug, warn};

/// Type alias for the outgoing half of a WebSocket
type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// How long a closed connection's writer may keep flushing before it is aborted.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs one client connection from handshake to teardown.
///
/// Handshakes on any path other than the configured one are refused with
/// `404`. Any origin is accepted.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handler: ProtocolHandler,
    config: Arc<ServerConfig>,
) -> Result<(), RelayError> {
    let expected_path = config.path.clone();
    let check_path = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        if request.uri().path() == expected_path {
            Ok(response)
        } else {
            let mut rejection = ErrorResponse::new(Some(format!(
                "No relay endpoint at {}",
                request.uri().path()
            )));
            *rejection.status_mut() = StatusCode::NOT_FOUND;
            Err(rejection)
        }
    };

    let ws_stream = accept_hdr_async(stream, check_path)
        .await
        .map_err(|e| RelayError::Network(format!("WebSocket handshake failed for {addr}: {e}")))?;

    let (ws_sink, mut ws_receiver) = ws_stream.split();
    let (connection, outbound) = ClientConnection::with_queue(addr, config.outbound_queue_capacity);
    let connection_id = connection.id();
    let writer = tokio::spawn(write_outbound(ws_sink, outbound, connection_id));

    let mut session = RelaySession::new(Arc::new(connection));
    handler.open(&mut session);

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                handler.handle_text(&session, text.as_str());
            }
            Ok(Message::Close(_)) => {
                debug!("Connection {} requested close", connection_id);
                break;
            }
            // tungstenite answers pings itself on the next read.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Binary(_)) => {
                warn!("Ignoring binary frame from connection {}", connection_id);
            }
            Ok(Message::Frame(_)) => {}
            Err(e) => {
                warn!("WebSocket error for connection {}: {}", connection_id, e);
                break;
            }
        }
    }

    handler.close(&mut session);

    // The registry no longer holds the connection, so dropping the session
    // releases the queue and lets the writer finish.
    drop(session);
    finish_writer(writer, WRITER_DRAIN_TIMEOUT, connection_id).await;

    Ok(())
}

/// Waits up to `limit` for a writer to flush, then aborts it.
///
/// A peer that stops reading would otherwise keep the writer blocked in
/// `send` forever.
async fn finish_writer(mut writer: JoinHandle<()>, limit: Duration, connection_id: ConnectionId) {
    match tokio::time::timeout(limit, &mut writer).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Writer task for connection {} failed: {}", connection_id, e),
        Err(_) => {
            debug!(
                "Writer for connection {} still flushing after {:?}, aborting",
                connection_id, limit
            );
            writer.abort();
        }
    }
}

/// Drains a connection's outbound queue into its socket.
async fn write_outbound(mut sink: WsSink, mut outbound: OutboundReceiver, connection_id: ConnectionId) {
    while let Some(message) = outbound.recv().await {
        if let Err(e) = sink.send(message).await {
            debug!("Stopping writer for connection {}: {}", connection_id, e);
            break;
        }
    }

    let _ = sink.close().await;
}
