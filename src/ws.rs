//! WebSocket transport for protocol lines.
//!
//! Thin wrapper around `tokio-tungstenite` that exposes the socket as a
//! line channel: each text frame is one protocol line. Binary frames are
//! decoded lossily, control frames are handled here and never surface.
//!
//! [`connect`] returns split ([`WsWriter`], [`WsReader`]) halves ready for a
//! `tokio::select!` loop.

// Rust guideline compliant 2026-02

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

/// Close code reported when the stream ends without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code reported when the peer's close frame carried no status.
pub const CLOSE_NO_STATUS: u16 = 1005;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Something read from the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsFrame {
    /// One protocol line.
    Line(String),
    /// The remote closed the socket.
    Closed {
        /// WebSocket close code (1000 = normal).
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

/// Write half of a WebSocket connection.
#[derive(Debug)]
pub struct WsWriter {
    sink: futures_util::stream::SplitSink<WsStream, tungstenite::Message>,
}

impl WsWriter {
    /// Send one protocol line as a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the write fails.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        self.sink
            .send(tungstenite::Message::Text(line.to_string()))
            .await
            .context("WebSocket send failed")
    }

    /// Send a close frame and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake cannot be written.
    pub async fn close(&mut self) -> Result<()> {
        self.sink
            .send(tungstenite::Message::Close(None))
            .await
            .context("WebSocket close failed")?;
        self.sink.close().await.context("WebSocket close failed")
    }
}

/// Read half of a WebSocket connection.
#[derive(Debug)]
pub struct WsReader {
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WsReader {
    /// Receive the next line or close notification.
    ///
    /// Returns `None` when the stream ends without a close frame.
    pub async fn recv(&mut self) -> Option<Result<WsFrame>> {
        loop {
            match self.stream.next().await? {
                Ok(tungstenite::Message::Text(text)) => {
                    return Some(Ok(WsFrame::Line(text.to_string())));
                }
                Ok(tungstenite::Message::Binary(data)) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    return Some(Ok(WsFrame::Line(text)));
                }
                Ok(tungstenite::Message::Close(close_frame)) => {
                    let (code, reason) = close_frame
                        .map(|cf| (cf.code.into(), cf.reason.to_string()))
                        .unwrap_or((CLOSE_NO_STATUS, String::new()));
                    return Some(Ok(WsFrame::Closed { code, reason }));
                }
                // Pings are answered by tungstenite.
                Ok(
                    tungstenite::Message::Ping(_)
                    | tungstenite::Message::Pong(_)
                    | tungstenite::Message::Frame(_),
                ) => continue,
                Err(e) => {
                    return Some(Err(anyhow::anyhow!("WebSocket read error: {e}")));
                }
            }
        }
    }
}

/// Check that `url` is a usable relay address and normalise its scheme.
///
/// `http(s)://` is rewritten to `ws(s)://`.
///
/// # Errors
///
/// Returns an error for any other scheme.
pub fn relay_url(url: &str) -> Result<String> {
    let url = url.trim();
    let normalized = if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        url.to_string()
    };

    if !(normalized.starts_with("ws://") || normalized.starts_with("wss://")) {
        bail!("unsupported relay URL (expected ws:// or wss://): {url}");
    }
    Ok(normalized)
}

/// Open a WebSocket connection to the relay.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let url = relay_url(url)?;
    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .with_context(|| format!("WebSocket connect to {url} failed"))?;

    let (sink, stream) = ws_stream.split();
    Ok((WsWriter { sink }, WsReader { stream }))
}
