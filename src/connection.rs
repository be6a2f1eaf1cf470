//! Relay connection with close-and-reestablish support.
//!
//! Each underlying WebSocket runs on a dedicated OS thread that owns a
//! current-thread tokio runtime. The thread pushes [`ConnectionUpdate`]s into
//! the shared [`EventSender`] and listens on an unbounded channel for
//! outgoing lines and close requests.
//!
//! Every connection gets a generation number. [`Connection::close_and_reestablish`]
//! bumps it, so events still in flight from the old socket can be recognised
//! and dropped by the consumer.
//!
//! # Threading Model
//!
//! ```text
//! WsConnection ──UnboundedSender<Outgoing>──> ws thread (tokio rt)
//!      ^                                           │
//!      └──── (owner) ── run loop <── EventSender ──┘
//! ```

// Rust guideline compliant 2026-02

use tokio::sync::mpsc;

use crate::events::{AppEvent, ConnectionEvent, ConnectionUpdate, EventSender};
use crate::ws::{self, WsFrame, CLOSE_ABNORMAL};

/// Best-effort, fire-and-forget line output.
pub trait LineSender {
    /// Queue one protocol line for sending. No delivery confirmation.
    fn send_line(&self, line: String);
}

/// The relay connection as seen by the session controller.
pub trait Connection: LineSender {
    /// Generation of the current underlying socket.
    fn generation(&self) -> u64;

    /// Tear down the current socket and open a fresh one.
    fn close_and_reestablish(&mut self);

    /// Close the current socket without reopening.
    fn close(&mut self);
}

/// Command from the owner to a connection thread.
#[derive(Debug)]
enum Outgoing {
    Line(String),
    Close,
}

/// WebSocket-backed [`Connection`].
#[derive(Debug)]
pub struct WsConnection {
    url: String,
    generation: u64,
    send_tx: Option<mpsc::UnboundedSender<Outgoing>>,
    events: EventSender,
}

impl WsConnection {
    /// Start connecting to `url` in the background.
    ///
    /// Connection progress arrives on `events` as [`AppEvent::Connection`].
    pub fn open(url: impl Into<String>, events: EventSender) -> Self {
        let mut connection = Self {
            url: url.into(),
            generation: 0,
            send_tx: None,
            events,
        };
        connection.spawn();
        connection
    }

    /// Relay URL this connection targets.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn spawn(&mut self) {
        let (send_tx, send_rx) = mpsc::unbounded_channel();
        let url = self.url.clone();
        let generation = self.generation;
        let events = self.events.clone();

        let spawn_result = std::thread::Builder::new()
            .name(format!("ws-{generation}"))
            .spawn(move || run_connection_thread(&url, generation, &events, send_rx));

        match spawn_result {
            Ok(_) => self.send_tx = Some(send_tx),
            Err(e) => {
                log::error!("Failed to spawn connection thread: {e}");
                emit(
                    &self.events,
                    generation,
                    ConnectionEvent::Error(format!("failed to spawn connection thread: {e}")),
                );
            }
        }
    }

    fn shutdown_current(&mut self) {
        if let Some(tx) = self.send_tx.take() {
            let _ = tx.send(Outgoing::Close);
        }
    }
}

impl LineSender for WsConnection {
    fn send_line(&self, line: String) {
        match &self.send_tx {
            Some(tx) => {
                if tx.send(Outgoing::Line(line)).is_err() {
                    log::warn!("Dropping outgoing line: connection thread has exited");
                }
            }
            None => log::warn!("Dropping outgoing line: not connected"),
        }
    }
}

impl Connection for WsConnection {
    fn generation(&self) -> u64 {
        self.generation
    }

    fn close_and_reestablish(&mut self) {
        log::info!("Re-establishing connection to {}", self.url);
        self.shutdown_current();
        self.generation += 1;
        self.spawn();
    }

    fn close(&mut self) {
        self.shutdown_current();
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.shutdown_current();
    }
}

fn emit(events: &EventSender, generation: u64, event: ConnectionEvent) -> bool {
    events
        .send(AppEvent::Connection(ConnectionUpdate { generation, event }))
        .is_ok()
}

/// Body of a connection thread. Exits when the socket closes, the owner asks
/// it to, or the event queue is gone.
fn run_connection_thread(
    url: &str,
    generation: u64,
    events: &EventSender,
    mut send_rx: mpsc::UnboundedReceiver<Outgoing>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            emit(
                events,
                generation,
                ConnectionEvent::Error(format!("failed to create tokio runtime: {e}")),
            );
            return;
        }
    };

    rt.block_on(async {
        let connected = tokio::select! {
            result = ws::connect(url) => result,
            outgoing = wait_for_close(&mut send_rx) => {
                log::debug!("Connection {generation} abandoned before handshake ({outgoing:?})");
                return;
            }
        };

        let (mut writer, mut reader) = match connected {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("Connection {generation} failed: {e:#}");
                emit(events, generation, ConnectionEvent::Error(format!("{e:#}")));
                return;
            }
        };

        log::info!("Connection {generation} open to {url}");
        if !emit(events, generation, ConnectionEvent::Opened) {
            return;
        }

        loop {
            tokio::select! {
                frame = reader.recv() => {
                    let event = match frame {
                        Some(Ok(WsFrame::Line(line))) => ConnectionEvent::Line(line),
                        Some(Ok(WsFrame::Closed { code, reason })) => {
                            ConnectionEvent::Closed { code, reason }
                        }
                        Some(Err(e)) => ConnectionEvent::Error(format!("{e:#}")),
                        None => ConnectionEvent::Closed {
                            code: CLOSE_ABNORMAL,
                            reason: "stream ended".to_string(),
                        },
                    };
                    let terminal = event.is_terminal();
                    if !emit(events, generation, event) || terminal {
                        return;
                    }
                }
                outgoing = send_rx.recv() => {
                    match outgoing {
                        Some(Outgoing::Line(line)) => {
                            if let Err(e) = writer.send_line(&line).await {
                                emit(events, generation, ConnectionEvent::Error(format!("{e:#}")));
                                return;
                            }
                        }
                        Some(Outgoing::Close) | None => {
                            let _ = writer.close().await;
                            log::info!("Connection {generation} closed by client");
                            emit(
                                events,
                                generation,
                                ConnectionEvent::Closed {
                                    code: 1000,
                                    reason: "client requested close".to_string(),
                                },
                            );
                            return;
                        }
                    }
                }
            }
        }
    });
}

/// Resolves once the owner closes or drops the connection. Lines queued
/// before the handshake are discarded.
async fn wait_for_close(send_rx: &mut mpsc::UnboundedReceiver<Outgoing>) -> Option<Outgoing> {
    loop {
        match send_rx.recv().await {
            Some(Outgoing::Line(line)) => {
                log::warn!("Dropping line sent before handshake: {line:?}");
            }
            other => return other,
        }
    }
}

/// [`LineSender`] that records lines, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSender {
    lines: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl RecordingSender {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

#[cfg(test)]
impl LineSender for RecordingSender {
    fn send_line(&self, line: String) {
        self.lines.borrow_mut().push(line);
    }
}

/// In-memory [`Connection`] that records what the controller asked of it.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FakeConnection {
    pub(crate) generation: u64,
    pub(crate) sent: std::cell::RefCell<Vec<String>>,
    pub(crate) reestablished: usize,
    pub(crate) closed: bool,
}

#[cfg(test)]
impl LineSender for FakeConnection {
    fn send_line(&self, line: String) {
        self.sent.borrow_mut().push(line);
    }
}

#[cfg(test)]
impl Connection for FakeConnection {
    fn generation(&self) -> u64 {
        self.generation
    }

    fn close_and_reestablish(&mut self) {
        self.generation += 1;
        self.reestablished += 1;
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
