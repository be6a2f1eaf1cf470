//! Unified event queue for the client loop.
//!
//! Every producer (connection threads, the terminal key reader, the stdin
//! reader in headless mode) sends [`AppEvent`]s through one
//! `std::sync::mpsc::Sender<AppEvent>`. The run loop drains the receiver in
//! arrival order and handles each event to completion before the next, so
//! inbound frames and local actions never interleave.

// Rust guideline compliant 2026-02

use crossterm::event::KeyEvent;

/// Sending half of the event queue.
pub type EventSender = std::sync::mpsc::Sender<AppEvent>;

/// Receiving half of the event queue.
pub type EventReceiver = std::sync::mpsc::Receiver<AppEvent>;

/// Create the event queue.
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    std::sync::mpsc::channel()
}

/// What happened on one underlying connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake completed.
    Opened,
    /// One protocol line arrived.
    Line(String),
    /// The connection closed (remote close, stream end, or local close).
    Closed {
        /// WebSocket close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// Connect or transport failure; the connection is gone.
    Error(String),
}

impl ConnectionEvent {
    /// Returns true if no further events follow on this connection.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::Error(_))
    }
}

/// A [`ConnectionEvent`] tagged with the connection generation that produced
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUpdate {
    /// Generation of the connection (bumped on every re-establish).
    pub generation: u64,
    /// The event payload.
    pub event: ConnectionEvent,
}

/// Event delivered to the client loop.
#[derive(Debug)]
pub enum AppEvent {
    /// Something happened on the relay connection.
    Connection(ConnectionUpdate),
    /// Key press from the terminal.
    Key(KeyEvent),
    /// Terminal was resized; triggers a redraw.
    Resize,
    /// A line typed on stdin (headless mode).
    InputLine(String),
    /// Stdin reached end of file (headless mode).
    InputClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(ConnectionEvent::Error("boom".into()).is_terminal());
        assert!(ConnectionEvent::Closed {
            code: 1000,
            reason: String::new()
        }
        .is_terminal());
        assert!(!ConnectionEvent::Opened.is_terminal());
        assert!(!ConnectionEvent::Line("x".into()).is_terminal());
    }

    #[test]
    fn test_channel_preserves_order() {
        let (tx, rx) = channel();
        tx.send(AppEvent::InputLine("a".into())).unwrap();
        tx.send(AppEvent::InputLine("b".into())).unwrap();
        tx.send(AppEvent::InputClosed).unwrap();

        let got: Vec<String> = rx
            .try_iter()
            .map(|e| match e {
                AppEvent::InputLine(s) => s,
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(got, vec!["a", "b", "InputClosed"]);
    }
}
