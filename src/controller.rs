//! Session controller: routes user intents and connection events into the
//! session and exposes read-only state to the renderer.
//!
//! The controller layers two things on top of [`Session`]:
//!
//! - the exit confirmation phase ([`ControllerPhase::ConfirmExit`]), which
//!   never touches the wire by itself: confirming resets the session and
//!   re-establishes the connection, cancelling does nothing;
//! - the matchmaking queue flag, set whenever a fresh socket opens and
//!   cleared once the relay forwards the first frame of a pairing.
//!
//! Events from a connection generation other than the current one are
//! dropped, so a frame from the old socket never lands in a freshly reset
//! log.

// Rust guideline compliant 2026-02

use crate::connection::Connection;
use crate::events::{ConnectionEvent, ConnectionUpdate};
use crate::protocol::{self, InboundFrame};
use crate::session::{ChatMessage, Session};

/// Matchmaking state consulted before allowing input.
pub trait MatchQueue {
    /// Returns true while waiting to be paired with a peer.
    fn is_queued(&self) -> bool;
}

/// [`MatchQueue`] driven by connection events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFlag {
    queued: bool,
}

impl QueueFlag {
    /// A flag that starts out queued.
    #[must_use]
    pub fn queued() -> Self {
        Self { queued: true }
    }

    /// Update the flag.
    pub fn set_queued(&mut self, queued: bool) {
        if self.queued != queued {
            log::debug!("Match queue: queued={queued}");
        }
        self.queued = queued;
    }
}

impl MatchQueue for QueueFlag {
    fn is_queued(&self) -> bool {
        self.queued
    }
}

/// UI phase layered on top of the session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerPhase {
    /// Normal chat view.
    #[default]
    Chatting,
    /// Exit confirmation dialog is open.
    ConfirmExit,
}

/// State of the relay connection, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Handshake in progress.
    Connecting,
    /// Socket open.
    Connected,
    /// Socket gone; exit and reconnect to start over.
    Disconnected(String),
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected(reason) => write!(f, "disconnected: {reason}"),
        }
    }
}

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Send a chat message.
    Send(String),
    /// Open the exit confirmation.
    RequestExit,
    /// Confirm exit: reset the session and reconnect.
    ConfirmExit,
    /// Dismiss the exit confirmation.
    CancelExit,
    /// Leave the application.
    Quit,
}

/// Owns the session and the connection and serialises everything that
/// mutates them.
#[derive(Debug)]
pub struct SessionController<C: Connection> {
    session: Session,
    connection: C,
    queue: QueueFlag,
    phase: ControllerPhase,
    link: LinkStatus,
    quit: bool,
}

impl<C: Connection> SessionController<C> {
    /// Create a controller for `local_id` over an already started connection.
    pub fn new(local_id: impl Into<String>, connection: C) -> Self {
        Self::with_session(Session::new(local_id), connection)
    }

    /// Create a controller around an existing session.
    pub fn with_session(session: Session, connection: C) -> Self {
        Self {
            session,
            connection,
            queue: QueueFlag::queued(),
            phase: ControllerPhase::Chatting,
            link: LinkStatus::Connecting,
            quit: false,
        }
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Current UI phase.
    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Current connection status.
    pub fn link_status(&self) -> &LinkStatus {
        &self.link
    }

    /// Whether we are still waiting for a peer.
    pub fn is_queued(&self) -> bool {
        self.queue.is_queued()
    }

    /// Whether the input line accepts messages.
    pub fn is_input_allowed(&self) -> bool {
        self.session.is_input_allowed(self.queue.is_queued())
    }

    /// Whether the user asked to leave.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Apply a user intent.
    ///
    /// Returns the local echo when a message was sent.
    pub fn handle_intent(&mut self, intent: Intent) -> Option<ChatMessage> {
        match intent {
            Intent::Send(text) => {
                if self.phase != ControllerPhase::Chatting || !self.is_input_allowed() {
                    log::debug!("Send ignored (phase {:?}, input disabled)", self.phase);
                    return None;
                }
                return self.session.append_local(&text, &self.connection);
            }
            Intent::RequestExit => self.phase = ControllerPhase::ConfirmExit,
            Intent::CancelExit => self.phase = ControllerPhase::Chatting,
            Intent::ConfirmExit => {
                if self.phase == ControllerPhase::ConfirmExit {
                    self.exit_and_reconnect();
                }
            }
            Intent::Quit => self.quit = true,
        }
        None
    }

    /// Apply an event from the connection.
    ///
    /// Returns the appended log entry, if any.
    pub fn handle_connection(&mut self, update: ConnectionUpdate) -> Option<ChatMessage> {
        let current = self.connection.generation();
        if update.generation != current {
            log::debug!(
                "Dropping {:?} from stale connection {} (current {current})",
                update.event,
                update.generation
            );
            return None;
        }

        match update.event {
            ConnectionEvent::Opened => {
                self.link = LinkStatus::Connected;
                self.queue.set_queued(true);
                None
            }
            ConnectionEvent::Line(raw) => {
                let frame = protocol::decode(&raw);
                log::debug!("Inbound {} frame", frame.kind());
                if !matches!(frame, InboundFrame::Unrecognized { .. }) {
                    self.queue.set_queued(false);
                }
                self.session.on_inbound_frame(frame)
            }
            ConnectionEvent::Closed { code, reason } => {
                log::info!("Connection closed ({code}): {reason}");
                self.link = LinkStatus::Disconnected(if reason.is_empty() {
                    format!("closed ({code})")
                } else {
                    reason
                });
                None
            }
            ConnectionEvent::Error(message) => {
                log::warn!("Connection error: {message}");
                self.link = LinkStatus::Disconnected(message);
                None
            }
        }
    }

    /// Close the connection for good.
    pub fn shutdown(&mut self) {
        self.connection.close();
    }

    fn exit_and_reconnect(&mut self) {
        self.session.reset();
        self.queue.set_queued(true);
        self.link = LinkStatus::Connecting;
        self.phase = ControllerPhase::Chatting;
        self.connection.close_and_reestablish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::FakeConnection;
    use crate::session::SessionStatus;

    fn update(generation: u64, event: ConnectionEvent) -> ConnectionUpdate {
        ConnectionUpdate { generation, event }
    }

    fn line(generation: u64, raw: &str) -> ConnectionUpdate {
        update(generation, ConnectionEvent::Line(raw.to_string()))
    }

    /// Controller that is connected and paired.
    fn paired() -> SessionController<FakeConnection> {
        let mut controller = SessionController::new("me", FakeConnection::default());
        controller.handle_connection(update(0, ConnectionEvent::Opened));
        controller.handle_connection(line(0, "[system] Connected"));
        controller
    }

    #[test]
    fn test_starts_queued_and_connecting() {
        let controller = SessionController::new("me", FakeConnection::default());
        assert!(controller.is_queued());
        assert!(!controller.is_input_allowed());
        assert_eq!(controller.link_status(), &LinkStatus::Connecting);
        assert_eq!(controller.phase(), ControllerPhase::Chatting);
    }

    #[test]
    fn test_first_frame_clears_queue() {
        let mut controller = SessionController::new("me", FakeConnection::default());
        controller.handle_connection(update(0, ConnectionEvent::Opened));
        assert_eq!(controller.link_status(), &LinkStatus::Connected);
        assert!(controller.is_queued());

        controller.handle_connection(line(0, "noise"));
        assert!(controller.is_queued());

        controller.handle_connection(line(0, "[system] Connected"));
        assert!(!controller.is_queued());
        assert!(controller.is_input_allowed());
        assert_eq!(controller.session().log().len(), 1);
    }

    #[test]
    fn test_send_appends_and_transmits() {
        let mut controller = paired();
        let echo = controller.handle_intent(Intent::Send("hello".into())).unwrap();

        assert_eq!(echo.origin_id, "me");
        assert_eq!(
            controller.connection().sent.borrow().as_slice(),
            &["[message] hello".to_string()]
        );
    }

    #[test]
    fn test_send_empty_is_ignored() {
        let mut controller = paired();
        assert!(controller.handle_intent(Intent::Send(String::new())).is_none());
        assert!(controller.connection().sent.borrow().is_empty());
    }

    #[test]
    fn test_send_ignored_while_queued() {
        let mut controller = SessionController::new("me", FakeConnection::default());
        assert!(controller.handle_intent(Intent::Send("hi".into())).is_none());
        assert!(controller.session().log().is_empty());
        assert!(controller.connection().sent.borrow().is_empty());
    }

    #[test]
    fn test_send_ignored_after_peer_left() {
        let mut controller = paired();
        controller.handle_connection(line(0, "[system] The person has left."));
        assert_eq!(controller.session().status(), SessionStatus::PeerLeft);
        assert!(!controller.is_input_allowed());

        assert!(controller.handle_intent(Intent::Send("anyone?".into())).is_none());
        assert!(controller.connection().sent.borrow().is_empty());
    }

    #[test]
    fn test_send_ignored_while_confirming_exit() {
        let mut controller = paired();
        controller.handle_intent(Intent::RequestExit);
        assert!(controller.handle_intent(Intent::Send("hi".into())).is_none());
    }

    #[test]
    fn test_cancel_exit_changes_nothing() {
        let mut controller = paired();
        controller.handle_intent(Intent::Send("a".into()));
        controller.handle_intent(Intent::RequestExit);
        assert_eq!(controller.phase(), ControllerPhase::ConfirmExit);

        controller.handle_intent(Intent::CancelExit);
        assert_eq!(controller.phase(), ControllerPhase::Chatting);
        assert_eq!(controller.session().log().len(), 2);
        assert_eq!(controller.connection().reestablished, 0);
    }

    #[test]
    fn test_confirm_exit_resets_and_reconnects() {
        let mut controller = paired();
        controller.handle_intent(Intent::Send("a".into()));
        controller.handle_connection(line(0, "[system] The person has left."));

        controller.handle_intent(Intent::RequestExit);
        controller.handle_intent(Intent::ConfirmExit);

        assert_eq!(controller.connection().reestablished, 1);
        assert!(controller.session().log().is_empty());
        assert_eq!(controller.session().next_message_id(), 0);
        assert_eq!(controller.session().status(), SessionStatus::Active);
        assert_eq!(controller.phase(), ControllerPhase::Chatting);
        assert!(controller.is_queued());
        assert_eq!(controller.link_status(), &LinkStatus::Connecting);
    }

    #[test]
    fn test_confirm_without_request_is_noop() {
        let mut controller = paired();
        controller.handle_intent(Intent::ConfirmExit);
        assert_eq!(controller.connection().reestablished, 0);
        assert_eq!(controller.session().log().len(), 1);
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut controller = paired();
        controller.handle_intent(Intent::RequestExit);
        controller.handle_intent(Intent::ConfirmExit);

        // Frame from the torn-down socket arrives after the reset.
        assert!(controller
            .handle_connection(line(0, "[message] [old-peer] late"))
            .is_none());
        controller.handle_connection(update(
            0,
            ConnectionEvent::Closed {
                code: 1000,
                reason: "client requested close".into(),
            },
        ));

        assert!(controller.session().log().is_empty());
        assert_eq!(controller.link_status(), &LinkStatus::Connecting);

        controller.handle_connection(update(1, ConnectionEvent::Opened));
        controller.handle_connection(line(1, "[message] [new-peer] hi"));
        assert_eq!(controller.session().log().len(), 1);
        assert_eq!(controller.session().log()[0].message_id, 0);
    }

    #[test]
    fn test_self_echo_clears_queue_but_not_appended() {
        let mut controller = SessionController::new("me", FakeConnection::default());
        controller.handle_connection(update(0, ConnectionEvent::Opened));
        assert!(controller.handle_connection(line(0, "[message] [me] x")).is_none());
        assert!(!controller.is_queued());
        assert!(controller.session().log().is_empty());
    }

    #[test]
    fn test_connection_errors_update_link_status() {
        let mut controller = paired();
        controller.handle_connection(update(0, ConnectionEvent::Error("refused".into())));
        assert_eq!(
            controller.link_status(),
            &LinkStatus::Disconnected("refused".into())
        );

        let mut controller = paired();
        controller.handle_connection(update(
            0,
            ConnectionEvent::Closed {
                code: 1006,
                reason: String::new(),
            },
        ));
        assert_eq!(controller.link_status().to_string(), "disconnected: closed (1006)");
    }

    #[test]
    fn test_quit_and_shutdown() {
        let mut controller = paired();
        assert!(!controller.should_quit());
        controller.handle_intent(Intent::Quit);
        assert!(controller.should_quit());

        controller.shutdown();
        assert!(controller.connection().closed);
    }
}
