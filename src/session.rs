//! Chat session state machine.
//!
//! [`Session`] owns the conversation log and the session status. It consumes
//! decoded [`InboundFrame`]s and local send intents and is the only place
//! where messages are numbered and appended.
//!
//! # States
//!
//! ```text
//! Active ──"The person has left."──> PeerLeft
//!    ^                                  │
//!    └────────────── reset() ───────────┘
//! ```
//!
//! Message ids reflect local append order only. No sequence numbers travel on
//! the wire, so the two participants may number the same exchange
//! differently.

// Rust guideline compliant 2026-02

use chrono::{DateTime, Local};

use crate::connection::LineSender;
use crate::protocol::{self, InboundFrame, PEER_LEFT_NOTICE};

/// Origin id used for relay-originated entries.
pub const SYSTEM_ORIGIN: &str = "";

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Position in the local log, assigned at append time.
    pub message_id: u64,
    /// Message text.
    pub text: String,
    /// Sender id; empty for system entries.
    pub origin_id: String,
    /// Local time the message was sent or received.
    pub timestamp: DateTime<Local>,
    /// `HH:MM` rendering of `timestamp`.
    pub display_time: String,
}

impl ChatMessage {
    fn new(message_id: u64, text: &str, origin_id: &str, timestamp: DateTime<Local>) -> Self {
        Self {
            message_id,
            text: text.to_string(),
            origin_id: origin_id.to_string(),
            display_time: timestamp.format("%H:%M").to_string(),
            timestamp,
        }
    }

    /// Returns true for relay-originated entries.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.origin_id == SYSTEM_ORIGIN
    }
}

/// Lifecycle status of the current pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Both participants are present.
    #[default]
    Active,
    /// The other participant left; local input is disabled until reset.
    PeerLeft,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::PeerLeft => write!(f, "peer left"),
        }
    }
}

/// Source of timestamps for new messages.
pub type Clock = fn() -> DateTime<Local>;

/// Conversation log and status for one participant.
#[derive(Debug)]
pub struct Session {
    local_id: String,
    log: Vec<ChatMessage>,
    status: SessionStatus,
    next_message_id: u64,
    /// Bumped on every observable change so renderers can poll for redraws.
    revision: u64,
    clock: Clock,
}

impl Session {
    /// Create an empty, active session for `local_id`.
    pub fn new(local_id: impl Into<String>) -> Self {
        Self::with_clock(local_id, Local::now)
    }

    /// Create a session with an explicit timestamp source.
    pub fn with_clock(local_id: impl Into<String>, clock: Clock) -> Self {
        Self {
            local_id: local_id.into(),
            log: Vec::new(),
            status: SessionStatus::Active,
            next_message_id: 0,
            revision: 0,
            clock,
        }
    }

    /// Identifier of the local participant.
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Conversation log in append order.
    pub fn log(&self) -> &[ChatMessage] {
        &self.log
    }

    /// Current session status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Id the next appended message will receive.
    pub fn next_message_id(&self) -> u64 {
        self.next_message_id
    }

    /// Change counter; differs whenever log or status changed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the local participant may send right now.
    ///
    /// `queued` is the matchmaking state: while waiting for a peer there is
    /// nobody to talk to.
    pub fn is_input_allowed(&self, queued: bool) -> bool {
        self.status == SessionStatus::Active && !queued
    }

    /// Append a locally typed message and hand its wire form to `sender`.
    ///
    /// Empty text is ignored. The returned message is the local echo; the
    /// relay's copy of it will later arrive as a self-echo and be dropped.
    pub fn append_local(&mut self, text: &str, sender: &dyn LineSender) -> Option<ChatMessage> {
        if text.is_empty() {
            return None;
        }

        let origin_id = self.local_id.clone();
        let message = self.append(text, &origin_id);
        sender.send_line(protocol::encode_outgoing(text));
        Some(message)
    }

    /// Decode a raw line and apply it.
    pub fn on_inbound_line(&mut self, raw: &str) -> Option<ChatMessage> {
        self.on_inbound_frame(protocol::decode(raw))
    }

    /// Apply one decoded inbound frame.
    ///
    /// Returns the appended entry, or `None` if the frame was a self-echo or
    /// unrecognized.
    pub fn on_inbound_frame(&mut self, frame: InboundFrame) -> Option<ChatMessage> {
        match frame {
            InboundFrame::Message { from_id, text } => {
                if from_id == self.local_id {
                    log::trace!("Dropping self-echo: {text:?}");
                    return None;
                }
                Some(self.append(&text, &from_id))
            }
            InboundFrame::System { text } => {
                let message = self.append(&text, SYSTEM_ORIGIN);
                if text == PEER_LEFT_NOTICE && self.status != SessionStatus::PeerLeft {
                    log::info!("Peer left the session");
                    self.status = SessionStatus::PeerLeft;
                }
                Some(message)
            }
            InboundFrame::Unrecognized { raw } => {
                log::debug!("Ignoring unrecognized line: {raw:?}");
                None
            }
        }
    }

    /// Drop the conversation and start over as a fresh, active session.
    ///
    /// The caller is responsible for re-establishing the connection.
    pub fn reset(&mut self) {
        log::info!(
            "Resetting session ({} messages, status {})",
            self.log.len(),
            self.status
        );
        self.log.clear();
        self.next_message_id = 0;
        self.status = SessionStatus::Active;
        self.revision += 1;
    }

    fn append(&mut self, text: &str, origin_id: &str) -> ChatMessage {
        let message = ChatMessage::new(self.next_message_id, text, origin_id, (self.clock)());
        self.log.push(message.clone());
        self.next_message_id += 1;
        self.revision += 1;
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::RecordingSender;
    use chrono::TimeZone;

    fn fixed_clock() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, 7, 5, 0)
            .single()
            .unwrap()
    }

    fn session() -> Session {
        Session::with_clock("me", fixed_clock)
    }

    fn peer_message(from_id: &str, text: &str) -> InboundFrame {
        InboundFrame::Message {
            from_id: from_id.to_string(),
            text: text.to_string(),
        }
    }

    fn system(text: &str) -> InboundFrame {
        InboundFrame::System {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_new_session_is_empty_and_active() {
        let session = session();
        assert!(session.log().is_empty());
        assert_eq!(session.next_message_id(), 0);
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.local_id(), "me");
    }

    #[test]
    fn test_append_local_appends_and_sends() {
        let mut session = session();
        let sender = RecordingSender::default();

        let message = session.append_local("hello", &sender).unwrap();

        assert_eq!(message.message_id, 0);
        assert_eq!(message.origin_id, "me");
        assert_eq!(message.text, "hello");
        assert_eq!(session.log(), &[message]);
        assert_eq!(session.next_message_id(), 1);
        assert_eq!(sender.lines(), vec!["[message] hello".to_string()]);
    }

    #[test]
    fn test_append_local_empty_is_noop() {
        let mut session = session();
        let sender = RecordingSender::default();
        let revision = session.revision();

        assert!(session.append_local("", &sender).is_none());

        assert!(session.log().is_empty());
        assert_eq!(session.next_message_id(), 0);
        assert_eq!(session.revision(), revision);
        assert!(sender.lines().is_empty());
    }

    #[test]
    fn test_display_time_is_zero_padded() {
        let mut session = session();
        let message = session.append_local("x", &RecordingSender::default()).unwrap();
        assert_eq!(message.display_time, "07:05");
        assert_eq!(message.timestamp, fixed_clock());
    }

    #[test]
    fn test_self_echo_is_dropped() {
        let mut session = session();
        assert!(session.on_inbound_frame(peer_message("me", "x")).is_none());
        assert!(session.log().is_empty());
        assert_eq!(session.next_message_id(), 0);
    }

    #[test]
    fn test_peer_message_is_appended() {
        let mut session = session();
        let message = session.on_inbound_frame(peer_message("peer1", "hi")).unwrap();
        assert_eq!(message.origin_id, "peer1");
        assert_eq!(message.text, "hi");
        assert_eq!(session.log().len(), 1);
        assert!(!message.is_system());
    }

    #[test]
    fn test_peer_left_notice_appends_and_transitions() {
        let mut session = session();
        let message = session.on_inbound_frame(system(PEER_LEFT_NOTICE)).unwrap();

        assert!(message.is_system());
        assert_eq!(message.text, "The person has left.");
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.status(), SessionStatus::PeerLeft);
    }

    #[test]
    fn test_other_system_notice_keeps_status() {
        let mut session = session();
        session.on_inbound_frame(system("Some other notice")).unwrap();
        assert_eq!(session.log().len(), 1);
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_peer_left_notice_requires_exact_text() {
        let mut session = session();
        session.on_inbound_frame(system("The person has left")).unwrap();
        session.on_inbound_frame(system("the person has left.")).unwrap();
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_unrecognized_is_noop() {
        let mut session = session();
        let frame = InboundFrame::Unrecognized {
            raw: "garbage".to_string(),
        };
        assert!(session.on_inbound_frame(frame).is_none());
        assert!(session.log().is_empty());
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn test_input_allowed() {
        let mut session = session();
        assert!(session.is_input_allowed(false));
        assert!(!session.is_input_allowed(true));

        session.on_inbound_frame(system(PEER_LEFT_NOTICE));
        assert!(!session.is_input_allowed(false));
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut session = session();
        let sender = RecordingSender::default();
        session.append_local("a", &sender);
        session.on_inbound_frame(peer_message("p", "b"));
        session.on_inbound_frame(system(PEER_LEFT_NOTICE));
        let revision = session.revision();

        session.reset();

        assert!(session.log().is_empty());
        assert_eq!(session.next_message_id(), 0);
        assert_eq!(session.status(), SessionStatus::Active);
        assert!(session.revision() > revision);

        let message = session.append_local("again", &sender).unwrap();
        assert_eq!(message.message_id, 0);
    }

    #[test]
    fn test_conversation_sequence() {
        let mut session = session();
        let sender = RecordingSender::default();

        let a = session.append_local("a", &sender).unwrap();
        assert_eq!(a.message_id, 0);

        let b = session.on_inbound_line("[message] [peer] b").unwrap();
        assert_eq!(b.message_id, 1);

        assert!(session.on_inbound_line("[message] [me] a").is_none());
        assert_eq!(session.log().last().map(|m| m.message_id), Some(1));

        let left = session.on_inbound_line("[system] The person has left.").unwrap();
        assert_eq!(left.message_id, 2);
        assert_eq!(session.status(), SessionStatus::PeerLeft);

        let texts: Vec<&str> = session.log().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "The person has left."]);
        assert_eq!(session.next_message_id(), session.log().len() as u64);
    }
}
