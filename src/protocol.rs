//! Line protocol codec for the chat relay.
//!
//! Every WebSocket text frame carries exactly one protocol line:
//!
//! ```text
//! [message] [<senderId>] <text>    chat message relayed from <senderId>
//! [system] <text>                  session lifecycle / server notice
//! <anything else>                  unrecognized, ignored
//! ```
//!
//! Outgoing messages carry no sender id; the relay stamps it before
//! broadcasting to both participants. Text is never escaped, so message text
//! that itself starts with a tag cannot be told apart from a real frame.

// Rust guideline compliant 2026-02

/// Tag prefixing chat message lines.
pub const MESSAGE_TAG: &str = "[message]";

/// Tag prefixing system notice lines.
pub const SYSTEM_TAG: &str = "[system]";

/// System notice sent by the relay when the other participant leaves.
pub const PEER_LEFT_NOTICE: &str = "The person has left.";

/// A decoded inbound protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Chat message relayed from a participant (possibly ourselves).
    Message {
        /// Sender identifier stamped by the relay.
        from_id: String,
        /// Message text, verbatim.
        text: String,
    },
    /// Relay-originated notice.
    System {
        /// Notice text.
        text: String,
    },
    /// Line that matched no known tag or was structurally malformed.
    Unrecognized {
        /// The original line.
        raw: String,
    },
}

impl InboundFrame {
    /// Short label for log output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::System { .. } => "system",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// Decode one raw line into a frame.
///
/// Never fails: a `[message]` line without a complete `[<senderId>]` bracket
/// pair degrades to [`InboundFrame::Unrecognized`].
#[must_use]
pub fn decode(raw: &str) -> InboundFrame {
    if let Some(rest) = raw.strip_prefix(MESSAGE_TAG) {
        return decode_message(rest).unwrap_or_else(|| unrecognized(raw));
    }

    if let Some(rest) = raw.strip_prefix(SYSTEM_TAG) {
        let text = rest.strip_prefix(' ').unwrap_or(rest);
        return InboundFrame::System {
            text: text.to_string(),
        };
    }

    unrecognized(raw)
}

/// Parse the part of a message line following the tag: ` [<id>] <text>`.
///
/// The sender bracket must follow the tag directly or after one space.
fn decode_message(rest: &str) -> Option<InboundFrame> {
    let after_open = rest.strip_prefix(' ').unwrap_or(rest).strip_prefix('[')?;
    let close = after_open.find(']')?;

    let from_id = &after_open[..close];
    let tail = &after_open[close + 1..];

    // Drop exactly one separator character after the closing bracket.
    let mut chars = tail.chars();
    chars.next();
    let text = chars.as_str();

    Some(InboundFrame::Message {
        from_id: from_id.to_string(),
        text: text.to_string(),
    })
}

fn unrecognized(raw: &str) -> InboundFrame {
    InboundFrame::Unrecognized {
        raw: raw.to_string(),
    }
}

/// Encode a local chat message for the wire.
#[must_use]
pub fn encode_outgoing(text: &str) -> String {
    format!("{MESSAGE_TAG} {text}")
}
