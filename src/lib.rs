//! pairchat - terminal client for two-party chat sessions.
//!
//! The client connects to a chat relay over WebSocket, gets paired with a
//! stranger, and exchanges line-oriented protocol frames with them.
//!
//! # Architecture
//!
//! ```text
//! WsConnection ──ConnectionUpdate──┐
//! terminal keys / stdin ───────────┴─> event queue ─> SessionController ─> Session
//!                                                            │
//!                                           protocol::encode_outgoing ─> WsConnection
//! ```
//!
//! # Modules
//!
//! - [`protocol`] - wire line codec
//! - [`session`] - conversation log and session status state machine
//! - [`controller`] - user intents, exit confirmation, matchmaking queue
//! - [`connection`] / [`ws`] - relay connection on a background thread
//! - [`events`] - the single ordered event queue
//! - [`tui`] / [`headless`] - front ends
//! - [`config`] - configuration loading/saving

pub mod config;
pub mod connection;
pub mod constants;
pub mod controller;
pub mod env;
pub mod events;
pub mod headless;
pub mod protocol;
pub mod session;
pub mod tui;
pub mod ws;

// Re-export commonly used types
pub use config::Config;
pub use connection::{Connection, LineSender, WsConnection};
pub use controller::{ControllerPhase, Intent, LinkStatus, MatchQueue, SessionController};
pub use protocol::{decode, encode_outgoing, InboundFrame};
pub use session::{ChatMessage, Session, SessionStatus};
