//! Application-wide constants for pairchat.
//!
//! # Categories
//!
//! - **Relay**: default endpoint
//! - **Event loop**: polling intervals
//! - **UI**: layout dimensions and labels

use std::time::Duration;

// ============================================================================
// Relay
// ============================================================================

/// Relay endpoint used when neither config nor flags name one.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8080/ws";

// ============================================================================
// Event loop
// ============================================================================

/// How long the TUI waits for a key press before draining the event queue
/// and redrawing (roughly 60fps).
pub const FRAME_RATE_DELAY: Duration = Duration::from_millis(16);

/// Headless loop wait between checks of the shutdown flag.
pub const HEADLESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// UI Layout
// ============================================================================

/// Maximum width of a message bubble as a percentage of the chat pane.
pub const BUBBLE_WIDTH_PERCENT: u16 = 70;

/// Exit confirmation modal width.
pub const CONFIRM_MODAL_WIDTH_PERCENT: u16 = 50;

/// Exit confirmation modal height.
pub const CONFIRM_MODAL_HEIGHT_PERCENT: u16 = 25;

/// Label shown next to system entries.
pub const SYSTEM_LABEL: &str = "system";

/// Label shown next to the local participant's messages.
pub const LOCAL_LABEL: &str = "you";

/// Label shown next to the peer's messages.
pub const PEER_LABEL: &str = "stranger";
