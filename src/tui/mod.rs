//! Terminal user interface for the chat client.
//!
//! - [`input`] maps key presses to actions for the current phase
//! - [`render`] draws the conversation, input line and exit modal
//! - [`runner`] owns the app state and drives the event loop
//! - [`guard`] sets up the terminal and restores it on drop

pub mod guard;
pub mod input;
pub mod render;
pub mod runner;

pub use guard::{restore_terminal, TerminalGuard};
pub use runner::{run, TuiApp};
