//! Headless mode: stdin in, transcript out.
//!
//! Each stdin line is sent as a chat message, except for two commands:
//!
//! - `/exit` leaves the current chat and reconnects for a new one
//! - `/quit` closes the connection and ends the program
//!
//! New log entries and connection status changes are written to the output
//! as they happen. A line that cannot be sent right now (no stranger yet, or
//! the chat has ended) is reported with a `-- not sent` notice. End of input
//! behaves like `/quit`.

// Rust guideline compliant 2026-02

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;

use anyhow::Result;

use crate::connection::Connection;
use crate::constants::{HEADLESS_POLL_INTERVAL, LOCAL_LABEL, PEER_LABEL, SYSTEM_LABEL};
use crate::controller::{ControllerPhase, Intent, LinkStatus, SessionController};
use crate::events::{AppEvent, EventReceiver, EventSender};
use crate::session::{ChatMessage, SessionStatus};

const EXIT_COMMAND: &str = "/exit";
const QUIT_COMMAND: &str = "/quit";

/// Format one log entry as a transcript line.
pub fn transcript_line(message: &ChatMessage, local_id: &str) -> String {
    if message.is_system() {
        format!("[{}] * {}: {}", message.display_time, SYSTEM_LABEL, message.text)
    } else if message.origin_id == local_id {
        format!("[{}] {}: {}", message.display_time, LOCAL_LABEL, message.text)
    } else {
        format!("[{}] {}: {}", message.display_time, PEER_LABEL, message.text)
    }
}

/// Map one stdin line to intents.
fn intents_for_line(line: &str) -> Vec<Intent> {
    match line.trim_end() {
        EXIT_COMMAND => vec![Intent::RequestExit, Intent::ConfirmExit],
        QUIT_COMMAND => vec![Intent::Quit],
        _ => vec![Intent::Send(line.to_string())],
    }
}

/// Why the controller refused to send a line.
fn refusal_reason<C: Connection>(controller: &SessionController<C>) -> &'static str {
    if controller.phase() == ControllerPhase::ConfirmExit {
        "leaving chat"
    } else if controller.session().status() == SessionStatus::PeerLeft {
        "chat ended"
    } else if controller.is_queued() {
        "waiting for a stranger"
    } else {
        "input disabled"
    }
}

/// Tracks what has already been written so only new entries are printed.
#[derive(Debug, Default)]
struct TranscriptWriter {
    printed: usize,
    revision: Option<u64>,
    last_link: Option<LinkStatus>,
}

impl TranscriptWriter {
    fn flush_new<C: Connection, W: Write>(
        &mut self,
        controller: &SessionController<C>,
        out: &mut W,
    ) -> Result<()> {
        let link = controller.link_status();
        if self.last_link.as_ref() != Some(link) {
            writeln!(out, "-- {link}")?;
            self.last_link = Some(link.clone());
        }

        let session = controller.session();
        if self.revision == Some(session.revision()) {
            out.flush()?;
            return Ok(());
        }
        self.revision = Some(session.revision());

        let log = session.log();
        if log.len() < self.printed {
            writeln!(out, "-- new session")?;
            self.printed = 0;
        }
        for message in &log[self.printed..] {
            writeln!(out, "{}", transcript_line(message, session.local_id()))?;
        }
        self.printed = log.len();
        out.flush()?;
        Ok(())
    }
}

/// Run without a terminal UI until `/quit`, end of input, or
/// `shutdown_flag`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn run_headless<C: Connection, W: Write>(
    controller: &mut SessionController<C>,
    events_rx: &EventReceiver,
    shutdown_flag: &AtomicBool,
    out: &mut W,
) -> Result<()> {
    log::info!("Headless loop starting");
    let mut transcript = TranscriptWriter::default();
    transcript.flush_new(controller, out)?;

    while !controller.should_quit() && !shutdown_flag.load(Ordering::Relaxed) {
        let event = match events_rx.recv_timeout(HEADLESS_POLL_INTERVAL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match event {
            AppEvent::Connection(update) => {
                controller.handle_connection(update);
            }
            AppEvent::InputLine(line) => {
                for intent in intents_for_line(&line) {
                    let is_send = matches!(&intent, Intent::Send(text) if !text.is_empty());
                    if controller.handle_intent(intent).is_none() && is_send {
                        log::info!("Line not sent: {}", refusal_reason(controller));
                        transcript.flush_new(controller, out)?;
                        writeln!(out, "-- not sent: {}", refusal_reason(controller))?;
                    }
                }
            }
            AppEvent::InputClosed => {
                controller.handle_intent(Intent::Quit);
            }
            AppEvent::Key(_) | AppEvent::Resize => {}
        }

        transcript.flush_new(controller, out)?;
    }

    log::info!("Headless loop exiting");
    controller.shutdown();
    Ok(())
}

/// Forward stdin lines to the event queue from a background thread.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_stdin_reader(events: EventSender) -> Result<()> {
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if events.send(AppEvent::InputLine(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        log::warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
            let _ = events.send(AppEvent::InputClosed);
        })?;
    Ok(())
}
