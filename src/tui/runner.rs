//! TUI event loop.
//!
//! [`TuiApp`] owns the controller and the draft input. The loop polls the
//! terminal for keys, pushes them onto the shared event queue behind any
//! connection events already waiting there, then drains the queue in order.
//! Redraws happen only when something changed: a new session revision, or a
//! key, resize or link status change that the session does not track.

// Rust guideline compliant 2026-02

use std::io::Stdout;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tui_input::Input;

use super::input::{map_key, KeyAction};
use super::render::{render, RenderContext};
use crate::connection::Connection;
use crate::constants::FRAME_RATE_DELAY;
use crate::controller::{ControllerPhase, Intent, SessionController};
use crate::events::{AppEvent, EventReceiver, EventSender};

/// Controller plus TUI-local state.
#[derive(Debug)]
pub struct TuiApp<C: Connection> {
    controller: SessionController<C>,
    input: Input,
    dirty: bool,
    drawn_revision: Option<u64>,
}

impl<C: Connection> TuiApp<C> {
    /// Wrap a controller.
    pub fn new(controller: SessionController<C>) -> Self {
        Self {
            controller,
            input: Input::default(),
            dirty: false,
            drawn_revision: None,
        }
    }

    /// The wrapped controller.
    pub fn controller(&self) -> &SessionController<C> {
        &self.controller
    }

    /// Current draft text.
    pub fn draft(&self) -> &str {
        self.input.value()
    }

    /// Whether the app should leave its loop.
    pub fn should_quit(&self) -> bool {
        self.controller.should_quit()
    }

    /// Whether the screen is out of date.
    pub fn needs_redraw(&self) -> bool {
        self.dirty || self.drawn_revision != Some(self.controller.session().revision())
    }

    /// Handle one queued event.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Connection(update) => {
                let link = self.controller.link_status().clone();
                let queued = self.controller.is_queued();
                self.controller.handle_connection(update);
                if *self.controller.link_status() != link || self.controller.is_queued() != queued {
                    self.dirty = true;
                }
            }
            AppEvent::Key(key) => {
                self.handle_key_action(map_key(key, self.controller.phase()));
                self.dirty = true;
            }
            AppEvent::Resize => self.dirty = true,
            AppEvent::InputLine(_) | AppEvent::InputClosed => {
                log::debug!("Ignoring stdin event in TUI mode");
            }
        }
    }

    fn handle_key_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::None => {}
            KeyAction::Intent(intent) => {
                self.controller.handle_intent(intent);
            }
            KeyAction::Submit => {
                let text = self.input.value().to_string();
                if self.controller.handle_intent(Intent::Send(text)).is_some() {
                    self.input.reset();
                }
            }
            KeyAction::Edit(request) => {
                if self.controller.phase() == ControllerPhase::Chatting {
                    self.input.handle(request);
                }
            }
        }
    }

    /// Draw the current state.
    pub fn draw(&self, frame: &mut Frame<'_>) {
        let ctx = RenderContext {
            session: self.controller.session(),
            phase: self.controller.phase(),
            link: self.controller.link_status(),
            queued: self.controller.is_queued(),
            input_allowed: self.controller.is_input_allowed(),
            input: &self.input,
        };
        render(frame, &ctx);
    }

    /// Record that the current state is on screen.
    pub fn mark_drawn(&mut self) {
        self.dirty = false;
        self.drawn_revision = Some(self.controller.session().revision());
    }

    /// Close the connection.
    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }
}

/// Run the TUI until the user quits or `shutdown_flag` is raised.
///
/// # Errors
///
/// Returns an error if drawing or reading terminal events fails.
pub fn run<C: Connection>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut TuiApp<C>,
    events_tx: &EventSender,
    events_rx: &EventReceiver,
    shutdown_flag: &AtomicBool,
) -> Result<()> {
    log::info!("TUI event loop starting");

    while !app.should_quit() && !shutdown_flag.load(Ordering::Relaxed) {
        if app.needs_redraw() {
            terminal.draw(|f| app.draw(f))?;
            app.mark_drawn();
        }

        if event::poll(FRAME_RATE_DELAY)? {
            match event::read()? {
                Event::Key(key) => {
                    let _ = events_tx.send(AppEvent::Key(key));
                }
                Event::Resize(_, _) => {
                    let _ = events_tx.send(AppEvent::Resize);
                }
                _ => {}
            }
        }

        for event in events_rx.try_iter() {
            app.handle_event(event);
            if app.should_quit() {
                break;
            }
        }
    }

    log::info!("TUI event loop exiting");
    app.shutdown();
    Ok(())
}
