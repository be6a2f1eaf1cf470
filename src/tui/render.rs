//! Chat TUI rendering.
//!
//! Rendering reads state through [`RenderContext`] and never mutates it:
//!
//! ```text
//! TuiApp ──builds──> RenderContext ──passed to──> render()
//! ```
//!
//! Layout, top to bottom: status header, conversation pane, input line, key
//! hints. The exit confirmation is drawn as a modal over everything.

// Rust guideline compliant 2026-02

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tui_input::Input;

use crate::constants::{
    BUBBLE_WIDTH_PERCENT, CONFIRM_MODAL_HEIGHT_PERCENT, CONFIRM_MODAL_WIDTH_PERCENT, LOCAL_LABEL,
    PEER_LABEL, SYSTEM_LABEL,
};
use crate::controller::{ControllerPhase, LinkStatus};
use crate::session::{ChatMessage, Session, SessionStatus};

/// Everything the renderer needs, borrowed from the app.
#[derive(Debug)]
pub struct RenderContext<'a> {
    /// Session to display.
    pub session: &'a Session,
    /// Current controller phase.
    pub phase: ControllerPhase,
    /// Connection status.
    pub link: &'a LinkStatus,
    /// Whether we are still waiting for a peer.
    pub queued: bool,
    /// Whether the input line accepts messages.
    pub input_allowed: bool,
    /// Draft message.
    pub input: &'a Input,
}

/// Creates a centered rectangle within a parent area.
pub fn centered_rect(percent_x: u16, percent_y: u16, parent: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(parent);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Draw the whole UI.
pub fn render(frame: &mut Frame<'_>, ctx: &RenderContext<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], ctx);
    render_conversation(frame, chunks[1], ctx);
    render_input(frame, chunks[2], ctx);
    render_hints(frame, chunks[3], ctx);

    if ctx.phase == ControllerPhase::ConfirmExit {
        render_confirm_exit(frame, frame.area());
    }
}

fn render_header(frame: &mut Frame<'_>, area: Rect, ctx: &RenderContext<'_>) {
    let status_style = match ctx.session.status() {
        SessionStatus::Active => Style::default().fg(Color::Green),
        SessionStatus::PeerLeft => Style::default().fg(Color::Yellow),
    };
    let link_style = match ctx.link {
        LinkStatus::Connected => Style::default().fg(Color::Green),
        LinkStatus::Connecting => Style::default().fg(Color::Yellow),
        LinkStatus::Disconnected(_) => Style::default().fg(Color::Red),
    };

    let line = Line::from(vec![
        Span::styled(" pairchat ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("| id {} | ", ctx.session.local_id())),
        Span::styled(ctx.session.status().to_string(), status_style),
        Span::raw(" | "),
        Span::styled(ctx.link.to_string(), link_style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_conversation(frame: &mut Frame<'_>, area: Rect, ctx: &RenderContext<'_>) {
    let block = Block::default().borders(Borders::ALL).title(" Chat ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = conversation_lines(ctx.session, inner.width);
    if ctx.queued {
        lines.push(
            Line::from(Span::styled(
                "Waiting for a stranger...",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center),
        );
    }

    // Keep the newest entry in view.
    let overflow = lines.len().saturating_sub(inner.height as usize);
    let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}

/// Build display lines for the log, wrapped to fit `width`.
///
/// Local messages are right-aligned, peer messages left-aligned, system
/// entries centered and dimmed.
pub fn conversation_lines(session: &Session, width: u16) -> Vec<Line<'static>> {
    let bubble_width = (usize::from(width) * usize::from(BUBBLE_WIDTH_PERCENT) / 100).max(1);
    let mut lines = Vec::new();

    for message in session.log() {
        let (label, alignment, style) = message_style(message, session.local_id());

        lines.push(
            Line::from(Span::styled(
                format!("{label} {}", message.display_time),
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(alignment),
        );
        for chunk in wrap_text(&message.text, bubble_width) {
            lines.push(Line::from(Span::styled(chunk, style)).alignment(alignment));
        }
    }
    lines
}

fn message_style(message: &ChatMessage, local_id: &str) -> (&'static str, Alignment, Style) {
    if message.is_system() {
        (
            SYSTEM_LABEL,
            Alignment::Center,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )
    } else if message.origin_id == local_id {
        (LOCAL_LABEL, Alignment::Right, Style::default().fg(Color::Cyan))
    } else {
        (PEER_LABEL, Alignment::Left, Style::default())
    }
}

/// Split `text` into chunks of at most `width` characters, breaking at
/// spaces where possible. Empty text yields one empty chunk.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split(' ') {
        let word_len = word.chars().count();
        let needed = if current_len == 0 { word_len } else { current_len + 1 + word_len };

        if needed <= width {
            if current_len > 0 {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
            continue;
        }

        if current_len > 0 {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        // Hard-split words longer than a line.
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            let rest = chars.split_off(width);
            chunks.push(chars.into_iter().collect());
            chars = rest;
        }
        current = chars.into_iter().collect();
        current_len = current.chars().count();
    }

    chunks.push(current);
    chunks
}

fn render_input(frame: &mut Frame<'_>, area: Rect, ctx: &RenderContext<'_>) {
    let (title, style) = if ctx.input_allowed {
        (" Message ", Style::default())
    } else if ctx.session.status() == SessionStatus::PeerLeft {
        (" Chat ended ", Style::default().fg(Color::DarkGray))
    } else {
        (" Waiting... ", Style::default().fg(Color::DarkGray))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(style);
    let inner = block.inner(area);
    let width = usize::from(inner.width.max(1));
    let scroll = ctx.input.visual_scroll(width);

    let paragraph = Paragraph::new(ctx.input.value())
        .style(style)
        .scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX)))
        .block(block);
    frame.render_widget(paragraph, area);

    if ctx.input_allowed && ctx.phase == ControllerPhase::Chatting {
        let offset = ctx.input.visual_cursor().saturating_sub(scroll);
        let x = inner.x + u16::try_from(offset).unwrap_or(inner.width);
        frame.set_cursor_position((x.min(inner.x + inner.width), inner.y));
    }
}

fn render_hints(frame: &mut Frame<'_>, area: Rect, ctx: &RenderContext<'_>) {
    let hints = match ctx.phase {
        ControllerPhase::Chatting => " Enter send | Esc leave chat | Ctrl+C quit",
        ControllerPhase::ConfirmExit => " y confirm | n cancel",
    };
    frame.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_confirm_exit(frame: &mut Frame<'_>, parent: Rect) {
    let area = centered_rect(CONFIRM_MODAL_WIDTH_PERCENT, CONFIRM_MODAL_HEIGHT_PERCENT, parent);
    let text = vec![
        Line::from("Leave this chat and find someone new?"),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" Leave   "),
            Span::styled("[n]", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" Stay"),
        ]),
    ];

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Exit ")),
        area,
    );
}
