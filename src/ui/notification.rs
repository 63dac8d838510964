//! Toasts for write results and load failures.
//!
//! The status line always holds the latest message; toasts are the
//! transient, colored copy stacked in the bottom-right corner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const MAX_VISIBLE: usize = 3;
const TOAST_WIDTH: u16 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl ToastKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastKind::Info => "i",
            ToastKind::Success => "✓",
            ToastKind::Error => "✗",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            ToastKind::Info => Color::Cyan,
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        }
    }

    /// Errors stay up longer so they can be read.
    fn lifetime(&self) -> Duration {
        match self {
            ToastKind::Error => Duration::from_secs(6),
            ToastKind::Info | ToastKind::Success => Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    expires_at: Instant,
}

impl Toast {
    fn new(message: String, kind: ToastKind, now: Instant) -> Self {
        Self {
            message,
            expires_at: now + kind.lifetime(),
            kind,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Bounded stack of live toasts, oldest first.
#[derive(Debug, Default)]
pub struct Notifications {
    toasts: VecDeque<Toast>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a toast created at `now`. The oldest is dropped past the limit.
    pub fn push_at(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        self.toasts.push_back(Toast::new(message.into(), kind, now));
        while self.toasts.len() > MAX_VISIBLE {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push_at(message, ToastKind::Info, Instant::now());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push_at(message, ToastKind::Success, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push_at(message, ToastKind::Error, Instant::now());
    }

    /// Drop expired toasts.
    pub fn tick(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired(now));
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.toasts.is_empty() {
            return;
        }

        let width = TOAST_WIDTH.min(area.width.saturating_sub(4));
        // Borders plus the icon column.
        let text_width = width.saturating_sub(4).max(1) as usize;
        let heights: Vec<u16> = self
            .toasts
            .iter()
            .map(|t| {
                let chars = t.message.chars().count() + 2;
                chars.div_ceil(text_width) as u16 + 2
            })
            .collect();
        let total = heights.iter().sum::<u16>().min(area.height.saturating_sub(2));

        let stack = Rect::new(
            area.x + area.width.saturating_sub(width + 2),
            area.y + area.height.saturating_sub(total + 1),
            width,
            total,
        );
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(heights.iter().map(|&h| Constraint::Length(h)))
            .split(stack);

        for (toast, row) in self.toasts.iter().zip(rows.iter()) {
            render_toast(toast, frame, *row);
        }
    }
}

fn render_toast(toast: &Toast, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);
    let style = Style::default().fg(toast.kind.color());
    let line = Line::from(vec![
        Span::styled(format!("{} ", toast.kind.icon()), style.add_modifier(Modifier::BOLD)),
        Span::styled(toast.message.as_str(), style),
    ]);
    let paragraph = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).border_style(style))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
