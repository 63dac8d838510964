//! Overlay popups for the non-pane modes.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, EditTarget, Mode, EDIT_MENU};
use crate::cache::CacheEntry;

use super::render::hint_spans;
use super::theme::theme;

/// Key reference shown by the actions popup.
const ACTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Issues",
        &[
            ("j / k", "next / previous issue"),
            ("J / K", "scroll detail"),
            ("Ctrl+D / Ctrl+U", "detail half page"),
            ("f / F", "filter list / clear filter"),
            ("/", "search visible issues"),
            ("n / N", "next / previous match"),
            ("r", "reload issues"),
            ("o", "open in browser"),
            ("Enter", "open (choose mode: pick)"),
        ],
    ),
    (
        "Actions",
        &[
            ("c", "comments"),
            ("t", "transition status"),
            ("e", "edit fields"),
            ("u", "custom fields"),
            ("b", "switch board"),
        ],
    ),
    (
        "Layout",
        &[
            ("Tab", "toggle orientation"),
            ("1 / 2", "zoom issues / detail"),
            ("Alt+H / Alt+L", "shrink / grow issues pane"),
        ],
    ),
    (
        "General",
        &[("?", "this help"), ("Esc / q", "close popup or quit"), ("Ctrl+C", "quit")],
    ),
];

/// A rectangle of `percent_x` by `percent_y` centered in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x.min(100) / 100;
    let height = area.height * percent_y.min(100) / 100;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn popup_block(title: String) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(theme().border(true))
}

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let mode = app.mode().clone();
    let rect = match mode {
        Mode::EditInput(_) | Mode::Comments | Mode::ActionsHelp => centered_rect(80, 80, area),
        _ => centered_rect(60, 60, area),
    };
    frame.render_widget(Clear, rect);

    let key = app.selected_key().unwrap_or_default();
    match &mode {
        Mode::Comments => render_comments(frame, app, rect, &key),
        Mode::Transitions => render_transitions(frame, app, rect, &key),
        Mode::EditMenu => {
            let items = EDIT_MENU
                .iter()
                .map(|(shortcut, name)| ListItem::new(format!("[{}] {}", shortcut, name)))
                .collect();
            render_list(frame, rect, format!("Edit {}", key), items, app.popup_selected());
        }
        Mode::EditInput(target) => render_editor(frame, app, rect, target),
        Mode::Boards => render_boards(frame, app, rect),
        Mode::CustomFields => render_custom_fields(frame, app, rect),
        Mode::ActionsHelp => render_actions(frame, app, rect),
        Mode::Normal | Mode::FilterFocused | Mode::SearchActive => {}
    }
}

fn render_list(frame: &mut Frame, area: Rect, title: String, items: Vec<ListItem>, selected: usize) {
    let list = List::new(items)
        .block(popup_block(title))
        .highlight_style(theme().highlight())
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Loading and error states shared by popups backed by a cache entry.
/// Returns true when the placeholder was drawn.
fn render_placeholder<T>(frame: &mut Frame, area: Rect, title: &str, entry: Option<&CacheEntry<T>>) -> bool {
    let t = theme();
    let line = match entry {
        None | Some(CacheEntry::Loading) => Line::styled("Loading...", Style::default().fg(t.dim)),
        Some(CacheEntry::Error(e)) => Line::styled(e.banner(), Style::default().fg(t.error)),
        Some(CacheEntry::Loaded { .. }) => return false,
    };
    let paragraph = Paragraph::new(line)
        .block(popup_block(title.to_string()))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
    true
}

fn render_comments(frame: &mut Frame, app: &App, area: Rect, key: &str) {
    let t = theme();
    let title = format!("Comments {}", key);
    let entry = app.selected_comments();
    if render_placeholder(frame, area, &title, entry) {
        return;
    }
    let comments = entry.and_then(CacheEntry::value).map(Vec::as_slice).unwrap_or(&[]);
    if comments.is_empty() {
        let paragraph = Paragraph::new(Line::styled("No comments yet. Press a to add one.", Style::default().fg(t.dim)))
            .block(popup_block(title));
        frame.render_widget(paragraph, area);
        return;
    }

    let items = comments
        .iter()
        .map(|c| {
            let mut text = Text::from(Line::from(vec![
                Span::styled(c.author.clone(), Style::default().fg(t.accent).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", c.created), Style::default().fg(t.dim)),
            ]));
            text.extend(c.body.lines().map(|l| Line::from(format!("  {}", l))));
            text.push_line(Line::from(""));
            ListItem::new(text)
        })
        .collect();
    render_list(frame, area, format!("{} ({})", title, comments.len()), items, app.popup_selected());
}

fn render_transitions(frame: &mut Frame, app: &App, area: Rect, key: &str) {
    let t = theme();
    let title = format!("Transition {}", key);
    let entry = app.selected_transitions();
    if render_placeholder(frame, area, &title, entry) {
        return;
    }
    let items: Vec<ListItem> = entry
        .and_then(CacheEntry::value)
        .map(|list| {
            list.iter()
                .map(|tr| {
                    ListItem::new(Line::from(vec![
                        Span::raw(tr.name.clone()),
                        Span::styled(" -> ", Style::default().fg(t.dim)),
                        Span::styled(tr.to_status.clone(), Style::default().fg(t.status_color(&tr.to_status))),
                    ]))
                })
                .collect()
        })
        .unwrap_or_default();
    if items.is_empty() {
        let paragraph = Paragraph::new(Line::styled("No transitions available", Style::default().fg(t.dim)))
            .block(popup_block(title));
        frame.render_widget(paragraph, area);
        return;
    }
    render_list(frame, area, title, items, app.popup_selected());
}

fn render_boards(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    let active = match app.source() {
        crate::config::QuerySource::Board(name) => app.config().board(name.as_deref()).ok().map(|b| b.name.clone()),
        crate::config::QuerySource::Query(_) => None,
    };
    let items = app
        .boards()
        .iter()
        .map(|board| {
            let marker = if active.as_deref() == Some(board.name.as_str()) { "* " } else { "  " };
            let mut spans = vec![Span::raw(format!("{}{}", marker, board.name))];
            if let Some(description) = &board.description {
                spans.push(Span::styled(format!("  {}", description), Style::default().fg(t.dim)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    render_list(frame, area, "Boards".to_string(), items, app.popup_selected());
}

fn render_custom_fields(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    if app.custom_fields().is_empty() {
        let paragraph = Paragraph::new(Line::styled(
            "No custom fields configured",
            Style::default().fg(t.dim),
        ))
        .block(popup_block("Custom Fields".to_string()));
        frame.render_widget(paragraph, area);
        return;
    }
    let items = app
        .custom_fields()
        .iter()
        .map(|spec| {
            let mut spans = vec![
                Span::raw(spec.name.clone()),
                Span::styled(format!(" ({})", spec.field_type), Style::default().fg(t.dim)),
            ];
            if let Some(description) = &spec.description {
                spans.push(Span::styled(format!("  {}", description), Style::default().fg(t.dim)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    render_list(frame, area, "Custom Fields".to_string(), items, app.popup_selected());
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect, target: &EditTarget) {
    let t = theme();
    let Some(session) = app.edit_session() else {
        return;
    };
    let block = popup_block(format!("Edit {}: {}", target.label(), session.key));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let mut text = Text::from(session.buffer.clone());
    text.push_span(Span::styled("▏", Style::default().fg(t.accent)));
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), chunks[0]);
    frame.render_widget(Paragraph::new(Line::from(hint_spans(target.submit_hint()))), chunks[1]);
}

fn render_actions(frame: &mut Frame, app: &mut App, area: Rect) {
    let t = theme();
    let block = popup_block("Actions".to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    for (section, bindings) in ACTIONS {
        lines.push(Line::styled(
            format!("-- {} --", section),
            Style::default().fg(t.warning).add_modifier(Modifier::BOLD),
        ));
        for (keys, description) in bindings.iter() {
            lines.push(Line::from(vec![
                Span::styled(format!("{:>16}", keys), Style::default().fg(t.success)),
                Span::raw("  "),
                Span::raw(*description),
            ]));
        }
        lines.push(Line::from(""));
    }

    let scroll = &mut app.layout_mut().popup_scroll;
    scroll.set_metrics(u16::try_from(lines.len()).unwrap_or(u16::MAX), inner.height);
    let offset = scroll.offset();
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);
}
