//! Frame rendering: header, issue list, detail pane, bars and overlays.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::api::types::IssueDetail;
use crate::app::{App, Mode};
use crate::cache::CacheEntry;

use super::layout::Pane;
use super::popup;
use super::theme::theme;

/// Draw one frame. Records pane sizes back into the layout for scrolling.
pub fn render(frame: &mut Frame, app: &mut App) {
    let show_bar = matches!(app.mode(), Mode::FilterFocused | Mode::SearchActive)
        || !app.filter_text().is_empty();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(u16::from(show_bar)),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, rows[0]);

    let (issues_area, detail_area) = app.layout().split(rows[1]);
    if let Some(area) = issues_area {
        render_issue_list(frame, app, area);
    }
    if let Some(area) = detail_area {
        render_detail(frame, app, area);
    }
    if show_bar {
        render_input_bar(frame, app, rows[2]);
    }
    render_status(frame, app, rows[3]);
    render_hints(frame, app.mode(), rows[4]);

    if app.mode().is_popup() {
        popup::render(frame, app, rows[1]);
    }
    app.notifications().render(frame, rows[1]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    let mut spans = vec![
        Span::styled(" jayrah-tui ", Style::default().fg(t.accent).add_modifier(Modifier::BOLD)),
        Span::styled("| ", Style::default().fg(t.dim)),
        Span::raw(app.source().describe()),
    ];
    if let Some(CacheEntry::Loaded { value, .. }) = app.issue_list_entry() {
        spans.push(Span::styled(
            format!(" | {}/{} issues", app.visible_issues().len(), value.len()),
            Style::default().fg(t.dim),
        ));
    }
    if app.is_choose_mode() {
        spans.push(Span::styled(
            "  [choose: Enter picks]",
            Style::default().fg(t.warning),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_issue_list(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    let focused = app.layout().zoom() != Some(Pane::Detail);
    let block = Block::default()
        .title(" Issues ")
        .borders(Borders::ALL)
        .border_style(t.border(focused));

    let placeholder = match app.issue_list_entry() {
        None | Some(CacheEntry::Loading) => Some(Line::styled("Loading issues...", Style::default().fg(t.dim))),
        Some(CacheEntry::Error(e)) => Some(Line::styled(e.banner(), Style::default().fg(t.error))),
        Some(CacheEntry::Loaded { .. }) if app.visible_issues().is_empty() => {
            Some(Line::styled("No matching issues", Style::default().fg(t.dim)))
        }
        Some(CacheEntry::Loaded { .. }) => None,
    };
    if let Some(line) = placeholder {
        let paragraph = Paragraph::new(line).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows: Vec<Row> = app
        .visible_issues()
        .into_iter()
        .map(|issue| {
            Row::new(vec![
                Cell::from(issue.key.clone()).style(Style::default().fg(t.accent)),
                Cell::from(issue.status.clone())
                    .style(Style::default().fg(t.status_color(&issue.status))),
                Cell::from(issue.summary.clone()),
                Cell::from(issue.assignee.clone()).style(Style::default().fg(t.dim)),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Length(14),
    ];
    let table = Table::new(rows, widths)
        .block(block)
        .highlight_style(t.highlight())
        .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(app.selected_position()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn detail_lines(detail: &IssueDetail) -> Vec<Line<'static>> {
    let t = theme();
    let label = |name: &str| Span::styled(format!("{:<11}", name), Style::default().fg(t.dim));
    let mut lines = vec![
        Line::from(vec![
            Span::styled(detail.key.clone(), Style::default().fg(t.accent).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(detail.summary.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(vec![label("Type"), Span::raw(detail.issue_type.clone())]),
        Line::from(vec![
            label("Status"),
            Span::styled(detail.status.clone(), Style::default().fg(t.status_color(&detail.status))),
        ]),
        Line::from(vec![label("Priority"), Span::raw(detail.priority.clone())]),
        Line::from(vec![label("Assignee"), Span::raw(detail.assignee.clone())]),
        Line::from(vec![label("Reporter"), Span::raw(detail.reporter.clone())]),
        Line::from(vec![label("Created"), Span::raw(detail.created.clone())]),
        Line::from(vec![label("Updated"), Span::raw(detail.updated.clone())]),
    ];
    for (name, values) in [
        ("Labels", &detail.labels),
        ("Components", &detail.components),
        ("Fix", &detail.fix_versions),
    ] {
        if !values.is_empty() {
            lines.push(Line::from(vec![label(name), Span::raw(values.join(", "))]));
        }
    }
    for (field, value) in &detail.custom_fields {
        if !value.is_empty() {
            lines.push(Line::from(vec![label(field), Span::raw(value.clone())]));
        }
    }

    lines.push(Line::from(""));
    if detail.description.trim().is_empty() {
        lines.push(Line::styled("(no description)", Style::default().fg(t.dim)));
    } else {
        lines.extend(detail.description.lines().map(|l| Line::from(l.to_string())));
    }
    lines
}

/// Rows taken by `lines` wrapped to `width`.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines.iter().map(|l| l.width().max(1).div_ceil(width)).sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
    let t = theme();
    let title = match app.selected_detail() {
        Some(entry) => format!(" Detail {} ", entry.icon()),
        None => " Detail ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(t.border(app.layout().zoom() == Some(Pane::Detail)));
    let inner = block.inner(area);

    let lines = match app.selected_detail() {
        Some(CacheEntry::Loaded { value, .. }) => detail_lines(value),
        Some(CacheEntry::Error(e)) => vec![Line::styled(e.banner(), Style::default().fg(t.error))],
        Some(CacheEntry::Loading) => vec![Line::styled("Loading detail...", Style::default().fg(t.dim))],
        None if app.selected_issue().is_some() => {
            vec![Line::styled("Waiting for selection to settle...", Style::default().fg(t.dim))]
        }
        None => vec![Line::styled("No issue selected", Style::default().fg(t.dim))],
    };

    let height = wrapped_height(&lines, inner.width);
    let scroll = &mut app.layout_mut().detail_scroll;
    scroll.set_metrics(height, inner.height);
    let offset = scroll.offset();

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn render_input_bar(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    let line = match app.mode() {
        Mode::FilterFocused => Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(t.accent)),
            Span::raw(format!("{}▏", app.filter_text())),
        ]),
        Mode::SearchActive => Line::from(vec![
            Span::styled("/", Style::default().fg(t.accent)),
            Span::raw(format!("{}▏", app.search_input())),
        ]),
        _ => Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(t.dim)),
            Span::raw(app.filter_text().to_string()),
            Span::styled("  (F clears)", Style::default().fg(t.dim)),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    let style = if app.status().starts_with("Failed") || app.status().starts_with("Not submitted") {
        Style::default().fg(t.error)
    } else {
        Style::default()
    };
    frame.render_widget(Paragraph::new(Line::styled(app.status().to_string(), style)), area);
}

fn mode_hints(mode: &Mode) -> &'static str {
    match mode {
        Mode::Normal => "[j/k] move [/] search [f] filter [c] comments [t] transition [e] edit [b] boards [r] reload [o] open [?] help [q] quit",
        Mode::FilterFocused => "[type] filter [Ctrl+U] clear [Enter/Esc] done",
        Mode::SearchActive => "[Enter] search [Ctrl+U] clear [Esc] cancel",
        Mode::Comments => "[n/p] comment [j/k] issue [a] add [r] reload [Esc] close",
        Mode::Transitions => "[n/p] select [Enter] apply [Esc] close",
        Mode::EditMenu => "[s/d/l/m/u] field [n/p] select [Enter] edit [Esc] close",
        Mode::EditInput(target) => target.submit_hint(),
        Mode::Boards => "[j/k] select [Enter] switch [Esc] close",
        Mode::CustomFields => "[n/p] select [Enter] edit [Esc] close",
        Mode::ActionsHelp => "[j/k] scroll [Ctrl+D/U] page [Esc] close",
    }
}

fn render_hints(frame: &mut Frame, mode: &Mode, area: Rect) {
    let line = Line::from(hint_spans(mode_hints(mode)));
    frame.render_widget(Paragraph::new(line), area);
}

/// Split hint text into key spans (in brackets) and description spans.
pub(super) fn hint_spans(hints: &str) -> Vec<Span<'static>> {
    let t = theme();
    let mut spans = Vec::new();
    let mut rest = hints;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|i| open + i) else {
            break;
        };
        if open > 0 {
            spans.push(Span::styled(rest[..open].to_string(), Style::default().fg(t.dim)));
        }
        spans.push(Span::styled(rest[open..=close].to_string(), t.key_hint()));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        spans.push(Span::styled(rest.to_string(), Style::default().fg(t.dim)));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_spans() {
        assert_eq!(hint_spans("[j/k] move [q] quit").len(), 4);
        assert_eq!(hint_spans("").len(), 0);
        assert_eq!(hint_spans("plain").len(), 1);
        assert_eq!(hint_spans("[open").len(), 1);
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("x".repeat(25)), Line::from("")];
        assert_eq!(wrapped_height(&lines, 10), 4);
    }
}
