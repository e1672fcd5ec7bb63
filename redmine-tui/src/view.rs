//! Chat screen rendering.

use crate::notifications::NotificationLevel;
use crate::state::{App, Entry};
use crate::theme::speaker_color;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &mut App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);
    render_transcript(f, app, layout[1]);
    render_input(f, app, layout[2]);
    render_footer(f, app, layout[3]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let session = app.session_id.as_deref().unwrap_or("new");
    let title = format!("Redmine Assistant | {} | Session: {}", app.api.base_url(), session);
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default().fg(app.theme.primary),
    ));
    f.render_widget(block, area);
}

fn transcript_lines<'a>(app: &App, entries: &'a [Entry]) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for entry in entries {
        let color = speaker_color(entry.speaker, &app.theme);
        lines.push(Line::from(Span::styled(
            entry.speaker.label(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for text_line in entry.text.lines() {
            lines.push(Line::from(Span::styled(text_line, Style::default().fg(app.theme.text))));
        }
        lines.push(Line::default());
    }
    if app.pending {
        lines.push(Line::from(Span::styled(
            "Pensando...",
            Style::default().fg(app.theme.text_dim),
        )));
    }
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns.
pub fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_transcript(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let lines = transcript_lines(app, &app.transcript);
    let total = wrapped_height(&lines, inner.width);
    let max_scroll = total.saturating_sub(inner.height);
    let scroll_back = app.scroll_back.min(max_scroll);
    let offset = max_scroll - scroll_back;

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    f.render_widget(paragraph, area);
    app.scroll_back = scroll_back;
}

fn render_input(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let border = if app.pending {
        app.theme.border
    } else {
        app.theme.border_focus
    };
    app.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(&app.input, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = "Enter send • ↑/↓ scroll • Ctrl-L clear • Esc quit";
    let (text, style) = match app.notifications.last() {
        Some(note) => {
            let (label, color) = match note.level {
                NotificationLevel::Info => ("INFO", app.theme.info),
                NotificationLevel::Warning => ("WARN", app.theme.warning),
                NotificationLevel::Error => ("ERROR", app.theme.error),
            };
            (format!("{}: {}", label, note.message), Style::default().fg(color))
        }
        None => (help.to_string(), Style::default().fg(app.theme.text_dim)),
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::TOP))
        .style(style);
    f.render_widget(footer, area);
}
