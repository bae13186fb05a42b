use crate::state::{Role, ThinkingSplitter, Turn, TurnId};
use crate::ui::input_metrics::{
    char_display_width, cursor_row_col, truncate_to_display_width, wrap_input_lines,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
    Frame,
};

const THINKING_TITLE: &str = "Thinking process";
const STREAMING_MARK: &str = "…";

/// Turns assistant text into styled terminal text. Implementations treat the
/// input as opaque markup.
pub trait MarkdownRenderer {
    fn render(&self, text: &str) -> Text<'static>;
}

/// Shows the text as-is, one row per source line.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRenderer;

impl MarkdownRenderer for PlainRenderer {
    fn render(&self, text: &str) -> Text<'static> {
        Text::from(
            text.lines()
                .map(|line| Line::from(line.to_string()))
                .collect::<Vec<_>>(),
        )
    }
}

pub struct TranscriptView<'a> {
    pub turns: &'a [Turn],
    pub active: Option<TurnId>,
    pub splitter: &'a ThinkingSplitter,
    pub thinking_collapsed: bool,
}

pub fn transcript_lines(
    view: &TranscriptView<'_>,
    renderer: &dyn MarkdownRenderer,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for turn in view.turns {
        match turn.role() {
            Role::User => push_user_turn(&mut lines, turn),
            Role::Assistant => push_assistant_turn(&mut lines, view, turn, renderer),
        }
        lines.push(Line::default());
    }
    lines
}

fn push_user_turn(lines: &mut Vec<Line<'static>>, turn: &Turn) {
    let style = Style::default().fg(Color::Cyan);
    for (index, line) in turn.raw_content().split('\n').enumerate() {
        let prefix = if index == 0 { "> " } else { "  " };
        lines.push(Line::styled(format!("{prefix}{line}"), style));
    }
}

fn push_assistant_turn(
    lines: &mut Vec<Line<'static>>,
    view: &TranscriptView<'_>,
    turn: &Turn,
    renderer: &dyn MarkdownRenderer,
) {
    let streaming = view.active == Some(turn.id());
    let dim = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM);

    if let Some(thinking) = turn.thinking() {
        let arrow = if view.thinking_collapsed { "▸" } else { "▾" };
        let mut title = format!("{arrow} {THINKING_TITLE}");
        if !turn.thinking_complete() {
            title.push(' ');
            title.push_str(STREAMING_MARK);
        }
        lines.push(Line::styled(title, dim.add_modifier(Modifier::BOLD)));

        if !view.thinking_collapsed {
            let body = if streaming && !turn.thinking_complete() {
                without_suffix(thinking, view.splitter.pending_close_suffix(thinking))
            } else {
                thinking
            };
            for line in body.trim_matches('\n').lines() {
                lines.push(Line::styled(format!("  {line}"), dim));
            }
        }
    }

    let visible = turn.visible_response();
    let visible = if streaming && turn.thinking().is_none() {
        without_suffix(visible, view.splitter.pending_open_suffix(visible))
    } else {
        visible
    };

    if visible.trim().is_empty() {
        if streaming && turn.thinking().is_none() {
            lines.push(Line::styled(STREAMING_MARK, dim));
        }
        return;
    }
    lines.extend(renderer.render(visible.trim_start_matches('\n')).lines);
}

fn without_suffix(text: &str, suffix_len: usize) -> &str {
    &text[..text.len() - suffix_len]
}

/// Hard-wraps styled lines to `width` columns, keeping span styles.
pub fn wrap_styled_lines(lines: &[Line<'static>], width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        let mut row: Vec<Span<'static>> = Vec::new();
        let mut used = 0usize;
        for span in &line.spans {
            let mut chunk = String::new();
            for ch in span.content.chars() {
                let ch_width = char_display_width(ch);
                if used + ch_width > width && used > 0 {
                    if !chunk.is_empty() {
                        row.push(Span::styled(std::mem::take(&mut chunk), span.style));
                    }
                    rows.push(Line::from(std::mem::take(&mut row)).style(line.style));
                    used = 0;
                }
                chunk.push(ch);
                used += ch_width;
            }
            if !chunk.is_empty() {
                row.push(Span::styled(chunk, span.style));
            }
        }
        rows.push(Line::from(row).style(line.style));
    }
    rows
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryScroll {
    pub offset: usize,
    pub follow: bool,
}

/// Draws the visible window of `rows` and returns the largest top offset at
/// this size.
pub fn render_messages(
    frame: &mut Frame<'_>,
    area: Rect,
    rows: &[Line<'static>],
    scroll: HistoryScroll,
) -> usize {
    if area.height == 0 || area.width == 0 {
        return 0;
    }

    let viewport = area.height as usize;
    let max_offset = rows.len().saturating_sub(viewport);
    let top = if scroll.follow {
        max_offset
    } else {
        scroll.offset.min(max_offset)
    };
    let end = (top + viewport).min(rows.len());

    frame.render_widget(
        Paragraph::new(Text::from(rows[top..end].to_vec()))
            .style(Style::default().fg(Color::White)),
        area,
    );
    max_offset
}

pub fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    input: &str,
    cursor_byte: usize,
    busy: bool,
) {
    if area.height == 0 || area.width <= 2 {
        return;
    }

    let input_width = area.width.saturating_sub(2).max(1) as usize;
    let lines = wrap_input_lines(input, input_width);
    let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, input_width);
    let visible_rows = area.height as usize;
    let window_start = cursor_row.saturating_add(1).saturating_sub(visible_rows);

    let mut rendered = Vec::with_capacity(visible_rows);
    for offset in 0..visible_rows {
        let row_index = window_start + offset;
        let prefix = if row_index == 0 { "> " } else { "  " };
        let line = lines.get(row_index).cloned().unwrap_or_default();
        if row_index == 0 && input.is_empty() && busy {
            rendered.push(Line::from(vec![
                Span::raw(prefix),
                Span::styled(
                    "waiting for reply…",
                    Style::default().add_modifier(Modifier::ITALIC),
                ),
            ]));
        } else {
            rendered.push(Line::from(format!("{prefix}{line}")));
        }
    }

    frame.render_widget(
        Paragraph::new(rendered)
            .style(
                Style::default()
                    .fg(Color::Gray)
                    .bg(Color::Rgb(24, 24, 24))
                    .add_modifier(Modifier::DIM),
            )
            .wrap(Wrap { trim: false }),
        area,
    );

    let cursor_y = area
        .y
        .saturating_add(cursor_row.saturating_sub(window_start) as u16);
    let cursor_x = area
        .x
        .saturating_add(2 + cursor_col as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, cursor_y));
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_line(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

pub fn render_error_banner(frame: &mut Frame<'_>, area: Rect, message: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let first_line = message.lines().next().unwrap_or_default();
    let text = truncate_line(
        &format!("error: {first_line}  [esc to dismiss]"),
        area.width as usize,
    );
    frame.render_widget(
        Paragraph::new(text).style(
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
        area,
    );
}

fn truncate_line(input: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::new();
    let mut used = 0usize;
    let mut truncated = false;

    for ch in input.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > width {
            truncated = true;
            break;
        }
        out.push(ch);
        used += ch_width;
    }

    if truncated && width >= 4 {
        out = truncate_to_display_width(&out, width - 3);
        out.push_str("...");
    }
    out
}
