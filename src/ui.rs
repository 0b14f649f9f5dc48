//! UI rendering functions.

use chrono::{Local, NaiveDate};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{App, Pane};
use crate::config::ConfigLoadStatus;
use crate::validators::DATE_FORMAT;

/// Width of the categories pane, including borders.
const CATEGORIES_WIDTH: u16 = 24;

/// Key hints shown in the footer.
const SHORTCUTS: &str = "[a] Add  [e] Edit  [d] Delete  [space] Done  [c] Category  [?] Help  [q] Quit";

/// Contract a path by replacing the home directory with `~` for display.
pub fn contract_path(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(suffix) = path.strip_prefix(&home)
    {
        return format!("~/{}", suffix.display());
    }
    path.display().to_string()
}

/// Truncates a string to the given maximum length in characters, appending "..." if truncated.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    // Replace newlines with spaces for single-line display
    let single_line: String = s.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();

    if single_line.chars().count() <= max_len {
        single_line
    } else {
        let kept: String = single_line.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Describe a due date relative to today.
pub fn format_due(due: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(due) = due else {
        return String::new();
    };
    match (due - today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        d if d < 0 => format!("overdue {}", due.format(DATE_FORMAT)),
        _ => due.format(DATE_FORMAT).to_string(),
    }
}

/// Calculate a centered rectangle within the given area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// First row to show so that `selected` stays inside a viewport of `height` rows.
fn scroll_offset(selected: usize, height: u16) -> u16 {
    let height = height.max(1) as usize;
    selected.saturating_sub(height - 1).min(u16::MAX as usize) as u16
}

fn pane_block(title: &str, focused: bool) -> Block<'static> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Line::from(format!(" {} ", title)).left_aligned())
}

fn selected_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().add_modifier(Modifier::REVERSED)
    }
}

fn draw_categories(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused_pane() == Some(Pane::Categories);
    let store = app.store.borrow();
    let width = area.width.saturating_sub(4) as usize;

    let mut names = vec![format!("All ({})", store.len())];
    names.extend(store.categories().iter().map(|c| {
        let count = store.list(Some(c.id)).len();
        format!("{} ({})", c.name, count)
    }));

    let lines: Vec<Line> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let text = format!(" {} ", truncate_str(&name, width));
            if i == app.selected_category {
                Line::from(Span::styled(text, selected_style(focused)))
            } else {
                Line::from(Span::raw(text))
            }
        })
        .collect();

    let offset = scroll_offset(app.selected_category, area.height.saturating_sub(2));
    let panel = Paragraph::new(lines)
        .block(pane_block("Categories", focused))
        .scroll((offset, 0));
    f.render_widget(panel, area);
}

fn draw_todos(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focused_pane() == Some(Pane::Todos);
    let today = Local::now().date_naive();
    let todos = app.visible_todos();
    let store = app.store.borrow();
    let inner_width = area.width.saturating_sub(2) as usize;

    let lines: Vec<Line> = if todos.is_empty() {
        let hint = if store.is_empty() {
            " Nothing here. Press [a] to add a todo."
        } else {
            " No todos in this category."
        };
        vec![Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        todos
            .iter()
            .enumerate()
            .map(|(i, todo)| {
                let check = if todo.done { "[x]" } else { "[ ]" };
                let due = format_due(todo.due, today);
                let category = store
                    .category_name(todo.category)
                    .map(|n| format!(" #{}", n))
                    .unwrap_or_default();
                let meta = format!("{}{} ", due, category);
                let name_width = inner_width.saturating_sub(check.len() + meta.chars().count() + 3);
                let name = truncate_str(&todo.name, name_width);
                let padding = name_width.saturating_sub(name.chars().count());

                if i == app.selected_todo {
                    let text = format!(" {} {}{} {}", check, name, " ".repeat(padding), meta);
                    return Line::from(Span::styled(text, selected_style(focused)));
                }

                let name_style = if todo.done {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(Color::White)
                };
                let due_style = if todo.due.is_some_and(|d| d < today) && !todo.done {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Line::from(vec![
                    Span::styled(format!(" {} ", check), Style::default().fg(Color::Cyan)),
                    Span::styled(name, name_style),
                    Span::raw(" ".repeat(padding + 1)),
                    Span::styled(due, due_style),
                    Span::styled(format!("{} ", category), Style::default().fg(Color::Magenta)),
                ])
            })
            .collect()
    };

    let mut block = pane_block("Todos", focused).title_bottom(
        Line::from(format!(" {}/{} done ", store.done_count(), store.len())).left_aligned(),
    );
    if let Some(session_id) = &app.session_id {
        block = block.title(Line::from(format!(" {} ", session_id)).right_aligned());
    }

    let offset = scroll_offset(app.selected_todo, area.height.saturating_sub(2));
    let panel = Paragraph::new(lines).block(block).scroll((offset, 0));
    f.render_widget(panel, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let (status, status_color) = if let Some(error) = &app.logging_error {
        (format!("logging off: {}", error), Color::Red)
    } else if let ConfigLoadStatus::Error(error) = &app.config_status {
        (format!("config: {}", error), Color::Yellow)
    } else if let Some(dir) = &app.log_directory {
        (format!("logs {}", contract_path(dir)), Color::DarkGray)
    } else {
        (contract_path(&app.config_path), Color::DarkGray)
    };

    let inner_width = area.width.saturating_sub(2) as usize;
    let status = truncate_str(&status, inner_width.saturating_sub(SHORTCUTS.len() + 1).max(10));
    let spacing = inner_width.saturating_sub(SHORTCUTS.len() + status.chars().count());

    let line = Line::from(vec![
        Span::styled(SHORTCUTS, Style::default().fg(Color::DarkGray)),
        Span::raw(" ".repeat(spacing)),
        Span::styled(status, Style::default().fg(status_color)),
    ]);
    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}

/// Draw the main UI, with the modal layer on top.
pub fn draw_ui(f: &mut Frame, app: &mut App) {
    app.clamp_selection();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(CATEGORIES_WIDTH), Constraint::Min(0)])
        .split(rows[0]);

    draw_categories(f, app, panes[0]);
    draw_todos(f, app, panes[1]);
    draw_footer(f, app, rows[1]);

    app.modals.draw(f);
}
