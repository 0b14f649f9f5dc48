//! Modal UI rendering functions.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::fields::{FieldControl, FieldKind};
use crate::focus::FocusTarget;
use crate::panel::{ModalPanel, PanelLayout};
use crate::request::Variant;
use crate::ui::centered_rect;

/// Preferred panel width, including borders.
const MODAL_WIDTH: u16 = 64;

/// Left indent of panel content.
const INDENT: &str = "  ";

/// Gap between footer buttons.
const BUTTON_GAP: usize = 3;

/// Word-wrap text to `width` display columns. Explicit newlines are kept.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.width()
            } else {
                current.width() + 1 + word.width()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

/// Start and end (in chars) of the slice of a value to show in `width`
/// columns so that the cursor cell stays visible. `widths` holds the display
/// width of each char; a cursor past the end takes one column.
fn visible_window(widths: &[usize], cursor: usize, width: usize) -> (usize, usize) {
    let len = widths.len();
    let cursor = cursor.min(len);
    if widths.iter().sum::<usize>() < width {
        return (0, len);
    }

    let mut used = widths.get(cursor).copied().unwrap_or(1);
    let mut start = cursor;
    let mut end = (cursor + 1).min(len);

    // Keep some context before the cursor, then fill right, then left again
    while start > 0 && used + widths[start - 1] <= width / 2 {
        start -= 1;
        used += widths[start];
    }
    while end < len && used + widths[end] <= width {
        used += widths[end];
        end += 1;
    }
    while start > 0 && used + widths[start - 1] <= width {
        start -= 1;
        used += widths[start];
    }
    (start, end)
}

/// Spans for a single-line input, with a block cursor when focused.
fn input_spans(value: &str, cursor: usize, focused: bool, width: usize) -> Vec<Span<'static>> {
    let chars: Vec<char> = value.chars().collect();
    let widths: Vec<usize> = chars.iter().map(|c| c.width().unwrap_or(0)).collect();
    let (start, end) = visible_window(&widths, cursor, width);

    if !focused {
        let visible: String = chars[start..end].iter().collect();
        return vec![Span::styled(visible, Style::default().fg(Color::White))];
    }

    let cursor = cursor.clamp(start, chars.len());
    let before: String = chars[start..cursor].iter().collect();
    let (cursor_char, rest_start) = match chars.get(cursor) {
        Some(c) => (c.to_string(), cursor + 1),
        None => (" ".to_string(), cursor),
    };
    let rest: String = chars[rest_start.min(end)..end].iter().collect();

    vec![
        Span::styled(before, Style::default().fg(Color::White)),
        Span::styled(
            cursor_char,
            Style::default().fg(Color::Black).bg(Color::White),
        ),
        Span::styled(rest, Style::default().fg(Color::White)),
    ]
}

/// Lines for a textarea: `rows` lines, scrolled so the cursor line is visible.
fn textarea_lines(
    value: &str,
    cursor: usize,
    focused: bool,
    rows: u16,
    width: usize,
) -> Vec<Line<'static>> {
    let rows = rows.max(1) as usize;

    // Split into lines, remembering which one holds the cursor and where
    let mut cursor_line = 0;
    let mut cursor_col = 0;
    let mut offset = 0;
    let text_lines: Vec<&str> = value.split('\n').collect();
    for (i, line) in text_lines.iter().enumerate() {
        let len = line.chars().count();
        if cursor >= offset && cursor <= offset + len {
            cursor_line = i;
            cursor_col = cursor - offset;
            break;
        }
        offset += len + 1;
    }

    let first = (cursor_line + 1).saturating_sub(rows);
    let mut lines: Vec<Line<'static>> = text_lines
        .iter()
        .enumerate()
        .skip(first)
        .take(rows)
        .map(|(i, line)| {
            let mut spans = vec![Span::styled("│ ", Style::default().fg(Color::DarkGray))];
            spans.extend(input_spans(
                line,
                if i == cursor_line { cursor_col } else { 0 },
                focused && i == cursor_line,
                width.saturating_sub(2),
            ));
            Line::from(spans)
        })
        .collect();
    while lines.len() < rows {
        lines.push(Line::from(Span::styled(
            "│ ",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines
}

/// Lines for one field control: the control row(s) only, without label or captions.
fn control_lines(control: &FieldControl, focused: bool, width: usize) -> Vec<Line<'static>> {
    let descriptor = control.descriptor();
    let placeholder_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC);

    match &descriptor.kind {
        FieldKind::Select { .. } => {
            let label = control.selected_label().unwrap_or("").to_string();
            let (display, style) = if focused {
                (format!("< {} >", label), Style::default().fg(Color::Cyan))
            } else {
                (label, Style::default().fg(Color::White))
            };
            vec![Line::from(vec![
                Span::raw(INDENT),
                Span::styled(display, style),
            ])]
        }
        FieldKind::Textarea { rows } => {
            textarea_lines(control.value(), control.cursor(), focused, *rows, width)
                .into_iter()
                .map(|line| {
                    let mut spans = vec![Span::raw(INDENT)];
                    spans.extend(line.spans);
                    Line::from(spans)
                })
                .collect()
        }
        FieldKind::Text | FieldKind::Date => {
            let mut spans = vec![
                Span::raw(INDENT),
                Span::styled("> ", Style::default().fg(Color::DarkGray)),
            ];
            match &descriptor.placeholder {
                Some(placeholder) if control.value().is_empty() && !focused => {
                    spans.push(Span::styled(placeholder.clone(), placeholder_style));
                }
                _ => spans.extend(input_spans(
                    control.value(),
                    control.cursor(),
                    focused,
                    width.saturating_sub(2),
                )),
            }
            if descriptor.kind == FieldKind::Date
                && descriptor.placeholder.is_none()
                && control.value().is_empty()
                && !focused
            {
                spans.push(Span::styled("YYYY-MM-DD", placeholder_style));
            }
            vec![Line::from(spans)]
        }
    }
}

/// Style for a footer button.
fn button_style(focused: bool, accent: Color) -> Style {
    if focused {
        Style::default().fg(Color::Black).bg(accent)
    } else {
        Style::default().fg(accent)
    }
}

/// Draw the modal host: dim the page behind, then draw the panel centered on top.
/// Records the panel's layout for mouse hit-testing.
pub fn draw_modal(f: &mut Frame, panel: &mut ModalPanel) {
    let area = f.area();

    // Backdrop
    f.buffer_mut()
        .set_style(area, Style::default().add_modifier(Modifier::DIM));

    let modal_width = MODAL_WIDTH.min(area.width);
    let inner_width = modal_width.saturating_sub(2) as usize;
    let content_width = inner_width.saturating_sub(INDENT.len() * 2);

    let label_style = Style::default().fg(Color::DarkGray);
    let focused_label_style = Style::default().fg(Color::Cyan);
    let error_style = Style::default().fg(Color::Yellow);
    let accent = match panel.variant() {
        Variant::Default => Color::Cyan,
        Variant::Danger => Color::Red,
    };
    let border_color = match panel.variant() {
        Variant::Default => Color::White,
        Variant::Danger => Color::Red,
    };

    let mut content: Vec<Line> = vec![Line::from("")];

    if let Some(message) = panel.message() {
        for line in wrap_text(message, content_width) {
            content.push(Line::from(vec![Span::raw(INDENT), Span::raw(line)]));
        }
        content.push(Line::from(""));
    }

    // Fields, remembering the rows each one covers
    let mut field_rows: Vec<(usize, usize, usize)> = Vec::new();
    for (i, control) in panel.controls().iter().enumerate() {
        let focused = panel.focus() == Some(FocusTarget::Field(i));
        let descriptor = control.descriptor();
        let first_row = content.len();

        let mut label = vec![
            Span::raw(INDENT),
            Span::styled(
                descriptor.label.clone(),
                if focused { focused_label_style } else { label_style },
            ),
        ];
        if descriptor.required {
            label.push(Span::styled(" *", Style::default().fg(Color::Red)));
        }
        content.push(Line::from(label));
        content.extend(control_lines(control, focused, content_width));
        let last_row = content.len();

        if let Some(description) = &descriptor.description {
            for line in wrap_text(description, content_width) {
                content.push(Line::from(vec![
                    Span::raw(INDENT),
                    Span::styled(line, label_style),
                ]));
            }
        }
        if let Some(error) = control.error() {
            content.push(Line::from(Span::styled(
                format!("{INDENT}\u{26a0} {}", error),
                error_style,
            )));
        }
        content.push(Line::from(""));
        field_rows.push((i, first_row, last_row));
    }

    // Footer buttons, right aligned
    let confirm_text = format!(" {} ", panel.confirm_label());
    let cancel_text = panel.cancel_label().map(|l| format!(" {} ", l));
    let buttons_width = confirm_text.width()
        + cancel_text
            .as_ref()
            .map(|t| t.width() + BUTTON_GAP)
            .unwrap_or(0);
    let padding = inner_width.saturating_sub(buttons_width + INDENT.len());
    let button_row = content.len();

    let mut buttons = vec![Span::raw(" ".repeat(padding))];
    let mut cancel_offset = None;
    let mut confirm_offset = padding;
    if let Some(text) = &cancel_text {
        cancel_offset = Some(padding);
        buttons.push(Span::styled(
            text.clone(),
            button_style(
                panel.focus() == Some(FocusTarget::CancelButton),
                Color::White,
            ),
        ));
        buttons.push(Span::raw(" ".repeat(BUTTON_GAP)));
        confirm_offset = padding + text.width() + BUTTON_GAP;
    }
    buttons.push(Span::styled(
        confirm_text.clone(),
        button_style(panel.focus() == Some(FocusTarget::ConfirmButton), accent),
    ));
    content.push(Line::from(buttons));
    content.push(Line::from(""));

    let modal_height = (content.len() + 2).min(u16::MAX as usize) as u16;
    let modal_area = centered_rect(modal_width, modal_height, area);
    let inner = Rect::new(
        modal_area.x + 1,
        modal_area.y + 1,
        modal_area.width.saturating_sub(2),
        modal_area.height.saturating_sub(2),
    );

    // Clear the area behind the modal
    f.render_widget(Clear, modal_area);

    let border_style = if panel.focus().is_none() {
        Style::default().fg(border_color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(border_color)
    };
    let modal = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" {} ", panel.title()))
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(modal, modal_area);

    // Record hit regions for rows that made it on screen
    let row_rect = |row: usize, x_offset: usize, width: usize| -> Option<Rect> {
        let row = u16::try_from(row).ok()?;
        if row >= inner.height {
            return None;
        }
        let x = inner.x.saturating_add(x_offset as u16);
        let width = (width as u16).min(inner.right().saturating_sub(x));
        Some(Rect::new(x, inner.y + row, width, 1))
    };
    let fields = field_rows
        .into_iter()
        .filter_map(|(i, first, last)| {
            let top = row_rect(first, 0, inner.width as usize)?;
            let height = (last - first) as u16;
            let height = height.min(inner.bottom().saturating_sub(top.y));
            Some((i, Rect::new(top.x, top.y, top.width, height)))
        })
        .collect();

    panel.set_layout(PanelLayout {
        panel: modal_area,
        confirm: row_rect(button_row, confirm_offset, confirm_text.width()),
        cancel: cancel_offset.and_then(|offset| {
            row_rect(
                button_row,
                offset,
                cancel_text.as_ref().map(|t| t.width()).unwrap_or(0),
            )
        }),
        fields,
    });
}
