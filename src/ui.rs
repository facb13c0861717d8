use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, FocusPane, InputMode};
use crate::editor::Language;
use crate::message::Sender;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Editor pane on the left, chat on the right
    let [editor_area, chat_area] = Layout::horizontal([
        Constraint::Percentage(65),
        Constraint::Percentage(35),
    ])
    .areas(body_area);

    render_editor_pane(app, frame, editor_area);
    render_chat_pane(app, frame, chat_area);

    render_footer(app, frame, footer_area);

    if app.show_language_picker {
        render_language_picker(app, frame, area);
    } else if app.show_convert_picker {
        render_convert_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let busy_indicator = if app.controller.is_busy() {
        " [working]"
    } else {
        ""
    };

    let title = Line::from(vec![
        Span::styled(" Code Mentor ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("[{}]", app.editor.language().label()),
            Style::default().fg(Color::Green),
        ),
        Span::styled(busy_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_editor_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let editor_area = if app.show_description {
        let desc_lines = app.problem_description.lines().count() as u16 + 2;
        let desc_height = desc_lines.min(area.height / 2);
        let [desc_area, editor_area] =
            Layout::vertical([Constraint::Length(desc_height), Constraint::Min(0)]).areas(area);

        let desc = Paragraph::new(app.problem_description.as_str())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(" Problem ('p' to hide) "),
            );
        frame.render_widget(desc, desc_area);
        editor_area
    } else {
        area
    };

    let editor_focused = app.focus == FocusPane::Editor;
    let editing = editor_focused && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if editor_focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Editor ({}) ", app.editor.language().label()));

    let inner_height = editor_area.height.saturating_sub(2);
    app.editor_height = inner_height;

    // Keep the cursor line inside the viewport
    let (line, col) = app.cursor_line_col();
    if (line as u16) < app.editor_scroll {
        app.editor_scroll = line as u16;
    } else if inner_height > 0 && line as u16 >= app.editor_scroll + inner_height {
        app.editor_scroll = line as u16 - inner_height + 1;
    }

    let code = Paragraph::new(app.editor.code())
        .block(block)
        .scroll((app.editor_scroll, 0));
    frame.render_widget(code, editor_area);

    if editing {
        let inner_width = editor_area.width.saturating_sub(2);
        let cursor_x = (col as u16).min(inner_width.saturating_sub(1));
        let cursor_y = (line as u16).saturating_sub(app.editor_scroll);
        frame.set_cursor_position((
            editor_area.x + cursor_x + 1,
            editor_area.y + cursor_y + 1,
        ));
    }
}

fn render_chat_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = messages_area.height.saturating_sub(2);
    app.chat_width = messages_area.width.saturating_sub(2);

    let chat_focused = app.focus == FocusPane::Chat;
    let border_color = if chat_focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Code Mentor AI ");

    let chat_text = if app.controller.messages().is_empty() && !app.controller.is_busy() {
        Text::from(Span::styled(
            "Ask about your code, or use d/a/c/o for Debug, Analyze, Convert, All-in-One...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.controller.messages() {
            let clock = msg.timestamp.format("%H:%M");
            match msg.sender {
                Sender::User => {
                    lines.push(Line::from(vec![
                        Span::styled(
                            "You",
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(format!(" {}", clock), Style::default().fg(Color::DarkGray)),
                    ]));
                }
                Sender::Assistant => {
                    lines.push(Line::from(vec![
                        Span::styled(
                            "Mentor",
                            Style::default()
                                .fg(Color::Yellow)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(format!(" {}", clock), Style::default().fg(Color::DarkGray)),
                    ]));
                }
            }
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            for attachment in &msg.attachments {
                lines.push(Line::from(Span::styled(
                    format!("--- {} ---", attachment.language),
                    Style::default().fg(Color::DarkGray),
                )));
                for line in attachment.code.lines() {
                    lines.push(Line::from(Span::styled(
                        line.to_string(),
                        Style::default().fg(Color::Green),
                    )));
                }
            }
            lines.push(Line::default());
        }

        if app.controller.is_busy() {
            lines.push(Line::from(Span::styled(
                "Mentor",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, messages_area);

    render_chat_input(app, frame, input_area);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let chat_editing = app.focus == FocusPane::Chat && app.input_mode == InputMode::Editing;
    let border_color = if chat_editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.controller.is_busy() {
        " AI is thinking... "
    } else {
        " Message (Tab to focus) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible in a one-line input
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .chat_input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    if chat_editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" d ", key_style),
            Span::styled(" debug ", label_style),
            Span::styled(" a ", key_style),
            Span::styled(" analyze ", label_style),
            Span::styled(" c ", key_style),
            Span::styled(" convert ", label_style),
            Span::styled(" o ", key_style),
            Span::styled(" all-in-one ", label_style),
            Span::styled(" l ", key_style),
            Span::styled(" language ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" chat ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => match app.focus {
            FocusPane::Editor => vec![
                Span::styled(" Esc ", key_style),
                Span::styled(" done ", label_style),
            ],
            FocusPane::Chat => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" done ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" editor ", label_style),
            ],
        },
    };

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

fn render_language_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let languages = Language::all();
    let items: Vec<ListItem> = languages
        .iter()
        .map(|language| {
            let style = if *language == app.editor.language() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", language.label())).style(style)
        })
        .collect();

    let popup_area = centered_popup(area, 40, languages.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Source Language (Enter to select, Esc to cancel) "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.language_state);
}

fn render_convert_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let targets = app.convert_targets();
    let items: Vec<ListItem> = targets
        .iter()
        .map(|language| ListItem::new(format!(" Convert to {} ", language.label())))
        .collect();

    let popup_area = centered_popup(area, 45, targets.len() as u16 + 2);
    frame.render_widget(Clear, popup_area);

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Convert To (Enter to select, Esc to cancel) "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.convert_state);
}

/// Calculate popup size and position (centered)
fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    Rect::new(popup_x, popup_y, popup_width, popup_height)
}
