use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};

use crate::app::{App, ChatRole, InputMode, SUGGESTIONS};
use crate::markdown;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_height = app.input_rows() + 2; // borders
    let [header_area, transcript_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    if app.suggestions_visible() {
        render_empty_state(app, frame, transcript_area);
    } else {
        render_transcript(app, frame, transcript_area);
    }

    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" ⬡ Next.js Docs AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("RAG · App Router · local", Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Build the transcript as styled lines. Assistant text goes through the
/// markdown renderer; user text is shown literally so typed markup never
/// gains structure.
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.conversation.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(markdown::render(&msg.content));
                lines.push(Line::default());
            }
        }
    }

    if app.loading {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{dots}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

// Rows a line occupies once wrapped to `width` columns
fn wrapped_rows(line_width: usize, width: usize) -> u16 {
    if line_width == 0 {
        1
    } else {
        ((line_width - 1) / width + 1) as u16
    }
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.input_mode == InputMode::Normal;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let inner = block.inner(area);
    app.transcript_height = inner.height;

    let lines = transcript_lines(app);

    let wrap_width = inner.width.max(1) as usize;
    let total: u16 = lines
        .iter()
        .map(|line| wrapped_rows(line.width(), wrap_width))
        .sum();
    app.total_transcript_lines = total;

    // Pin to the end while following; otherwise keep the offset in range
    let max_scroll = total.saturating_sub(inner.height);
    app.transcript_scroll = if app.follow_bottom {
        max_scroll
    } else {
        app.transcript_scroll.min(max_scroll)
    };

    let transcript = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(transcript, area);

    if total > inner.height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state =
            ScrollbarState::new(total as usize).position(app.transcript_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_empty_state(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.input_mode == InputMode::Normal;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Chat ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.transcript_height = inner.height;
    app.total_transcript_lines = 0;

    let banner_height = 5;
    let list_height = SUGGESTIONS.len() as u16 + 2;
    let content_height = banner_height + list_height;

    if inner.height < content_height || inner.width < 24 {
        let banner = Paragraph::new(Span::styled(
            "Ask anything about Next.js",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(banner, inner);
        return;
    }

    let width = inner.width.min(44);
    let x = inner.x + (inner.width - width) / 2;
    let y = inner.y + (inner.height - content_height) / 2;

    let banner = Paragraph::new(vec![
        Line::from(Span::styled("⬡", Style::default().fg(Color::Cyan))),
        Line::default(),
        Line::from(Span::styled(
            "Ask anything about Next.js",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Powered by your local docs index.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Paste broken code or ask a question.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(banner, Rect::new(x, y, width, banner_height));

    let items: Vec<ListItem> = SUGGESTIONS
        .iter()
        .map(|s| ListItem::new(format!(" {} ", s)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Try one of these "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(
        list,
        Rect::new(x, y + banner_height, width, list_height),
        &mut app.suggestion_state,
    );
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if app.loading {
        " Ask (waiting for answer) "
    } else {
        " Ask "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner = block.inner(area);

    // Scroll the box so the cursor stays visible past the growth cap
    let (row, col) = app.cursor_line_col();
    let visible_rows = inner.height.max(1) as usize;
    let row_offset = row.saturating_sub(visible_rows - 1);
    let inner_width = inner.width.max(1) as usize;
    let col_offset = if col >= inner_width {
        col - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(
            "Ask about Next.js or paste your code…",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block)
    } else {
        let lines: Vec<Line> = app
            .input
            .split('\n')
            .map(|l| Line::from(l.to_string()))
            .collect();
        Paragraph::new(lines)
            .style(Style::default().fg(Color::Cyan))
            .block(block)
            .scroll((row_offset as u16, col_offset as u16))
    };
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((
            inner.x + (col - col_offset) as u16,
            inner.y + (row - row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " INPUT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" ↵ ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" shift+↵ ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" scroll ", label_style),
        ],
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
            ];
            if app.suggestions_visible() {
                hints.extend(vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" pick ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" fill ", label_style),
                ]);
            } else {
                hints.extend(vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                    Span::styled(" g/G ", key_style),
                    Span::styled(" top/end ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };

    if app.loading {
        hints.push(Span::styled(
            " waiting for answer… ",
            Style::default().bg(Color::Black).fg(Color::Yellow),
        ));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn test_app() -> App {
        App::new("http://127.0.0.1:1")
    }

    fn buffer_string(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let mut out = String::new();
        for (i, cell) in buffer.content().iter().enumerate() {
            if i > 0 && i % width == 0 {
                out.push('\n');
            }
            out.push_str(cell.symbol());
        }
        out
    }

    #[test]
    fn test_user_text_is_rendered_literally() {
        let mut app = test_app();
        app.conversation
            .push(ChatRole::User, "# not a heading **or bold**".to_string());

        let lines = transcript_lines(&app);
        assert_eq!(lines[0].spans[0].content.as_ref(), "You:");

        let content = &lines[1];
        let text: String = content.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "# not a heading **or bold**");
        for span in &content.spans {
            assert!(!span.style.add_modifier.contains(Modifier::BOLD));
        }
    }

    #[test]
    fn test_assistant_text_is_rendered_as_markdown() {
        let mut app = test_app();
        app.conversation
            .push(ChatRole::Assistant, "**bold** answer".to_string());

        let lines = transcript_lines(&app);
        assert_eq!(lines[0].spans[0].content.as_ref(), "AI:");
        let bold = lines[1]
            .spans
            .iter()
            .find(|s| s.content.as_ref() == "bold")
            .unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_thinking_row_appears_only_while_loading() {
        let mut app = test_app();
        app.conversation.push(ChatRole::User, "q".to_string());

        let without = transcript_lines(&app);
        assert!(!without
            .iter()
            .any(|l| l.spans.iter().any(|s| s.content.starts_with("Thinking"))));

        app.loading = true;
        app.animation_frame = 2;
        let with = transcript_lines(&app);
        assert!(with
            .iter()
            .any(|l| l.spans.iter().any(|s| s.content.as_ref() == "Thinking...")));
    }

    #[test]
    fn test_wrapped_rows() {
        assert_eq!(wrapped_rows(0, 10), 1);
        assert_eq!(wrapped_rows(10, 10), 1);
        assert_eq!(wrapped_rows(11, 10), 2);
        assert_eq!(wrapped_rows(30, 10), 3);
    }

    #[test]
    fn test_empty_state_shows_suggestions() {
        let mut app = test_app();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = buffer_string(&terminal);
        assert!(screen.contains("Next.js Docs AI"));
        assert!(screen.contains("Ask anything about Next.js"));
        assert!(screen.contains("Fix my useEffect"));
        assert!(screen.contains("Middleware setup"));
        assert!(screen.contains("Ask about Next.js or paste your code"));
    }

    #[test]
    fn test_draw_shows_transcript_messages() {
        let mut app = test_app();
        app.conversation
            .push(ChatRole::User, "What is App Router?".to_string());
        app.conversation
            .push(ChatRole::Assistant, "It is a routing paradigm.".to_string());

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = buffer_string(&terminal);
        assert!(screen.contains("You:"));
        assert!(screen.contains("What is App Router?"));
        assert!(screen.contains("AI:"));
        assert!(screen.contains("It is a routing paradigm."));
    }

    #[test]
    fn test_follow_bottom_pins_transcript_to_end() {
        let mut app = test_app();
        for i in 0..30 {
            app.conversation.push(ChatRole::User, format!("question {i}"));
            app.conversation.push(ChatRole::Assistant, format!("answer {i}"));
        }

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let expected = app
            .total_transcript_lines
            .saturating_sub(app.transcript_height);
        assert_eq!(app.transcript_scroll, expected);

        // the newest answer is on screen, the oldest scrolled away
        let screen = buffer_string(&terminal);
        assert!(screen.contains("answer 29"));
        assert!(!screen.contains("question 0"));

        // released follow keeps the manual offset
        app.follow_bottom = false;
        app.transcript_scroll = 0;
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert_eq!(app.transcript_scroll, 0);
    }

    #[test]
    fn test_input_box_grows_with_line_breaks() {
        let mut app = test_app();
        app.input = "one\ntwo\nthree".to_string();
        app.cursor = app.input.chars().count();

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = buffer_string(&terminal);
        assert!(screen.contains("one"));
        assert!(screen.contains("two"));
        assert!(screen.contains("three"));
    }
}
