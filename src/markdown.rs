use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

// Clamp overly wide table columns to keep rows on screen
const TABLE_MAX_COL_WIDTH: usize = 40;

/// Convert answer text from the backend into styled terminal lines.
///
/// Only a fixed subset is interpreted: paragraphs, headings, ordered and
/// unordered lists, inline code and fenced code blocks, links,
/// blockquotes and tables. Raw HTML is passed through as literal text
/// and images degrade to their alt text, so nothing outside the subset
/// ever gains structure.
pub fn render(markdown: &str) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);

    let mut renderer = Renderer::default();
    for event in Parser::new_ext(markdown, options) {
        renderer.event(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,

    bold: bool,
    italic: bool,
    heading: Option<HeadingLevel>,
    link_dests: Vec<String>,
    quote_depth: usize,
    // None = bullet list, Some(n) = next ordered-item number
    list_stack: Vec<Option<u64>>,

    in_code_block: bool,
    code_buf: String,

    in_table: bool,
    header_row: Vec<String>,
    body_rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
}

impl Renderer {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_buf.push_str(&text);
                } else if self.in_table {
                    self.current_cell.push_str(&text);
                } else {
                    let style = self.style();
                    self.spans.push(Span::styled(text.into_string(), style));
                }
            }
            Event::Code(code) => {
                if self.in_table {
                    self.current_cell.push_str(&code);
                } else {
                    self.spans.push(Span::styled(
                        code.into_string(),
                        Style::default().fg(Color::Cyan),
                    ));
                }
            }
            // literal pass-through: markup stays visible, never structural
            Event::Html(html) => {
                let literal = html.trim_end_matches('\n').to_string();
                if self.in_table {
                    self.current_cell.push_str(&literal);
                } else {
                    self.spans.push(Span::raw(literal));
                }
            }
            Event::SoftBreak => {
                if self.in_table {
                    self.current_cell.push(' ');
                } else {
                    self.spans.push(Span::raw(" "));
                }
            }
            Event::HardBreak => {
                if self.in_table {
                    self.current_cell.push(' ');
                } else {
                    self.flush();
                }
            }
            Event::Rule => {
                self.blank();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(32),
                    Style::default().fg(Color::DarkGray),
                )));
                self.blank();
            }
            Event::FootnoteReference(_) | Event::TaskListMarker(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading(level, ..) => {
                self.flush();
                self.blank();
                self.heading = Some(level);
            }
            Tag::BlockQuote => {
                self.flush();
                self.blank();
                self.quote_depth += 1;
            }
            // the fence info string ("```rust") is dropped, not rendered
            Tag::CodeBlock(_) => {
                self.flush();
                self.blank();
                self.in_code_block = true;
                self.code_buf.clear();
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.blank();
                }
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
                let marker = match self.list_stack.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.spans.push(Span::raw(format!("{indent}{marker}")));
            }
            Tag::Emphasis => self.italic = true,
            Tag::Strong => self.bold = true,
            Tag::Link(_, dest, _) | Tag::Image(_, dest, _) => {
                self.link_dests.push(dest.into_string());
            }
            Tag::Table(_) => {
                self.flush();
                self.blank();
                self.in_table = true;
                self.header_row.clear();
                self.body_rows.clear();
            }
            Tag::TableHead | Tag::TableRow => self.current_row.clear(),
            Tag::TableCell => self.current_cell.clear(),
            Tag::FootnoteDefinition(_) => {}
            Tag::Strikethrough => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.flush();
                self.blank();
            }
            Tag::Heading(..) => {
                self.flush();
                self.heading = None;
                self.blank();
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            Tag::CodeBlock(_) => {
                let code = std::mem::take(&mut self.code_buf);
                for line in code.trim_end_matches('\n').lines() {
                    self.lines.push(Line::from(Span::styled(
                        format!("  {line}"),
                        Style::default().fg(Color::LightBlue),
                    )));
                }
                self.in_code_block = false;
                self.blank();
            }
            Tag::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank();
                }
            }
            Tag::Item => self.flush(),
            Tag::Emphasis => self.italic = false,
            Tag::Strong => self.bold = false,
            Tag::Link(..) | Tag::Image(..) => {
                if let Some(dest) = self.link_dests.pop() {
                    if !dest.is_empty() {
                        if self.in_table {
                            self.current_cell.push_str(&format!(" ({dest})"));
                        } else {
                            self.spans.push(Span::styled(
                                format!(" ({dest})"),
                                Style::default().fg(Color::DarkGray),
                            ));
                        }
                    }
                }
            }
            Tag::Table(_) => {
                self.in_table = false;
                self.emit_table();
                self.blank();
            }
            Tag::TableHead => {
                self.header_row = std::mem::take(&mut self.current_row);
            }
            Tag::TableRow => {
                let row = std::mem::take(&mut self.current_row);
                self.body_rows.push(row);
            }
            Tag::TableCell => {
                let cell = std::mem::take(&mut self.current_cell);
                self.current_row.push(cell);
            }
            Tag::FootnoteDefinition(_) => {}
            Tag::Strikethrough => {}
        }
    }

    fn style(&self) -> Style {
        let mut style = Style::default();
        if let Some(level) = self.heading {
            style = style.add_modifier(Modifier::BOLD);
            if matches!(level, HeadingLevel::H1 | HeadingLevel::H2) {
                style = style.fg(Color::Cyan);
            }
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if !self.link_dests.is_empty() {
            style = style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
        }
        if self.quote_depth > 0 {
            style = style.fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
        }
        style
    }

    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut spans = Vec::new();
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.append(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    // Separate blocks with one blank line, never two, never a leading one
    fn blank(&mut self) {
        if let Some(last) = self.lines.last() {
            if !last.spans.is_empty() {
                self.lines.push(Line::default());
            }
        }
    }

    fn emit_table(&mut self) {
        let header = std::mem::take(&mut self.header_row);
        let rows = std::mem::take(&mut self.body_rows);

        let columns = header
            .len()
            .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));
        if columns == 0 {
            return;
        }

        let mut widths = vec![1usize; columns];
        for row in std::iter::once(&header).chain(rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count().min(TABLE_MAX_COL_WIDTH));
            }
        }

        let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        self.lines.push(table_row(&header, &widths, header_style));

        let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
        self.lines.push(Line::from(Span::styled(
            rule.join("─┼─"),
            Style::default().fg(Color::DarkGray),
        )));

        for row in &rows {
            self.lines.push(table_row(row, &widths, Style::default()));
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

fn table_row(cells: &[String], widths: &[usize], style: Style) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
        }
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        spans.push(Span::styled(pad_cell(cell, *width), style));
    }
    Line::from(spans)
}

fn pad_cell(cell: &str, width: usize) -> String {
    let count = cell.chars().count();
    if count > width {
        let truncated: String = cell.chars().take(width.saturating_sub(1)).collect();
        format!("{truncated}…")
    } else {
        format!("{cell}{}", " ".repeat(width - count))
    }
}
