use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::backend::DocsClient;

/// Shown in place of an answer whenever the exchange fails, no matter
/// how. Mirrors the port baked into `backend::DEFAULT_BASE_URL`.
pub const FALLBACK_NOTICE: &str = "⚠️ Could not reach the server. Is it running on port 8000?";

/// Starter questions offered while the transcript is empty. Picking one
/// fills the input box; it never submits.
pub const SUGGESTIONS: [&str; 5] = [
    "Fix my useEffect",
    "App Router vs Pages Router",
    "Server Actions example",
    "next/image usage",
    "Middleware setup",
];

/// Text rows the input box may grow to before it scrolls internally.
pub const MAX_INPUT_ROWS: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// Append-only transcript. Messages are never edited or removed once
/// pushed; display order is insertion order.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn push(&mut self, role: ChatRole, content: String) {
        self.messages.push(ChatMessage { role, content });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Transcript
    pub conversation: Conversation,

    // Outstanding exchange; `loading` is true exactly while one request
    // is in flight, and nothing else can be submitted until it clears
    pub loading: bool,
    pub pending: Option<JoinHandle<anyhow::Result<String>>>,

    // Composed input
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript scrolling
    pub transcript_scroll: u16,
    pub follow_bottom: bool,
    pub transcript_height: u16, // inner height of chat area, set during render
    pub total_transcript_lines: u16,

    // Suggestion list (shown while the transcript is empty)
    pub suggestion_state: ListState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend
    pub backend: DocsClient,
}

impl App {
    pub fn new(base_url: &str) -> Self {
        let mut suggestion_state = ListState::default();
        suggestion_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            conversation: Conversation::default(),
            loading: false,
            pending: None,
            input: String::new(),
            cursor: 0,
            transcript_scroll: 0,
            follow_bottom: true,
            transcript_height: 0,
            total_transcript_lines: 0,
            suggestion_state,
            animation_frame: 0,
            backend: DocsClient::new(base_url),
        }
    }

    /// Send the composed question. A blank buffer (after trimming) or an
    /// exchange already in flight makes this a silent no-op; otherwise
    /// the user message is recorded exactly as typed, the buffer is
    /// cleared and a single request is started.
    pub fn submit(&mut self) {
        if self.input.trim().is_empty() || self.loading {
            return;
        }

        let question = std::mem::take(&mut self.input);
        self.cursor = 0;

        self.conversation.push(ChatRole::User, question.clone());
        self.loading = true;
        self.scroll_to_end();

        let backend = self.backend.clone();
        self.pending = Some(tokio::spawn(async move { backend.ask(&question).await }));
    }

    /// True once the outstanding request task has run to completion and
    /// its outcome is ready to collect.
    pub fn exchange_ready(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| task.is_finished())
    }

    /// Await the finished request task and fold its outcome into the
    /// transcript. A panicked or aborted task counts as a failed
    /// exchange.
    pub async fn collect_exchange(&mut self) {
        if let Some(task) = self.pending.take() {
            let outcome = match task.await {
                Ok(result) => result,
                Err(join_err) => Err(anyhow::Error::from(join_err)),
            };
            self.finish_exchange(outcome);
        }
    }

    /// Record the outcome of the outstanding exchange. Every failure
    /// collapses into the one fallback notice; `loading` clears on all
    /// paths so the input can never stay blocked.
    pub fn finish_exchange(&mut self, outcome: anyhow::Result<String>) {
        let content = match outcome {
            Ok(answer) => answer,
            Err(_) => FALLBACK_NOTICE.to_string(),
        };

        self.conversation.push(ChatRole::Assistant, content);
        self.loading = false;
        self.pending = None;
        self.scroll_to_end();
    }

    // Input buffer editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete_forward(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor < char_count {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    /// Cursor position as (row, column) within the buffer, in chars.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let mut row = 0;
        let mut col = 0;
        for c in self.input.chars().take(self.cursor) {
            if c == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    // (start char index, length in chars) of every buffer line
    fn line_bounds(&self) -> Vec<(usize, usize)> {
        let mut bounds = Vec::new();
        let mut start = 0;
        let mut len = 0;
        for c in self.input.chars() {
            if c == '\n' {
                bounds.push((start, len));
                start += len + 1;
                len = 0;
            } else {
                len += 1;
            }
        }
        bounds.push((start, len));
        bounds
    }

    pub fn cursor_up(&mut self) {
        let (row, col) = self.cursor_line_col();
        if row == 0 {
            return;
        }
        let (start, len) = self.line_bounds()[row - 1];
        self.cursor = start + col.min(len);
    }

    pub fn cursor_down(&mut self) {
        let (row, col) = self.cursor_line_col();
        let bounds = self.line_bounds();
        if row + 1 >= bounds.len() {
            return;
        }
        let (start, len) = bounds[row + 1];
        self.cursor = start + col.min(len);
    }

    pub fn cursor_home(&mut self) {
        let (row, _) = self.cursor_line_col();
        self.cursor = self.line_bounds()[row].0;
    }

    pub fn cursor_end(&mut self) {
        let (row, _) = self.cursor_line_col();
        let (start, len) = self.line_bounds()[row];
        self.cursor = start + len;
    }

    /// Rows the input box needs: grows with explicit line breaks up to
    /// the cap, then the box scrolls internally.
    pub fn input_rows(&self) -> u16 {
        let lines = self.input.split('\n').count() as u16;
        lines.clamp(1, MAX_INPUT_ROWS)
    }

    // Transcript scrolling

    /// Pin the transcript to its end on the next render. Called after
    /// every append and every loading transition, never on buffer edits.
    pub fn scroll_to_end(&mut self) {
        self.follow_bottom = true;
    }

    pub fn scroll_up_by(&mut self, n: u16) {
        self.follow_bottom = false;
        self.transcript_scroll = self.transcript_scroll.saturating_sub(n);
    }

    pub fn scroll_down_by(&mut self, n: u16) {
        let max = self
            .total_transcript_lines
            .saturating_sub(self.transcript_height);
        self.transcript_scroll = self.transcript_scroll.saturating_add(n).min(max);
        if self.transcript_scroll >= max {
            self.follow_bottom = true;
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up_by((self.transcript_height / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down_by((self.transcript_height / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.follow_bottom = false;
        self.transcript_scroll = 0;
    }

    // Suggestions

    pub fn suggestions_visible(&self) -> bool {
        self.conversation.is_empty() && !self.loading
    }

    pub fn suggestion_nav_down(&mut self) {
        let i = self.suggestion_state.selected().unwrap_or(0);
        self.suggestion_state
            .select(Some((i + 1).min(SUGGESTIONS.len() - 1)));
    }

    pub fn suggestion_nav_up(&mut self) {
        let i = self.suggestion_state.selected().unwrap_or(0);
        self.suggestion_state.select(Some(i.saturating_sub(1)));
    }

    /// Copy the highlighted suggestion into the input box and focus it.
    /// Never submits.
    pub fn pick_suggestion(&mut self) {
        if let Some(q) = self
            .suggestion_state
            .selected()
            .and_then(|i| SUGGESTIONS.get(i))
        {
            self.input = q.to_string();
            self.cursor = self.input.chars().count();
            self.input_mode = InputMode::Editing;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
