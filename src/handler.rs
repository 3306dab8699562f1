use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back into the input box
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
            app.cursor = app.input.chars().count();
        }

        // Half-page scroll (must be before the plain arms to match first)
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        // While the transcript is empty these navigate the suggestions
        KeyCode::Char('j') | KeyCode::Down => {
            if app.suggestions_visible() {
                app.suggestion_nav_down();
            } else {
                app.scroll_down_by(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.suggestions_visible() {
                app.suggestion_nav_up();
            } else {
                app.scroll_up_by(1);
            }
        }

        // Fill the input box with the highlighted suggestion, no submit
        KeyCode::Enter => {
            if app.suggestions_visible() {
                app.pick_suggestion();
            }
        }

        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_end(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,

        // Enter sends; with a shift-like modifier it breaks the line
        // instead (Alt works on terminals that swallow Shift+Enter)
        KeyCode::Enter => {
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT)
            {
                app.insert_newline();
            } else {
                app.submit();
            }
        }

        KeyCode::Backspace => app.delete_back(),
        KeyCode::Delete => app.delete_forward(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Up => app.cursor_up(),
        KeyCode::Down => app.cursor_down(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.insert_char(c);
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down_by(3),
        MouseEventKind::ScrollUp => app.scroll_up_by(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SUGGESTIONS;
    use crate::backend::test_support::unreachable_url;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, modifiers))
    }

    #[tokio::test]
    async fn test_plain_enter_submits_exactly_once() {
        let mut app = App::new(&unreachable_url());
        app.input = "hello".to_string();
        app.cursor = 5;

        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.conversation.messages().len(), 1);
        assert!(app.loading);
        assert!(app.input.is_empty());

        app.collect_exchange().await;
        assert_eq!(app.conversation.messages().len(), 2);
    }

    #[test]
    fn test_shift_enter_inserts_line_break() {
        let mut app = App::new("http://127.0.0.1:1");
        app.input = "line".to_string();
        app.cursor = 4;

        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::SHIFT));

        assert_eq!(app.input, "line\n");
        assert!(app.conversation.is_empty());
        assert!(!app.loading);
    }

    #[test]
    fn test_alt_enter_inserts_line_break() {
        let mut app = App::new("http://127.0.0.1:1");
        app.input = "a".to_string();
        app.cursor = 1;

        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::ALT));

        assert_eq!(app.input, "a\n");
        assert!(app.conversation.is_empty());
    }

    #[tokio::test]
    async fn test_enter_while_busy_changes_nothing() {
        let mut app = App::new(&unreachable_url());
        app.input = "a".to_string();
        handle_event(&mut app, key(KeyCode::Enter));

        app.input = "b".to_string();
        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.conversation.messages().len(), 1);
        assert_eq!(app.conversation.messages()[0].content, "a");
        assert!(app.loading);

        app.collect_exchange().await;
    }

    #[test]
    fn test_typing_is_never_blocked_by_busy() {
        let mut app = App::new("http://127.0.0.1:1");
        app.loading = true;

        handle_event(&mut app, key(KeyCode::Char('s')));
        handle_event(&mut app, key(KeyCode::Char('o')));

        assert_eq!(app.input, "so");
    }

    #[test]
    fn test_ctrl_c_quits_in_any_mode() {
        let mut app = App::new("http://127.0.0.1:1");
        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);

        let mut app = App::new("http://127.0.0.1:1");
        app.input_mode = InputMode::Normal;
        handle_event(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_suggestion_pick_fills_input_without_submitting() {
        let mut app = App::new("http://127.0.0.1:1");
        app.input_mode = InputMode::Normal;

        handle_event(&mut app, key(KeyCode::Char('j')));
        handle_event(&mut app, key(KeyCode::Char('j')));
        handle_event(&mut app, key(KeyCode::Enter));

        assert_eq!(app.input, SUGGESTIONS[2]);
        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.conversation.is_empty());
        assert!(!app.loading);
    }

    #[test]
    fn test_manual_scroll_releases_follow_bottom() {
        let mut app = App::new("http://127.0.0.1:1");
        app.conversation.push(crate::app::ChatRole::User, "q".into());
        app.total_transcript_lines = 50;
        app.transcript_height = 10;
        app.transcript_scroll = 40;

        handle_event(&mut app, key(KeyCode::Char('k')));
        assert!(!app.follow_bottom);
        assert_eq!(app.transcript_scroll, 39);

        handle_event(&mut app, key_with(KeyCode::Char('G'), KeyModifiers::SHIFT));
        assert!(app.follow_bottom);
    }

    #[test]
    fn test_mouse_wheel_scrolls_transcript() {
        let mut app = App::new("http://127.0.0.1:1");
        app.conversation.push(crate::app::ChatRole::User, "q".into());
        app.total_transcript_lines = 50;
        app.transcript_height = 10;
        app.transcript_scroll = 20;

        let wheel_up = MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        handle_event(&mut app, AppEvent::Mouse(wheel_up));

        assert_eq!(app.transcript_scroll, 17);
        assert!(!app.follow_bottom);
    }
}
