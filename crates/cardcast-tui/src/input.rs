//! Key and mouse handling: terminal events become session actions.

use cardcast::api::JobService;
use cardcast::autocomplete::Direction;
use cardcast::cards;
use cardcast::job::JobState;
use cardcast::session::{Session, UserAction};
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::warn;

use crate::app::{ActivePane, App};

pub(crate) fn handle_key_event<S: JobService>(
    key: KeyEvent,
    app: &mut App,
    session: &mut Session<S>,
) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Ctrl+C always quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // The notice blocks everything else until acknowledged.
    if app.notice.is_some() {
        app.notice = None;
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('l') => toggle_logs(app),
            KeyCode::Char('s') => save_results(app, session),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Up => apply(app, session, UserAction::Arrow(Direction::Up)),
        KeyCode::Down => apply(app, session, UserAction::Arrow(Direction::Down)),
        KeyCode::Enter => apply(app, session, UserAction::Enter),
        KeyCode::Backspace => {
            let mut value = session.input().to_string();
            if value.pop().is_some() {
                apply(app, session, UserAction::InputChanged(value));
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
            let mut value = session.input().to_string();
            value.push(c);
            apply(app, session, UserAction::InputChanged(value));
        }
        KeyCode::Tab | KeyCode::BackTab => {
            if app.show_logs {
                app.active_pane = match app.active_pane {
                    ActivePane::Log => ActivePane::Results,
                    ActivePane::Results => ActivePane::Log,
                };
            }
        }
        KeyCode::PageUp => scroll(app, 10, true),
        KeyCode::PageDown => scroll(app, 10, false),
        KeyCode::End => match app.active_pane {
            ActivePane::Log => app.log_scroll = 0,
            ActivePane::Results => app.results_scroll = 0,
        },
        _ => {}
    }
}

pub(crate) fn handle_mouse_event<S: JobService>(
    mouse: MouseEvent,
    app: &mut App,
    session: &mut Session<S>,
) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.notice.is_some() {
                app.notice = None;
                return;
            }
            let Some(index) = app.suggestion_at(mouse.column, mouse.row) else {
                return;
            };
            // The overlay renders markup; the click carries it like any
            // rendered suggestion would.
            let Some(raw) = session.suggestions().get(index).map(|s| s.markup()) else {
                return;
            };
            apply(app, session, UserAction::SuggestionClicked(raw));
        }
        MouseEventKind::ScrollUp => scroll(app, 3, true),
        MouseEventKind::ScrollDown => scroll(app, 3, false),
        _ => {}
    }
}

/// Dispatch to the session and surface rejected submissions as a notice.
fn apply<S: JobService>(app: &mut App, session: &mut Session<S>, action: UserAction) {
    let submits = matches!(action, UserAction::Enter | UserAction::Submit);
    match session.dispatch(action) {
        Ok(()) => {
            if submits && session.job().state == JobState::Submitting {
                app.status_message = None;
                app.results_scroll = 0;
            }
        }
        Err(e) => app.notice = Some(e.to_string()),
    }
}

fn toggle_logs(app: &mut App) {
    app.show_logs = !app.show_logs;
    app.active_pane = if app.show_logs {
        ActivePane::Log
    } else {
        ActivePane::Results
    };
}

fn scroll(app: &mut App, by: usize, up: bool) {
    match (app.active_pane, up) {
        // Log scroll counts from the bottom.
        (ActivePane::Log, true) => app.log_scroll = app.log_scroll.saturating_add(by),
        (ActivePane::Log, false) => app.log_scroll = app.log_scroll.saturating_sub(by),
        (ActivePane::Results, true) => app.results_scroll = app.results_scroll.saturating_sub(by),
        (ActivePane::Results, false) => app.results_scroll = app.results_scroll.saturating_add(by),
    }
}

fn save_results<S: JobService>(app: &mut App, session: &Session<S>) {
    let job = session.job();
    if job.state != JobState::Completed || job.results.is_empty() {
        app.status_message = Some("Nothing to save yet.".into());
        return;
    }
    app.status_message = Some(match cards::save_images_now(&app.save_dir, &job.results) {
        Ok(paths) => format!("Saved {} image(s) to {}", paths.len(), app.save_dir.display()),
        Err(e) => {
            warn!("Saving images failed: {e}");
            format!("Save failed: {e}")
        }
    });
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ratatui::layout::Rect;

    use super::*;
    use crate::testing::offline_session;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app() -> App {
        App::new(PathBuf::from("."), String::new())
    }

    fn type_text<S: JobService>(app: &mut App, session: &mut Session<S>, text: &str) {
        for c in text.chars() {
            handle_key_event(key(KeyCode::Char(c)), app, session);
        }
    }

    #[tokio::test]
    async fn typing_filters_and_enter_commits() {
        let mut app = app();
        let mut session = offline_session();

        type_text(&mut app, &mut session, "pi");
        assert_eq!(session.input(), "pi");
        assert_eq!(session.suggestions().len(), 2);

        handle_key_event(key(KeyCode::Down), &mut app, &mut session);
        handle_key_event(key(KeyCode::Down), &mut app, &mut session);
        assert_eq!(session.highlight(), Some(1));

        handle_key_event(key(KeyCode::Enter), &mut app, &mut session);
        assert_eq!(session.input(), "Pidgey");
        assert!(session.suggestions().is_empty());
        assert_eq!(session.job().state, JobState::Idle);

        handle_key_event(key(KeyCode::Backspace), &mut app, &mut session);
        assert_eq!(session.input(), "Pidge");
        assert_eq!(session.suggestions().len(), 1);
    }

    #[tokio::test]
    async fn enter_on_empty_input_raises_blocking_notice() {
        let mut app = app();
        let mut session = offline_session();

        handle_key_event(key(KeyCode::Enter), &mut app, &mut session);
        assert_eq!(app.notice.as_deref(), Some("please enter a prompt first"));

        // The next key only dismisses the notice.
        handle_key_event(key(KeyCode::Char('x')), &mut app, &mut session);
        assert!(app.notice.is_none());
        assert_eq!(session.input(), "");
    }

    #[tokio::test]
    async fn enter_without_highlight_submits() {
        let mut app = app();
        let mut session = offline_session();

        type_text(&mut app, &mut session, "Mew");
        handle_key_event(key(KeyCode::Enter), &mut app, &mut session);
        assert_eq!(session.job().state, JobState::Submitting);
        assert_eq!(session.job().prompt, "Mew");
    }

    #[tokio::test]
    async fn click_commits_the_suggestion_under_the_pointer() {
        let mut app = app();
        let mut session = offline_session();
        type_text(&mut app, &mut session, "pi");
        app.suggestion_area = Some(Rect::new(1, 5, 30, 2));

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 6,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(click, &mut app, &mut session);
        assert_eq!(session.input(), "Pidgey");
        assert!(session.suggestions().is_empty());
    }

    #[tokio::test]
    async fn ctrl_keys_toggle_logs_and_quit() {
        let mut app = app();
        let mut session = offline_session();

        handle_key_event(ctrl('l'), &mut app, &mut session);
        assert!(app.show_logs);
        assert_eq!(app.active_pane, ActivePane::Log);

        handle_key_event(ctrl('s'), &mut app, &mut session);
        assert_eq!(app.status_message.as_deref(), Some("Nothing to save yet."));
        assert_eq!(session.input(), "", "ctrl chords never reach the input");

        handle_key_event(ctrl('c'), &mut app, &mut session);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn key_release_is_ignored() {
        let mut app = app();
        let mut session = offline_session();
        let mut release = key(KeyCode::Char('a'));
        release.kind = KeyEventKind::Release;
        handle_key_event(release, &mut app, &mut session);
        assert_eq!(session.input(), "");
    }
}
