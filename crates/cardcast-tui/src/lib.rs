//! Terminal front end for a cardcast [`Session`].
//!
//! A single text input with a suggestion overlay, a job status line with a
//! progress bar, the results list, and an optional log pane (ratatui +
//! crossterm). The UI loop owns the session: each frame it applies waiting
//! job events, renders, then polls the terminal for input.
//!
//! # Quick start
//!
//! ```ignore
//! use cardcast::prelude::*;
//! use cardcast_tui::{TuiConfig, run_tui};
//!
//! let session = Session::new(service, Corpus::builtin(), JobConfig::default());
//! tokio::task::spawn_blocking(move || run_tui(session, TuiConfig::default())).await??;
//! ```

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use cardcast::api::JobService;
use cardcast::logging::LogBuffer;
use cardcast::session::Session;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::execute;
use ratatui::prelude::*;

mod app;
mod input;
mod render;

#[cfg(test)]
mod testing;

pub use render::{format_elapsed, log_level_style, progress_ratio, truncate_str};

use app::App;
use input::{handle_key_event, handle_mouse_event};
use render::render;

/// Configuration for the TUI.
pub struct TuiConfig {
    /// Where Ctrl+S writes the images of a completed job.
    pub save_dir: PathBuf,
    /// Backend shown in the status bar.
    pub backend_label: String,
    /// Optional log buffer from the tracing layer, drained once per frame.
    pub log_buffer: Option<LogBuffer>,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("cards"),
            backend_label: cardcast::DEFAULT_BASE_URL.to_string(),
            log_buffer: None,
        }
    }
}

/// Run the TUI event loop (blocking) until the user quits.
///
/// Call this off the async executor, e.g. from `spawn_blocking`: job tasks
/// keep running on the session's runtime while this thread waits on the
/// terminal.
pub fn run_tui<S: JobService>(mut session: Session<S>, config: TuiConfig) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new(config.save_dir.clone(), config.backend_label.clone());

    let result = event_loop(&mut terminal, &mut session, &mut app, &config);

    // Restore the terminal even when the loop failed.
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend, S: JobService>(
    terminal: &mut Terminal<B>,
    session: &mut Session<S>,
    app: &mut App,
    config: &TuiConfig,
) -> io::Result<()> {
    while !app.should_quit {
        session.drain_ready();

        if let Some(ref log_buf) = config.log_buffer {
            log_buf.flush_into(&mut app.logs);
        }

        terminal.draw(|frame| render(frame, session, app))?;

        // 100ms keeps the progress bar moving while idle.
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => handle_key_event(key, app, session),
                Event::Mouse(mouse) => handle_mouse_event(mouse, app, session),
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_config_default() {
        let config = TuiConfig::default();
        assert_eq!(config.save_dir, PathBuf::from("cards"));
        assert_eq!(config.backend_label, cardcast::DEFAULT_BASE_URL);
        assert!(config.log_buffer.is_none());
    }

    #[test]
    fn app_defaults() {
        let app = App::new(PathBuf::from("out"), "http://x".into());
        assert!(!app.should_quit);
        assert!(!app.show_logs);
        assert!(app.notice.is_none());
        assert!(app.status_message.is_none());
        assert!(app.suggestion_area.is_none());
        assert_eq!(app.log_scroll, 0);
        assert_eq!(app.results_scroll, 0);
    }
}
