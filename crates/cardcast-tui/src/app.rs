//! TUI-local state (not part of the session).

use std::path::PathBuf;

use cardcast::logging::LogLine;
use ratatui::layout::Rect;

/// Which pane receives PageUp/PageDown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActivePane {
    Results,
    Log,
}

pub(crate) struct App {
    /// Blocking popup; while set, the next key only dismisses it.
    pub(crate) notice: Option<String>,
    /// One-line message shown in the input bar title.
    pub(crate) status_message: Option<String>,
    /// Whether the log pane is visible (Ctrl+L).
    pub(crate) show_logs: bool,
    pub(crate) active_pane: ActivePane,
    pub(crate) logs: Vec<LogLine>,
    /// Offset from the bottom of the log (0 = follow tail).
    pub(crate) log_scroll: usize,
    /// Offset from the top of the results list.
    pub(crate) results_scroll: usize,
    /// Inner area of the suggestion overlay from the last frame, for mouse
    /// hit-testing.
    pub(crate) suggestion_area: Option<Rect>,
    /// Index of the first suggestion visible in the overlay.
    pub(crate) suggestion_offset: usize,
    pub(crate) save_dir: PathBuf,
    pub(crate) backend_label: String,
    pub(crate) should_quit: bool,
}

impl App {
    pub(crate) fn new(save_dir: PathBuf, backend_label: String) -> Self {
        Self {
            notice: None,
            status_message: None,
            show_logs: false,
            active_pane: ActivePane::Results,
            logs: Vec::new(),
            log_scroll: 0,
            results_scroll: 0,
            suggestion_area: None,
            suggestion_offset: 0,
            save_dir,
            backend_label,
            should_quit: false,
        }
    }

    /// Suggestion index under terminal cell (`column`, `row`), if any.
    pub(crate) fn suggestion_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.suggestion_area?;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| self.suggestion_offset + usize::from(row - area.y))
    }
}
