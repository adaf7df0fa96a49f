//! Rendering: status bar, input, suggestion overlay, results, logs, notice.

use std::time::{Duration, Instant};

use cardcast::api::JobService;
use cardcast::job::{Job, JobState};
use cardcast::logging::{LogLevel, LogLine};
use cardcast::session::Session;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{ActivePane, App};

/// Suggestions visible at once in the overlay.
const MAX_VISIBLE_SUGGESTIONS: usize = 8;

/// Width of the text progress bar.
const PROGRESS_BAR_WIDTH: usize = 24;

// ── Public Utilities ──────────────────────────────────────────────────

/// Format a duration as "Ns", "Xm Ys" or "Xh Ym".
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    if total_secs >= 3600 {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        format!("{hours}h {mins:02}m")
    } else if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{mins}m {secs:02}s")
    } else {
        format!("{total_secs}s")
    }
}

/// Truncate a string to at most `max` characters, appending "..." if
/// truncated.
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

/// Map a log level to a ratatui [`Style`].
pub fn log_level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Trace => Style::default().fg(Color::DarkGray),
        LogLevel::Debug => Style::default().fg(Color::Cyan),
        LogLevel::Info => Style::default().fg(Color::Green),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// How full the progress bar is for `job` at `now`, in `0.0..=1.0`.
///
/// The backend reports no progress, so a polling job creeps toward 90%
/// over time. Once completion is seen the bar is full, which is what the
/// settle delay gives it time to show.
pub fn progress_ratio(job: &Job, now: Instant) -> f64 {
    match job.state {
        JobState::Idle | JobState::Failed => 0.0,
        JobState::Completed => 1.0,
        JobState::Submitting => 0.05,
        JobState::Polling if job.settling => 1.0,
        JobState::Polling => {
            let secs = job
                .submitted_at
                .map_or(0.0, |at| now.saturating_duration_since(at).as_secs_f64());
            (0.1 + 0.8 * (1.0 - (-secs / 30.0).exp())).min(0.9)
        }
    }
}

// ── Root Render ───────────────────────────────────────────────────────

pub(crate) fn render<S: JobService>(frame: &mut Frame, session: &Session<S>, app: &mut App) {
    let area = frame.area();

    // [4] status | [3] input | [flex] results (+ logs).
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(area);

    render_status(frame, chunks[0], session.job(), app);
    render_input(frame, chunks[1], session, app);

    if app.show_logs {
        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_results(frame, body[0], session.job(), app);
        render_logs(frame, body[1], &app.logs, app);
    } else {
        render_results(frame, chunks[2], session.job(), app);
    }

    // Overlays last so they draw on top.
    render_suggestions(frame, chunks[1], chunks[2], session, app);
    if let Some(ref notice) = app.notice {
        render_notice(frame, area, notice);
    }
}

// ── Status Bar ────────────────────────────────────────────────────────

fn state_style(state: JobState) -> Style {
    match state {
        JobState::Idle => Style::default().fg(Color::DarkGray),
        JobState::Submitting | JobState::Polling => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        JobState::Completed => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        JobState::Failed => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn render_status(frame: &mut Frame, area: Rect, job: &Job, app: &App) {
    let now = Instant::now();

    let mut line1 = vec![
        Span::styled("State: ", Style::default().fg(Color::DarkGray)),
        Span::styled(job.state.label(), state_style(job.state)),
    ];
    if let Some(ref id) = job.id {
        line1.push(Span::styled("   Job: ", Style::default().fg(Color::DarkGray)));
        line1.push(Span::raw(truncate_str(id.as_str(), 24)));
    }
    if job.state.is_busy()
        && let Some(at) = job.submitted_at
    {
        line1.push(Span::styled("   Elapsed: ", Style::default().fg(Color::DarkGray)));
        line1.push(Span::styled(
            format_elapsed(now.saturating_duration_since(at)),
            Style::default().fg(Color::Cyan),
        ));
        line1.push(Span::styled(
            format!("   Polls: {}", job.polls),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let ratio = progress_ratio(job, now);
    let filled = (ratio * PROGRESS_BAR_WIDTH as f64).round() as usize;
    let empty = PROGRESS_BAR_WIDTH.saturating_sub(filled);
    let bar = format!(
        "{}{} {:.0}%",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(empty),
        ratio * 100.0
    );
    let bar_style = match job.state {
        JobState::Completed => Style::default().fg(Color::Green),
        JobState::Failed => Style::default().fg(Color::Red),
        _ if job.settling => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::Yellow),
    };
    let line2 = Line::from(vec![
        Span::styled("Progress: ", Style::default().fg(Color::DarkGray)),
        Span::styled(bar, bar_style),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(format!(" cardcast \u{00b7} {} ", app.backend_label));

    let paragraph = Paragraph::new(vec![Line::from(line1), line2]).block(block);
    frame.render_widget(paragraph, area);
}

// ── Input Bar ─────────────────────────────────────────────────────────

fn render_input<S: JobService>(frame: &mut Frame, area: Rect, session: &Session<S>, app: &App) {
    let title = match app.status_message {
        Some(ref msg) => format!(" {msg} "),
        None => concat!(
            " [Enter] pick/generate  [Up/Down] suggestions",
            "  [Ctrl+S] save  [Ctrl+L] logs  [Ctrl+C] quit "
        )
        .to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(title);

    let paragraph = Paragraph::new(format!("> {}\u{2588}", session.input())).block(block);
    frame.render_widget(paragraph, area);
}

// ── Suggestion Overlay ────────────────────────────────────────────────

fn render_suggestions<S: JobService>(
    frame: &mut Frame,
    input: Rect,
    below: Rect,
    session: &Session<S>,
    app: &mut App,
) {
    let suggestions = session.suggestions();
    let visible = suggestions.len().min(MAX_VISIBLE_SUGGESTIONS);
    let height = (visible as u16 + 2).min(below.height);
    if visible == 0 || height < 3 {
        app.suggestion_area = None;
        app.suggestion_offset = 0;
        return;
    }

    let area = Rect::new(input.x + 2, below.y, input.width.saturating_sub(4), height);
    let rows = usize::from(height - 2);

    // Keep the highlight in view.
    let mut offset = app.suggestion_offset.min(suggestions.len().saturating_sub(rows));
    if let Some(h) = session.highlight() {
        if h < offset {
            offset = h;
        } else if h >= offset + rows {
            offset = h + 1 - rows;
        }
    }

    let match_style = Style::default().add_modifier(Modifier::BOLD);
    let highlight_style = Style::default().fg(Color::Black).bg(Color::Yellow);
    let lines: Vec<Line> = suggestions
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(i, s)| {
            let line = Line::from(vec![
                Span::styled(s.matched_part(), match_style),
                Span::raw(s.rest()),
            ]);
            if session.highlight() == Some(i) {
                line.style(highlight_style)
            } else {
                line
            }
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} suggestion(s) ", suggestions.len()));

    app.suggestion_area = Some(block.inner(area));
    app.suggestion_offset = offset;

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Results Pane ──────────────────────────────────────────────────────

fn render_results(frame: &mut Frame, area: Rect, job: &Job, app: &App) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = Vec::new();

    match job.state {
        JobState::Idle => {
            lines.push(Line::from(Span::styled(
                "Type a prompt and press Enter to generate cards.",
                dim,
            )));
        }
        JobState::Submitting | JobState::Polling => {
            lines.push(Line::from(vec![
                Span::styled("Generating cards for ", dim),
                Span::styled(
                    format!("'{}'", truncate_str(&job.prompt, 60)),
                    Style::default().fg(Color::White),
                ),
                Span::styled("\u{2026}", dim),
            ]));
        }
        JobState::Failed => {
            let message = job
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            lines.push(Line::from(Span::styled(
                format!("Error: {message}"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
        JobState::Completed if job.results.is_empty() => {
            lines.push(Line::from(Span::styled("No cards returned.", dim)));
        }
        JobState::Completed => {
            for card in &job.results {
                lines.push(Line::from(Span::styled(
                    card.summary(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(Span::styled(
                    format!("    {}, {} bytes", card.mime, card.image_size_hint()),
                    dim,
                )));
            }
        }
    }

    let border_color = if app.show_logs && app.active_pane == ActivePane::Results {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Results ({}) ", job.results.len()));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.results_scroll.min(u16::MAX as usize) as u16, 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ── Log Pane ──────────────────────────────────────────────────────────

fn render_logs(frame: &mut Frame, area: Rect, logs: &[LogLine], app: &App) {
    let inner_height = area.height.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::with_capacity(logs.len());
    for log in logs {
        // Trace/debug are too noisy for the pane.
        if matches!(log.level, LogLevel::Trace | LogLevel::Debug) {
            continue;
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", log.time), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{} ", log.level.label()), log_level_style(log.level)),
            Span::raw(log.message.as_str()),
        ]));
    }

    let scroll = lines
        .len()
        .saturating_sub(inner_height)
        .saturating_sub(app.log_scroll);

    let border_color = if app.active_pane == ActivePane::Log {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Log ");

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll.min(u16::MAX as usize) as u16, 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ── Notice Popup ──────────────────────────────────────────────────────

fn render_notice(frame: &mut Frame, area: Rect, message: &str) {
    let width = area.width.min(50);
    let height = area.height.min(5);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Notice ");
    let text = vec![
        Line::from(Span::styled(
            message,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "[any key] dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────
