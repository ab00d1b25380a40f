//! Shared UI components (status bar, toast line, dialog helpers).

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::app::{AppState, InputMode, NoticeKind};

/// Render the bottom status bar with mode, counts and the API endpoint.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Dialog => "DIALOG",
    };
    let pending = if app.inflight > 0 {
        format!("  requests:{}", app.inflight)
    } else {
        String::new()
    };
    let msg = format!(
        "mode: {mode}  users:{}  rows/page:{}{pending}  up:{}s  api: {}",
        app.users().len(),
        app.rows_per_page,
        app.started_at.elapsed().as_secs(),
        app.api_url
    );
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Render the transient notification line. One message at a time; the
/// event loop expires it after its display time.
pub fn render_toast(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(n) = &app.notification else {
        return;
    };
    let bg = match n.kind {
        NoticeKind::Success => app.theme.success_bg,
        NoticeKind::Failure => app.theme.failure_bg,
    };
    let p = Paragraph::new(format!(" {}", n.text)).style(
        Style::default()
            .fg(ratatui::style::Color::Black)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
