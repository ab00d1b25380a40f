pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ListView};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)].as_ref())
        .split(root[1]);

    let count = match &app.list {
        ListView::Ready(users) => users.len().to_string(),
        ListView::Loading => "…".to_string(),
        ListView::Failed(_) => "-".to_string(),
    };
    let hints = match app.input_mode {
        InputMode::Normal => "r: refresh; n: new user; Enter: actions; Del: delete; q: quit",
        InputMode::Dialog => "Enter: confirm; Tab: next field; Esc: cancel",
    };
    let p = Paragraph::new(format!("users:{count}  — {hints}"))
        .block(
            Block::default()
                .title("usrdir-manager")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(
            Style::default()
                .fg(app.theme.header_fg)
                .bg(app.theme.header_bg),
        );
    f.render_widget(p, root[0]);

    users::render_user_list(f, body[0], app);
    users::render_user_detail(f, body[1], app);

    components::render_toast(f, root[2], app);
    components::render_status_bar(f, root[3], app);

    if let Some(state) = app.dialog.clone() {
        let rect = users::render_user_dialog(f, f.area(), app, &state);
        app.dialog_area = Some(rect);
    } else {
        app.dialog_area = None;
    }
}
