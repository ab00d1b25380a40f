use chrono::NaiveDateTime;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::api::UserRecord;
use crate::app::{AppState, Dialog, FormField, ListView, UserForm};

/// Format an optional age for display.
pub fn format_age(age: Option<i32>) -> String {
    match age {
        Some(a) => format!("{a} 岁"),
        None => "未填写".to_string(),
    }
}

/// Format a server-assigned creation timestamp for display.
pub fn format_created(created_at: &NaiveDateTime) -> String {
    created_at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Map one record to its displayed cells: id, name, email, age, created.
/// Pure, so the mapping is testable apart from the widget that shows it.
/// Text is rendered as literal content; markup-significant characters in
/// name or email stay verbatim.
pub fn user_cells(u: &UserRecord) -> [String; 5] {
    [
        format!("#{}", u.id),
        u.name.clone(),
        u.email.clone(),
        format_age(u.age),
        format_created(&u.created_at),
    ]
}

pub fn render_user_list(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let block = Block::default()
        .title("Users")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));

    match &app.list {
        ListView::Loading => {
            let p = Paragraph::new("Loading users…")
                .style(Style::default().fg(app.theme.text))
                .block(block);
            f.render_widget(p, area);
        }
        ListView::Failed(_) => {
            let p = Paragraph::new("Failed to load users — press r to retry")
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(block);
            f.render_widget(p, area);
        }
        ListView::Ready(users) if users.is_empty() => {
            let p = Paragraph::new("No users yet — press n to create one")
                .style(Style::default().fg(app.theme.text))
                .block(block);
            f.render_widget(p, area);
        }
        ListView::Ready(users) => {
            let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
            let end = (start + app.rows_per_page).min(users.len());
            let slice = &users[start..end];

            let rows = slice.iter().enumerate().map(|(i, u)| {
                let absolute_index = start + i;
                let style = if absolute_index == app.selected_index {
                    Style::default()
                        .fg(app.theme.highlight_fg)
                        .bg(app.theme.highlight_bg)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(app.theme.text)
                };
                Row::new(user_cells(u).map(Cell::from)).style(style)
            });

            let widths = [
                Constraint::Length(6),
                Constraint::Length(20),
                Constraint::Percentage(40),
                Constraint::Length(10),
                Constraint::Length(19),
            ];
            let header = Row::new(vec!["ID", "NAME", "EMAIL", "AGE", "CREATED"]).style(
                Style::default()
                    .fg(app.theme.title)
                    .add_modifier(Modifier::BOLD),
            );

            let table = Table::new(rows, widths)
                .header(header)
                .block(block)
                .column_spacing(1);
            f.render_widget(table, area);
        }
    }
}

pub fn render_user_detail(f: &mut Frame, area: Rect, app: &AppState) {
    let text = match app.selected_user() {
        Some(u) => {
            let [id, name, email, age, created] = user_cells(u);
            format!("ID: {id}\nName: {name}\nEmail: {email}\nAge: {age}\nCreated: {created}")
        }
        None => String::new(),
    };
    let p = Paragraph::new(text)
        .style(Style::default().fg(app.theme.text))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}

/// Render the open dialog and return its rectangle, which the event loop
/// uses to treat clicks outside it as cancel.
pub fn render_user_dialog(f: &mut Frame, area: Rect, app: &AppState, state: &Dialog) -> Rect {
    match state {
        Dialog::Actions { selected } => {
            let rect = crate::ui::components::centered_rect(30, 6, area);
            let options = ["Edit", "Delete"];
            let mut text = String::new();
            for (idx, label) in options.iter().enumerate() {
                if idx == *selected {
                    text.push_str(&format!("▶ {}\n", label));
                } else {
                    text.push_str(&format!("  {}\n", label));
                }
            }
            let p = Paragraph::new(text).block(
                Block::default()
                    .title("Actions")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            );
            f.render_widget(Clear, rect);
            f.render_widget(p, rect);
            rect
        }
        Dialog::CreateUser { field } => {
            render_form_dialog(f, area, app, "New user", &app.create_form, *field)
        }
        Dialog::EditUser { id, form, field } => {
            let title = format!("Edit user #{id}");
            render_form_dialog(f, area, app, &title, form, *field)
        }
        Dialog::DeleteConfirm { selected } => {
            let rect = crate::ui::components::centered_rect(50, 7, area);
            let name = app
                .pending_delete
                .as_ref()
                .map(|t| t.name.clone())
                .unwrap_or_default();
            let yes = if *selected == 0 { "[Yes]" } else { " Yes " };
            let no = if *selected == 1 { "[No]" } else { " No  " };
            let body = format!("Delete user '{name}'?\n\n  {yes}    {no}");
            let p = Paragraph::new(body).wrap(Wrap { trim: false }).block(
                Block::default()
                    .title("Confirm delete")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            );
            f.render_widget(Clear, rect);
            f.render_widget(p, rect);
            rect
        }
    }
}

fn render_form_dialog(
    f: &mut Frame,
    area: Rect,
    app: &AppState,
    title: &str,
    form: &UserForm,
    field: FormField,
) -> Rect {
    let rect = crate::ui::components::centered_rect(60, 8, area);
    let marker = |which: FormField| if field == which { "▶" } else { " " };
    let body = format!(
        "{} Name:  {}\n{} Email: {}\n{} Age:   {}\n\nEnter: submit  Tab: next field  Esc: cancel",
        marker(FormField::Name),
        form.name,
        marker(FormField::Email),
        form.email,
        marker(FormField::Age),
        form.age,
    );
    let p = Paragraph::new(body).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
    rect
}
