use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Position;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use crate::api::UserApi;
use crate::app::{
    ApiEvent, ApiRequest, AppState, DeleteTarget, Dialog, FollowUp, FormField, InputMode, ListView,
    NoticeKind, UserForm,
};
use crate::ui;

/// Event loop: draw, drain completed requests, handle input. Each dispatched
/// request runs on its own thread so the UI stays interactive while a
/// response is outstanding.
pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    api: Arc<dyn UserApi>,
    api_url: &str,
) -> Result<()> {
    let mut app = AppState::new(api_url);
    let (tx, rx) = mpsc::channel::<ApiEvent>();

    let initial = begin_refresh(&mut app);
    dispatch(&api, &tx, &mut app, initial);

    loop {
        terminal.draw(|f| {
            ui::render(f, &mut app);
        })?;

        while let Ok(ev) = rx.try_recv() {
            if let Some(FollowUp::RefreshList) = apply_api_event(&mut app, ev) {
                let req = begin_refresh(&mut app);
                dispatch(&api, &tx, &mut app, req);
            }
        }
        app.prune_notification();

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match app.input_mode {
                    InputMode::Normal => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Char('r') => {
                            let req = begin_refresh(&mut app);
                            dispatch(&api, &tx, &mut app, req);
                        }
                        KeyCode::Char('n') => open_create(&mut app),
                        KeyCode::Enter => open_actions(&mut app),
                        KeyCode::Delete => open_delete_confirm(&mut app),
                        KeyCode::Up | KeyCode::Char('k') => {
                            if app.selected_index > 0 {
                                app.selected_index -= 1;
                            }
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            if app.selected_index + 1 < app.users().len() {
                                app.selected_index += 1;
                            }
                        }
                        KeyCode::Left | KeyCode::Char('h') => {
                            let rpp = app.rows_per_page.max(1);
                            app.selected_index = app.selected_index.saturating_sub(rpp);
                        }
                        KeyCode::Right | KeyCode::Char('l') => {
                            let rpp = app.rows_per_page.max(1);
                            let new_idx = app.selected_index.saturating_add(rpp);
                            app.selected_index = new_idx.min(app.users().len().saturating_sub(1));
                        }
                        _ => {}
                    },
                    InputMode::Dialog => {
                        if let Some(req) = handle_dialog_key(&mut app, key.code) {
                            dispatch(&api, &tx, &mut app, req);
                        }
                    }
                },
                Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                    // A click outside the dialog boundary is an explicit cancel.
                    if let Some(area) = app.dialog_area
                        && app.dialog.is_some()
                        && !area.contains(Position::new(m.column, m.row))
                    {
                        dismiss_dialog(&mut app);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Run one request against the API and package its outcome for the UI
/// thread. Errors are flattened to display strings here so events stay
/// cheap to clone and assert on.
pub fn perform(api: &dyn UserApi, req: ApiRequest) -> ApiEvent {
    match req {
        ApiRequest::RefreshList { seq } => ApiEvent::ListLoaded {
            seq,
            result: api.list_users().map_err(|e| e.to_string()),
        },
        ApiRequest::FetchUser { id } => ApiEvent::UserFetched {
            result: api.get_user(id).map_err(|e| e.to_string()),
        },
        ApiRequest::Create { draft } => ApiEvent::UserCreated {
            result: api.create_user(&draft).map_err(|e| e.to_string()),
        },
        ApiRequest::Update { id, draft } => ApiEvent::UserUpdated {
            result: api.update_user(id, &draft).map_err(|e| e.to_string()),
        },
        ApiRequest::Delete { id } => ApiEvent::UserDeleted {
            result: api.delete_user(id).map_err(|e| e.to_string()),
        },
    }
}

fn dispatch(api: &Arc<dyn UserApi>, tx: &Sender<ApiEvent>, app: &mut AppState, req: ApiRequest) {
    app.inflight += 1;
    let api = Arc::clone(api);
    let tx = tx.clone();
    std::thread::spawn(move || {
        let ev = perform(api.as_ref(), req);
        // Receiver is gone once the loop exits; nothing left to notify.
        let _ = tx.send(ev);
    });
}

/// Start a list refresh: bump the sequence token and show the loading
/// state. The returned request must be dispatched by the caller.
pub fn begin_refresh(app: &mut AppState) -> ApiRequest {
    app.list_seq += 1;
    app.list = ListView::Loading;
    ApiRequest::RefreshList { seq: app.list_seq }
}

/// Open the Edit/Delete chooser for the selected record.
pub fn open_actions(app: &mut AppState) {
    if app.selected_user().is_none() {
        return;
    }
    app.dialog = Some(Dialog::Actions { selected: 0 });
    app.input_mode = InputMode::Dialog;
}

/// Open the create form over the persistent draft.
pub fn open_create(app: &mut AppState) {
    app.dialog = Some(Dialog::CreateUser {
        field: FormField::Name,
    });
    app.input_mode = InputMode::Dialog;
}

/// Stage the selected record for deletion and show the confirmation.
/// A second open before the first resolves overwrites the staged target.
pub fn open_delete_confirm(app: &mut AppState) {
    let Some(user) = app.selected_user() else {
        return;
    };
    app.pending_delete = Some(DeleteTarget {
        id: user.id,
        name: user.name.clone(),
    });
    app.dialog = Some(Dialog::DeleteConfirm { selected: 1 });
    app.input_mode = InputMode::Dialog;
}

/// Request the edit form for the selected record. The form opens only once
/// the fetch succeeds; on failure the dialog stays closed.
pub fn open_edit(app: &mut AppState) -> Option<ApiRequest> {
    let id = app.selected_user()?.id;
    close_dialog(app);
    Some(ApiRequest::FetchUser { id })
}

/// Delete the staged target. With nothing staged this is a no-op, guarding
/// against stale or duplicate confirm triggers. State is not touched here;
/// clearing happens when the delete succeeds.
pub fn confirm_delete(app: &AppState) -> Option<ApiRequest> {
    app.pending_delete
        .as_ref()
        .map(|t| ApiRequest::Delete { id: t.id })
}

/// Close the open dialog as a cancel: the staged delete target is cleared,
/// an edit form is discarded, the create draft is kept for later.
pub fn dismiss_dialog(app: &mut AppState) {
    if matches!(app.dialog, Some(Dialog::DeleteConfirm { .. })) {
        app.pending_delete = None;
    }
    close_dialog(app);
}

fn close_dialog(app: &mut AppState) {
    app.dialog = None;
    app.dialog_area = None;
    app.input_mode = InputMode::Normal;
}

/// Key handling while a dialog is open. Returns a request to dispatch when
/// the operator submits a form or confirms a delete.
pub fn handle_dialog_key(app: &mut AppState, code: KeyCode) -> Option<ApiRequest> {
    let dialog = app.dialog.clone()?;
    match dialog {
        Dialog::Actions { selected } => match code {
            KeyCode::Esc => {
                dismiss_dialog(app);
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if selected > 0 {
                    app.dialog = Some(Dialog::Actions {
                        selected: selected - 1,
                    });
                }
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if selected < 1 {
                    app.dialog = Some(Dialog::Actions {
                        selected: selected + 1,
                    });
                }
                None
            }
            KeyCode::Enter => match selected {
                0 => open_edit(app),
                _ => {
                    open_delete_confirm(app);
                    None
                }
            },
            _ => None,
        },
        Dialog::CreateUser { field } => match code {
            KeyCode::Esc => {
                dismiss_dialog(app);
                None
            }
            KeyCode::Tab | KeyCode::Down => {
                app.dialog = Some(Dialog::CreateUser {
                    field: field.next(),
                });
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                app.dialog = Some(Dialog::CreateUser {
                    field: field.prev(),
                });
                None
            }
            KeyCode::Enter => Some(ApiRequest::Create {
                draft: app.create_form.draft(),
            }),
            KeyCode::Backspace => {
                app.create_form.field_mut(field).pop();
                None
            }
            KeyCode::Char(c) => {
                app.create_form.field_mut(field).push(c);
                None
            }
            _ => None,
        },
        Dialog::EditUser {
            id,
            mut form,
            field,
        } => match code {
            KeyCode::Esc => {
                dismiss_dialog(app);
                None
            }
            KeyCode::Tab | KeyCode::Down => {
                app.dialog = Some(Dialog::EditUser {
                    id,
                    form,
                    field: field.next(),
                });
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                app.dialog = Some(Dialog::EditUser {
                    id,
                    form,
                    field: field.prev(),
                });
                None
            }
            KeyCode::Enter => Some(ApiRequest::Update {
                id,
                draft: form.draft(),
            }),
            KeyCode::Backspace => {
                form.field_mut(field).pop();
                app.dialog = Some(Dialog::EditUser { id, form, field });
                None
            }
            KeyCode::Char(c) => {
                form.field_mut(field).push(c);
                app.dialog = Some(Dialog::EditUser { id, form, field });
                None
            }
            _ => None,
        },
        Dialog::DeleteConfirm { selected } => match code {
            KeyCode::Esc => {
                dismiss_dialog(app);
                None
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h')
            | KeyCode::Char('l') => {
                app.dialog = Some(Dialog::DeleteConfirm {
                    selected: 1 - selected,
                });
                None
            }
            KeyCode::Char('y') => confirm_delete(app),
            KeyCode::Enter => {
                if selected == 0 {
                    confirm_delete(app)
                } else {
                    dismiss_dialog(app);
                    None
                }
            }
            _ => None,
        },
    }
}

/// Apply a completed request to the state. Implements the success/failure
/// transitions of every operation; the only follow-up a caller must act on
/// is re-fetching the list after a successful mutation.
pub fn apply_api_event(app: &mut AppState, ev: ApiEvent) -> Option<FollowUp> {
    app.inflight = app.inflight.saturating_sub(1);
    match ev {
        ApiEvent::ListLoaded { seq, result } => {
            if seq != app.list_seq {
                tracing::debug!(seq, latest = app.list_seq, "discarding stale list response");
                return None;
            }
            match result {
                Ok(users) => {
                    if app.selected_index >= users.len() {
                        app.selected_index = users.len().saturating_sub(1);
                    }
                    app.list = ListView::Ready(users);
                }
                Err(msg) => {
                    tracing::warn!(%msg, "list fetch failed");
                    app.list = ListView::Failed(msg);
                    app.notify(NoticeKind::Failure, "Failed to load user list");
                }
            }
            None
        }
        ApiEvent::UserFetched { result } => {
            match result {
                Ok(user) => {
                    app.dialog = Some(Dialog::EditUser {
                        id: user.id,
                        form: UserForm::from_record(&user),
                        field: FormField::Name,
                    });
                    app.input_mode = InputMode::Dialog;
                }
                Err(msg) => {
                    tracing::warn!(%msg, "user fetch failed");
                    app.notify(NoticeKind::Failure, msg);
                }
            }
            None
        }
        ApiEvent::UserCreated { result } => match result {
            Ok(user) => {
                app.create_form.clear();
                if matches!(app.dialog, Some(Dialog::CreateUser { .. })) {
                    close_dialog(app);
                }
                app.notify(NoticeKind::Success, format!("User {} created", user.name));
                Some(FollowUp::RefreshList)
            }
            Err(msg) => {
                // Draft stays intact for correction and resubmission.
                tracing::warn!(%msg, "create failed");
                app.notify(NoticeKind::Failure, msg);
                None
            }
        },
        ApiEvent::UserUpdated { result } => match result {
            Ok(user) => {
                if matches!(app.dialog, Some(Dialog::EditUser { .. })) {
                    close_dialog(app);
                }
                app.notify(NoticeKind::Success, format!("User {} updated", user.name));
                Some(FollowUp::RefreshList)
            }
            Err(msg) => {
                // Dialog stays open with the operator's edits.
                tracing::warn!(%msg, "update failed");
                app.notify(NoticeKind::Failure, msg);
                None
            }
        },
        ApiEvent::UserDeleted { result } => match result {
            Ok(message) => {
                app.pending_delete = None;
                if matches!(app.dialog, Some(Dialog::DeleteConfirm { .. })) {
                    close_dialog(app);
                }
                let text = message.unwrap_or_else(|| "User deleted".to_string());
                app.notify(NoticeKind::Success, text);
                Some(FollowUp::RefreshList)
            }
            Err(msg) => {
                // Target and dialog stay unchanged so the operator may retry.
                tracing::warn!(%msg, "delete failed");
                app.notify(NoticeKind::Failure, msg);
                None
            }
        },
    }
}
