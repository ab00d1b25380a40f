// Unit tests for usrdir-manager
// These tests drive the controller through the public API without any
// network: state transitions are exercised by applying ApiEvents directly.

use chrono::NaiveDate;
use usrdir_manager::api::UserRecord;

fn user(id: i64, name: &str, email: &str, age: Option<i32>) -> UserRecord {
    UserRecord {
        id,
        name: name.to_string(),
        email: email.to_string(),
        age,
        created_at: NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap(),
    }
}

mod form_tests {
    use usrdir_manager::app::{FormField, UserForm};

    #[test]
    fn draft_trims_text_and_parses_age() {
        let form = UserForm {
            name: "  Alice ".into(),
            email: " alice@example.com ".into(),
            age: " 30 ".into(),
        };
        let draft = form.draft();
        assert_eq!(draft.name, "Alice");
        assert_eq!(draft.email, "alice@example.com");
        assert_eq!(draft.age, Some(30));
    }

    #[test]
    fn blank_or_unparsable_age_is_absent() {
        let mut form = UserForm {
            name: "Alice".into(),
            email: "a@example.com".into(),
            age: "".into(),
        };
        assert_eq!(form.draft().age, None);
        form.age = "abc".into();
        assert_eq!(form.draft().age, None);
    }

    #[test]
    fn from_record_renders_absent_age_as_empty_field() {
        let u = super::user(4, "Carol", "c@example.com", None);
        let form = UserForm::from_record(&u);
        assert_eq!(form.name, "Carol");
        assert_eq!(form.age, "");

        let u = super::user(5, "Dan", "d@example.com", Some(41));
        assert_eq!(UserForm::from_record(&u).age, "41");
    }

    #[test]
    fn field_focus_cycles() {
        assert_eq!(FormField::Name.next(), FormField::Email);
        assert_eq!(FormField::Age.next(), FormField::Name);
        assert_eq!(FormField::Name.prev(), FormField::Age);
    }
}

mod list_tests {
    use usrdir_manager::app::update::{apply_api_event, begin_refresh};
    use usrdir_manager::app::{ApiEvent, ApiRequest, AppState, ListView, NoticeKind};

    #[test]
    fn successful_fetch_replaces_list_with_all_records() {
        let mut app = AppState::new("http://api");
        let req = begin_refresh(&mut app);
        assert!(matches!(req, ApiRequest::RefreshList { seq: 1 }));
        assert_eq!(app.list, ListView::Loading);

        let users = vec![
            super::user(1, "Alice", "a@example.com", Some(30)),
            super::user(2, "Bob", "b@example.com", None),
            super::user(3, "Carol", "c@example.com", Some(28)),
        ];
        let follow = apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Ok(users.clone()),
            },
        );
        assert_eq!(follow, None);
        assert_eq!(app.users().len(), 3);
        assert_eq!(app.users(), &users[..]);
    }

    #[test]
    fn empty_fetch_is_ready_not_an_error() {
        let mut app = AppState::new("http://api");
        begin_refresh(&mut app);
        apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Ok(vec![]),
            },
        );
        assert_eq!(app.list, ListView::Ready(vec![]));
        assert!(app.notification.is_none());
    }

    #[test]
    fn failed_fetch_shows_error_state_and_one_failure_toast() {
        let mut app = AppState::new("http://api");
        begin_refresh(&mut app);
        apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Err("GET http://api/users: connection refused".into()),
            },
        );
        assert!(matches!(app.list, ListView::Failed(_)));
        let toast = app.notification.as_ref().expect("failure toast");
        assert_eq!(toast.kind, NoticeKind::Failure);
    }

    #[test]
    fn stale_list_response_is_discarded() {
        let mut app = AppState::new("http://api");
        begin_refresh(&mut app); // seq 1
        begin_refresh(&mut app); // seq 2, the latest issued

        // The older response resolves last but must not win.
        apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 2,
                result: Ok(vec![super::user(1, "Alice", "a@example.com", None)]),
            },
        );
        apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Ok(vec![]),
            },
        );
        assert_eq!(app.users().len(), 1);
    }

    #[test]
    fn selection_is_clamped_when_list_shrinks() {
        let mut app = AppState::new("http://api");
        begin_refresh(&mut app);
        app.selected_index = 5;
        apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Ok(vec![super::user(1, "Alice", "a@example.com", None)]),
            },
        );
        assert_eq!(app.selected_index, 0);
    }
}

mod create_tests {
    use usrdir_manager::app::update::{apply_api_event, handle_dialog_key, open_create};
    use usrdir_manager::app::{ApiEvent, ApiRequest, AppState, FollowUp, NoticeKind};

    #[test]
    fn typing_fills_the_persistent_draft() {
        let mut app = AppState::new("http://api");
        open_create(&mut app);
        for c in "Alice".chars() {
            handle_dialog_key(&mut app, crossterm::event::KeyCode::Char(c));
        }
        assert_eq!(app.create_form.name, "Alice");
    }

    #[test]
    fn submit_builds_request_from_draft() {
        let mut app = AppState::new("http://api");
        app.create_form.name = "Alice".into();
        app.create_form.email = "alice@example.com".into();
        open_create(&mut app);
        let req = handle_dialog_key(&mut app, crossterm::event::KeyCode::Enter)
            .expect("create request");
        match req {
            ApiRequest::Create { draft } => {
                assert_eq!(draft.name, "Alice");
                assert_eq!(draft.age, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn success_clears_form_and_triggers_refresh_naming_the_record() {
        let mut app = AppState::new("http://api");
        app.create_form.name = "Alice".into();
        app.create_form.email = "alice@example.com".into();
        open_create(&mut app);

        let follow = apply_api_event(
            &mut app,
            ApiEvent::UserCreated {
                result: Ok(super::user(9, "Alice", "alice@example.com", None)),
            },
        );
        assert_eq!(follow, Some(FollowUp::RefreshList));
        assert_eq!(app.create_form.name, "");
        assert_eq!(app.create_form.email, "");
        assert!(app.dialog.is_none());
        let toast = app.notification.as_ref().expect("success toast");
        assert_eq!(toast.kind, NoticeKind::Success);
        assert!(toast.text.contains("Alice"), "got: {}", toast.text);
    }

    #[test]
    fn failure_keeps_operator_input_and_shows_server_detail() {
        let mut app = AppState::new("http://api");
        app.create_form.name = "Alice".into();
        app.create_form.email = "not-an-email".into();
        open_create(&mut app);

        let follow = apply_api_event(
            &mut app,
            ApiEvent::UserCreated {
                result: Err("邮箱格式不正确".into()),
            },
        );
        assert_eq!(follow, None);
        assert_eq!(app.create_form.email, "not-an-email");
        assert!(app.dialog.is_some());
        let toast = app.notification.as_ref().expect("failure toast");
        assert_eq!(toast.kind, NoticeKind::Failure);
        assert_eq!(toast.text, "邮箱格式不正确");
    }
}

mod edit_tests {
    use crossterm::event::KeyCode;
    use usrdir_manager::app::update::{apply_api_event, handle_dialog_key};
    use usrdir_manager::app::{ApiEvent, ApiRequest, AppState, Dialog, FollowUp, InputMode};

    #[test]
    fn fetched_record_opens_prefilled_dialog() {
        let mut app = AppState::new("http://api");
        apply_api_event(
            &mut app,
            ApiEvent::UserFetched {
                result: Ok(super::user(7, "Bob", "bob@example.com", None)),
            },
        );
        match &app.dialog {
            Some(Dialog::EditUser { id, form, .. }) => {
                assert_eq!(*id, 7);
                assert_eq!(form.name, "Bob");
                assert_eq!(form.age, "");
            }
            other => panic!("unexpected dialog: {other:?}"),
        }
        assert_eq!(app.input_mode, InputMode::Dialog);
    }

    #[test]
    fn fetch_failure_leaves_dialog_closed() {
        let mut app = AppState::new("http://api");
        apply_api_event(
            &mut app,
            ApiEvent::UserFetched {
                result: Err("get user failed: HTTP 404".into()),
            },
        );
        assert!(app.dialog.is_none());
        assert!(app.notification.is_some());
    }

    #[test]
    fn submit_carries_record_id_and_edits() {
        let mut app = AppState::new("http://api");
        apply_api_event(
            &mut app,
            ApiEvent::UserFetched {
                result: Ok(super::user(7, "Bob", "bob@example.com", Some(20))),
            },
        );
        // Append to the focused Name field, then submit.
        handle_dialog_key(&mut app, KeyCode::Char('!'));
        let req = handle_dialog_key(&mut app, KeyCode::Enter).expect("update request");
        match req {
            ApiRequest::Update { id, draft } => {
                assert_eq!(id, 7);
                assert_eq!(draft.name, "Bob!");
                assert_eq!(draft.age, Some(20));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn update_failure_keeps_dialog_open_with_submitted_values() {
        let mut app = AppState::new("http://api");
        apply_api_event(
            &mut app,
            ApiEvent::UserFetched {
                result: Ok(super::user(7, "Bob", "bob@example.com", None)),
            },
        );
        handle_dialog_key(&mut app, KeyCode::Char('x'));
        apply_api_event(
            &mut app,
            ApiEvent::UserUpdated {
                result: Err("该邮箱已被使用".into()),
            },
        );
        match &app.dialog {
            Some(Dialog::EditUser { form, .. }) => assert_eq!(form.name, "Bobx"),
            other => panic!("unexpected dialog: {other:?}"),
        }
    }

    #[test]
    fn update_success_closes_dialog_and_refreshes() {
        let mut app = AppState::new("http://api");
        apply_api_event(
            &mut app,
            ApiEvent::UserFetched {
                result: Ok(super::user(7, "Bob", "bob@example.com", None)),
            },
        );
        let follow = apply_api_event(
            &mut app,
            ApiEvent::UserUpdated {
                result: Ok(super::user(7, "Bob", "bob@new.example.com", None)),
            },
        );
        assert_eq!(follow, Some(FollowUp::RefreshList));
        assert!(app.dialog.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn esc_discards_the_edit_form() {
        let mut app = AppState::new("http://api");
        apply_api_event(
            &mut app,
            ApiEvent::UserFetched {
                result: Ok(super::user(7, "Bob", "bob@example.com", None)),
            },
        );
        handle_dialog_key(&mut app, KeyCode::Esc);
        assert!(app.dialog.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
    }
}

mod delete_tests {
    use usrdir_manager::app::update::{
        apply_api_event, begin_refresh, confirm_delete, dismiss_dialog, open_delete_confirm,
    };
    use usrdir_manager::app::{
        ApiEvent, ApiRequest, AppState, Dialog, FollowUp, NoticeKind,
    };

    fn app_with_bob() -> AppState {
        let mut app = AppState::new("http://api");
        begin_refresh(&mut app);
        apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Ok(vec![super::user(7, "Bob", "bob@example.com", None)]),
            },
        );
        app
    }

    #[test]
    fn confirm_without_pending_target_is_a_no_op() {
        let app = AppState::new("http://api");
        assert_eq!(confirm_delete(&app), None);
    }

    #[test]
    fn open_then_confirm_targets_exactly_the_staged_id() {
        let mut app = app_with_bob();
        open_delete_confirm(&mut app);
        let target = app.pending_delete.as_ref().expect("staged target");
        assert_eq!(target.id, 7);
        assert_eq!(target.name, "Bob");
        assert!(matches!(app.dialog, Some(Dialog::DeleteConfirm { .. })));

        assert_eq!(confirm_delete(&app), Some(ApiRequest::Delete { id: 7 }));
    }

    #[test]
    fn success_clears_target_closes_dialog_and_refreshes() {
        let mut app = app_with_bob();
        open_delete_confirm(&mut app);
        let follow = apply_api_event(
            &mut app,
            ApiEvent::UserDeleted {
                result: Ok(Some("用户删除成功".into())),
            },
        );
        assert_eq!(follow, Some(FollowUp::RefreshList));
        assert!(app.pending_delete.is_none());
        assert!(app.dialog.is_none());
        let toast = app.notification.as_ref().expect("toast");
        assert_eq!(toast.kind, NoticeKind::Success);
        assert_eq!(toast.text, "用户删除成功");
    }

    #[test]
    fn success_without_server_message_uses_generic_text() {
        let mut app = app_with_bob();
        open_delete_confirm(&mut app);
        apply_api_event(&mut app, ApiEvent::UserDeleted { result: Ok(None) });
        assert_eq!(app.notification.as_ref().unwrap().text, "User deleted");
    }

    #[test]
    fn failure_leaves_target_and_dialog_for_retry() {
        let mut app = app_with_bob();
        open_delete_confirm(&mut app);
        let follow = apply_api_event(
            &mut app,
            ApiEvent::UserDeleted {
                result: Err("delete user failed: HTTP 500".into()),
            },
        );
        assert_eq!(follow, None);
        assert!(app.pending_delete.is_some());
        assert!(matches!(app.dialog, Some(Dialog::DeleteConfirm { .. })));
        assert_eq!(
            app.notification.as_ref().unwrap().kind,
            NoticeKind::Failure
        );
    }

    #[test]
    fn dismiss_clears_the_staged_target() {
        let mut app = app_with_bob();
        open_delete_confirm(&mut app);
        dismiss_dialog(&mut app);
        // Dialog visible iff a target is staged.
        assert!(app.pending_delete.is_none());
        assert!(app.dialog.is_none());
        assert_eq!(confirm_delete(&app), None);
    }

    #[test]
    fn reopening_overwrites_the_staged_target() {
        let mut app = AppState::new("http://api");
        begin_refresh(&mut app);
        apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Ok(vec![
                    super::user(7, "Bob", "bob@example.com", None),
                    super::user(8, "Eve", "eve@example.com", None),
                ]),
            },
        );
        open_delete_confirm(&mut app);
        app.selected_index = 1;
        open_delete_confirm(&mut app);
        assert_eq!(app.pending_delete.as_ref().unwrap().id, 8);
    }
}

mod notification_tests {
    use usrdir_manager::app::{AppState, NOTIFICATION_TTL, NoticeKind};

    #[test]
    fn new_toast_preempts_the_previous_one() {
        let mut app = AppState::new("http://api");
        app.notify(NoticeKind::Success, "first");
        app.notify(NoticeKind::Failure, "second");
        let n = app.notification.as_ref().unwrap();
        assert_eq!(n.text, "second");
        assert_eq!(n.kind, NoticeKind::Failure);
    }

    #[test]
    fn toast_expires_after_its_display_time() {
        let mut app = AppState::new("http://api");
        app.notify(NoticeKind::Success, "hello");
        // Backdate past the TTL instead of sleeping.
        app.notification.as_mut().unwrap().shown_at =
            std::time::Instant::now() - NOTIFICATION_TTL;
        app.prune_notification();
        assert!(app.notification.is_none());
    }
}

mod perform_tests {
    use std::sync::Mutex;
    use usrdir_manager::api::{UserApi, UserDraft, UserRecord};
    use usrdir_manager::app::update::perform;
    use usrdir_manager::app::{ApiEvent, ApiRequest};
    use usrdir_manager::error::{Result, simple_error};

    /// Records every call so tests can assert on exact request traffic.
    #[derive(Default)]
    struct RecordingApi {
        deletes: Mutex<Vec<i64>>,
    }

    impl UserApi for RecordingApi {
        fn list_users(&self) -> Result<Vec<UserRecord>> {
            Ok(vec![])
        }
        fn get_user(&self, _id: i64) -> Result<UserRecord> {
            Err(simple_error("not found"))
        }
        fn create_user(&self, draft: &UserDraft) -> Result<UserRecord> {
            Err(simple_error(format!("rejected {}", draft.name)))
        }
        fn update_user(&self, _id: i64, _draft: &UserDraft) -> Result<UserRecord> {
            Err(simple_error("rejected"))
        }
        fn delete_user(&self, id: i64) -> Result<Option<String>> {
            self.deletes.lock().unwrap().push(id);
            Ok(None)
        }
    }

    #[test]
    fn delete_request_issues_exactly_one_call_for_the_target() {
        let api = RecordingApi::default();
        let ev = perform(&api, ApiRequest::Delete { id: 7 });
        assert!(matches!(ev, ApiEvent::UserDeleted { result: Ok(None) }));
        assert_eq!(*api.deletes.lock().unwrap(), vec![7]);
    }

    #[test]
    fn errors_are_flattened_to_display_strings() {
        let api = RecordingApi::default();
        let ev = perform(
            &api,
            ApiRequest::Create {
                draft: UserDraft {
                    name: "Alice".into(),
                    email: "a@example.com".into(),
                    age: None,
                },
            },
        );
        match ev {
            ApiEvent::UserCreated { result } => {
                assert_eq!(result.unwrap_err(), "rejected Alice");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

mod render_tests {
    use ratatui::{Terminal, backend::TestBackend};
    use usrdir_manager::app::update::{apply_api_event, begin_refresh, open_delete_confirm};
    use usrdir_manager::app::{ApiEvent, AppState, NoticeKind};
    use usrdir_manager::ui::render;

    #[test]
    fn render_smoke_loading_state() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).expect("create terminal");
        let mut app = AppState::new("http://127.0.0.1:8000");
        terminal
            .draw(|f| {
                render(f, &mut app);
            })
            .expect("render frame");
    }

    #[test]
    fn render_smoke_ready_failed_and_dialog() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).expect("create terminal");
        let mut app = AppState::new("http://127.0.0.1:8000");
        begin_refresh(&mut app);
        apply_api_event(
            &mut app,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Ok(vec![super::user(1, "Alice", "a@example.com", Some(30))]),
            },
        );
        app.notify(NoticeKind::Success, "User Alice created");
        open_delete_confirm(&mut app);
        terminal
            .draw(|f| {
                render(f, &mut app);
            })
            .expect("render frame");
        // Render records where the dialog is, for outside-click dismissal.
        assert!(app.dialog_area.is_some());

        let mut failed = AppState::new("http://127.0.0.1:8000");
        begin_refresh(&mut failed);
        apply_api_event(
            &mut failed,
            ApiEvent::ListLoaded {
                seq: 1,
                result: Err("boom".into()),
            },
        );
        terminal
            .draw(|f| {
                render(f, &mut failed);
            })
            .expect("render failed state");
    }
}
