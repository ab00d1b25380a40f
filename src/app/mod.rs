//! Application state types and entry glue.
//!
//! Defines the controller state for the TUI, the request/event types that
//! decouple state transitions from network I/O, and the run loop re-export.

pub mod update;

use ratatui::layout::Rect;
use ratatui::style::Color;
use std::time::{Duration, Instant};

use crate::api::{UserDraft, UserRecord};

/// How long a toast stays visible. A new toast restarts the clock.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Dialog,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub success_bg: Color,
    pub failure_bg: Color,
}

impl Theme {
    /// Plain dark theme.
    #[allow(dead_code)]
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            success_bg: Color::Green,
            failure_bg: Color::Red,
        }
    }

    /// Catppuccin Mocha defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            title: Color::Rgb(0xcb, 0xa6, 0xf7),
            border: Color::Rgb(0x58, 0x5b, 0x70),
            header_bg: Color::Rgb(0x31, 0x32, 0x44),
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf),
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a),
            success_bg: Color::Rgb(0xa6, 0xe3, 0xa1),
            failure_bg: Color::Rgb(0xf3, 0x8b, 0xa8),
        }
    }
}

/// Which field of a user form has focus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Age,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Email,
            Self::Email => Self::Age,
            Self::Age => Self::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Name => Self::Age,
            Self::Email => Self::Name,
            Self::Age => Self::Email,
        }
    }
}

/// Editable name/email/age fields. `age` stays a raw string until submit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub age: String,
}

impl UserForm {
    /// Pre-fill from a fetched record; absent age becomes an empty field.
    pub fn from_record(u: &UserRecord) -> Self {
        Self {
            name: u.name.clone(),
            email: u.email.clone(),
            age: u.age.map(|a| a.to_string()).unwrap_or_default(),
        }
    }

    /// Build the wire payload: text fields trimmed, blank or unparsable
    /// age treated as absent. The server is authoritative on correctness.
    pub fn draft(&self) -> UserDraft {
        let age = self.age.trim();
        UserDraft {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            age: if age.is_empty() {
                None
            } else {
                age.parse::<i32>().ok()
            },
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::Email => &mut self.email,
            FormField::Age => &mut self.age,
        }
    }
}

/// Modal dialog states. The delete target itself lives in
/// `AppState::pending_delete`; `DeleteConfirm` is visible iff that is set.
#[derive(Clone, Debug, PartialEq)]
pub enum Dialog {
    /// Edit/Delete chooser for the selected record.
    Actions { selected: usize },
    /// Create form; edits the persistent draft in `AppState::create_form`.
    CreateUser { field: FormField },
    /// Edit form carrying the record id it replaces.
    EditUser {
        id: i64,
        form: UserForm,
        field: FormField,
    },
    /// Yes/No confirmation before an irreversible delete.
    DeleteConfirm { selected: usize },
}

/// Record staged for deletion while the confirm dialog is open.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteTarget {
    pub id: i64,
    pub name: String,
}

/// The rendered list: a disposable snapshot of the last fetch. `Ready` with
/// zero records renders the empty state, distinct from `Loading`.
#[derive(Clone, Debug, PartialEq)]
pub enum ListView {
    Loading,
    Ready(Vec<UserRecord>),
    Failed(String),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// One transient toast; a new one preempts the remaining display time.
#[derive(Clone, Debug)]
pub struct Notification {
    pub kind: NoticeKind,
    pub text: String,
    pub shown_at: Instant,
}

/// Work handed to a request thread.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiRequest {
    RefreshList { seq: u64 },
    FetchUser { id: i64 },
    Create { draft: UserDraft },
    Update { id: i64, draft: UserDraft },
    Delete { id: i64 },
}

/// Completion of a request thread, applied back on the UI thread.
/// Errors arrive pre-formatted for display.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiEvent {
    ListLoaded {
        seq: u64,
        result: Result<Vec<UserRecord>, String>,
    },
    UserFetched {
        result: Result<UserRecord, String>,
    },
    UserCreated {
        result: Result<UserRecord, String>,
    },
    UserUpdated {
        result: Result<UserRecord, String>,
    },
    UserDeleted {
        result: Result<Option<String>, String>,
    },
}

/// Action the loop must take after applying an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FollowUp {
    RefreshList,
}

pub struct AppState {
    pub started_at: Instant,
    pub list: ListView,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub theme: Theme,
    pub dialog: Option<Dialog>,
    /// Create draft persists across dialog dismissal and submit failure,
    /// so the operator never retypes after a rejected create.
    pub create_form: UserForm,
    pub pending_delete: Option<DeleteTarget>,
    pub notification: Option<Notification>,
    /// Monotonic refresh token; list responses from older refreshes are
    /// discarded so the latest issued request always wins.
    pub list_seq: u64,
    pub inflight: usize,
    /// Rectangle of the open dialog, recorded at render time so mouse
    /// clicks outside it can dismiss.
    pub dialog_area: Option<Rect>,
    pub api_url: String,
}

impl AppState {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            started_at: Instant::now(),
            list: ListView::Loading,
            selected_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            theme: Theme::mocha(),
            dialog: None,
            create_form: UserForm::default(),
            pending_delete: None,
            notification: None,
            list_seq: 0,
            inflight: 0,
            dialog_area: None,
            api_url: api_url.into(),
        }
    }

    pub fn users(&self) -> &[UserRecord] {
        match &self.list {
            ListView::Ready(users) => users,
            _ => &[],
        }
    }

    pub fn selected_user(&self) -> Option<&UserRecord> {
        self.users().get(self.selected_index)
    }

    /// Show a toast, preempting whatever is currently displayed.
    pub fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notification = Some(Notification {
            kind,
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    /// Drop the toast once its display time has elapsed.
    pub fn prune_notification(&mut self) {
        if let Some(n) = &self.notification
            && n.shown_at.elapsed() >= NOTIFICATION_TTL
        {
            self.notification = None;
        }
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
