use digests::core::digest::{DigestId, DigestRecord};
use digests::core::form::{Field, SaveKind};
use digests::error::MutationError;

/// Which form a field message is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    /// The "New contact" drawer.
    Create,
    /// The inline editor of one row.
    Edit(DigestId),
}

impl FormTarget {
    pub fn save_kind(self) -> SaveKind {
        match self {
            FormTarget::Create => SaveKind::Created,
            FormTarget::Edit(_) => SaveKind::Updated,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    // Navigation
    OpenSettings,

    // Collection
    Refresh,
    CollectionLoaded(Result<Vec<DigestRecord>, MutationError>),

    // Create drawer
    OpenCreateForm,
    CloseCreateForm,

    // Form fields, for either the drawer or a row editor
    FormText(FormTarget, Field, String),
    FormTimezone(FormTarget, usize),
    FormEnabled(FormTarget, bool),
    FormSubmit(FormTarget),
    FormSaved(FormTarget, Result<DigestRecord, MutationError>),
    CancelEdit(DigestId),

    // Rows
    ToggleMenu(DigestId),
    EditContact(DigestId),
    DeleteContact(DigestId),
    ContactRemoved(DigestId, Result<(), MutationError>),

    // Notice banner
    DismissNotice,

    // Settings
    SetApiUrl(String),
    ApiTokenInput(String),
    SaveApiToken,
    ApiTokenSaved(Result<(), String>),
    Connect,
    TokenLoaded(Result<Option<String>, String>),
    SetDefaultTimezone(usize),
    SetPhoneMask(String),
    ToggleDebugLogging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Contacts,
    Settings,
}

impl Page {
    pub fn title(&self) -> String {
        match self {
            Self::Contacts => crate::fl!("page-contacts"),
            Self::Settings => crate::fl!("page-settings"),
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Contacts => "system-users-symbolic",
            Self::Settings => "emblem-system-symbolic",
        }
    }

    pub const ALL: &'static [Page] = &[Page::Contacts, Page::Settings];
}
