// ── User manager actions ──
//
// Every request to the user manager is one `UserAction`. Front ends parse
// their input into an action and `UserManager::dispatch` routes it.

pub mod requests;

use crate::model::EntityId;

pub use requests::{CertRequest, PreferenceFields, SaveHostnameRequest, SaveUserRequest};

#[derive(Debug, Clone)]
pub enum UserAction {
    List,
    New,
    Edit {
        id: EntityId,
    },
    Save {
        /// `None` creates a new account.
        id: Option<EntityId>,
        request: Box<SaveUserRequest>,
    },
    /// Delete one user; `username` must match the stored name.
    Delete {
        id: EntityId,
        username: String,
    },
    DeleteMany {
        ids: Vec<EntityId>,
    },
    DeleteCertificate {
        id: EntityId,
        cert: EntityId,
    },
    DeletePrivilege {
        id: EntityId,
        privilege: String,
    },
}

impl UserAction {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::List | Self::New | Self::Edit { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::New => "new",
            Self::Edit { .. } => "edit",
            Self::Save { .. } => "save",
            Self::Delete { .. } => "deluser",
            Self::DeleteMany { .. } => "dellall",
            Self::DeleteCertificate { .. } => "delcert",
            Self::DeletePrivilege { .. } => "delprivid",
        }
    }
}
