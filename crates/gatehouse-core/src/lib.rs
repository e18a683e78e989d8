// gatehouse-core: typed configuration and controllers for the firewall console.

pub mod actor;
pub mod command;
pub mod error;
pub mod expires;
pub mod hooks;
pub mod issuer;
pub mod model;
pub mod password;
pub mod portal;
pub mod reserved;
pub mod store;
pub mod users;
pub mod validation;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

// ── Primary re-exports ──────────────────────────────────────────────
pub use actor::Actor;
pub use command::requests::*;
pub use command::UserAction;
pub use error::CoreError;
pub use hooks::{HookCall, RecordingHooks, SystemHooks, TracingHooks};
pub use issuer::{CertificateIssuer, LocalIssuer};
pub use password::PasswordPolicy;
pub use portal::{HostnameEditor, HostnameForm, ZoneSummary};
pub use reserved::ReservedNames;
pub use store::{ChangeNote, FileRepository, MemoryRepository, Repository, SystemConfig, UserIndex};
pub use users::{DeleteReport, SavedUser, UserForm, UserManager, UserOutcome, UserSummary};
pub use validation::{FieldError, ValidationErrors};

pub use model::{
    AllowedHostname, Certificate, CertificateAuthority, Direction, EntityId, Group, Hostname,
    Scope, User, Zone,
};

/// Console themes accepted when no list is configured.
pub const DEFAULT_THEMES: &[&str] = &[
    "default.css",
    "dark.css",
    "compact.css",
    "high-contrast.css",
];

/// Operator-tunable behavior of the controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub password_policy: PasswordPolicy,
    pub reserved: ReservedNames,
    pub themes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            password_policy: PasswordPolicy::default(),
            reserved: ReservedNames::default(),
            themes: DEFAULT_THEMES.iter().map(|t| (*t).to_owned()).collect(),
        }
    }
}

/// Entry point: owns the repository and collaborators and hands out the
/// two controllers.
///
/// Every read-modify-write holds `write_lock`, so concurrent requests in
/// one process apply one after another.
pub struct Gatehouse {
    pub(crate) repository: Arc<dyn Repository>,
    pub(crate) hooks: Arc<dyn SystemHooks>,
    pub(crate) issuer: Arc<dyn CertificateIssuer>,
    pub(crate) settings: Settings,
    pub(crate) write_lock: Mutex<()>,
    index: RwLock<UserIndex>,
}

impl Gatehouse {
    /// Loads the store once to build the username index.
    pub fn new(
        repository: Arc<dyn Repository>,
        hooks: Arc<dyn SystemHooks>,
        settings: Settings,
    ) -> Result<Self, CoreError> {
        let index = UserIndex::build(&repository.load()?);
        Ok(Self {
            repository,
            hooks,
            issuer: Arc::new(LocalIssuer),
            settings,
            write_lock: Mutex::new(()),
            index: RwLock::new(index),
        })
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: Arc<dyn CertificateIssuer>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn users(&self) -> UserManager<'_> {
        UserManager::new(self)
    }

    pub fn portal(&self) -> HostnameEditor<'_> {
        HostnameEditor::new(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current contents of the store.
    pub fn snapshot(&self) -> Result<SystemConfig, CoreError> {
        self.repository.load()
    }

    /// Resolve an authenticated username. `None` for unknown, disabled or
    /// expired accounts.
    pub fn actor(&self, username: &str) -> Result<Option<Actor>, CoreError> {
        Ok(Actor::resolve(&self.repository.load()?, username))
    }

    pub fn user_id(&self, username: &str) -> Option<EntityId> {
        self.index.read().get(username)
    }

    pub(crate) fn rebuild_index(&self, config: &SystemConfig) {
        *self.index.write() = UserIndex::build(config);
    }
}

impl std::fmt::Debug for Gatehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatehouse")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
