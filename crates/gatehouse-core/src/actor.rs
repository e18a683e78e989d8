// ── Acting operator ──

use std::collections::BTreeSet;

use chrono::Local;

use crate::error::CoreError;
use crate::model::privilege::{self, PAGE_ALL, READ_ONLY};
use crate::store::SystemConfig;

/// The authenticated operator behind a request, with effective privileges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    privileges: BTreeSet<String>,
}

impl Actor {
    pub fn new<I, S>(username: impl Into<String>, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.into(),
            privileges: privileges.into_iter().map(Into::into).collect(),
        }
    }

    /// Look up `username` in the stored accounts.
    ///
    /// Disabled and expired accounts do not resolve.
    pub fn resolve(config: &SystemConfig, username: &str) -> Option<Self> {
        let user = config.user_by_name(username)?;
        if user.disabled {
            return None;
        }
        if user
            .expires
            .is_some_and(|day| day < Local::now().date_naive())
        {
            return None;
        }
        let privileges = privilege::effective_privileges(user, &config.groups)
            .into_iter()
            .map(|p| p.name);
        Some(Self::new(username, privileges))
    }

    pub fn has_privilege(&self, name: &str) -> bool {
        self.privileges.contains(name)
    }

    pub fn privileges(&self) -> impl Iterator<Item = &str> {
        self.privileges.iter().map(String::as_str)
    }

    pub fn is_admin(&self) -> bool {
        self.has_privilege(PAGE_ALL)
    }

    /// Holds the deny-write privilege without admin-equivalent access.
    pub fn is_read_only(&self) -> bool {
        self.has_privilege(READ_ONLY) && !self.is_admin()
    }

    pub fn ensure_writable(&self) -> Result<(), CoreError> {
        if self.is_read_only() {
            Err(CoreError::ReadOnly)
        } else {
            Ok(())
        }
    }
}
