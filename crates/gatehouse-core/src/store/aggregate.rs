// ── Persisted configuration aggregate ──

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{
    ALL_GROUP, Certificate, CertificateAuthority, EntityId, Group, Scope, User, Zone,
};
use crate::model::privilege::PAGE_ALL;

/// First uid/gid handed to operator-created accounts.
pub const FIRST_DYNAMIC_ID: u32 = 2000;
/// Changelog entries retained.
pub const CHANGELOG_LIMIT: usize = 100;

/// Message and author attached to one persisted change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNote {
    pub actor: String,
    pub message: String,
}

impl ChangeNote {
    pub fn new(actor: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub at: DateTime<Utc>,
    pub actor: String,
    pub message: String,
}

/// Everything the console persists, loaded and saved as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub next_uid: u32,
    pub next_gid: u32,
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub cas: Vec<CertificateAuthority>,
    pub certs: Vec<Certificate>,
    /// Zones keyed by lowercase name.
    pub captive_portal: BTreeMap<String, Zone>,
    pub changelog: Vec<ChangeRecord>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            next_uid: FIRST_DYNAMIC_ID,
            next_gid: FIRST_DYNAMIC_ID,
            users: Vec::new(),
            groups: Vec::new(),
            cas: Vec::new(),
            certs: Vec::new(),
            captive_portal: BTreeMap::new(),
            changelog: Vec::new(),
        }
    }
}

impl SystemConfig {
    /// Factory configuration: the `admin` system account, the `admins`
    /// group holding it and the empty `all` group.
    pub fn seeded() -> Self {
        let mut admin = User::new("admin", 0);
        admin.scope = Scope::System;
        admin.descr = "System Administrator".into();

        let mut config = Self::default();
        config.users.push(admin);
        config.groups.push(Group {
            name: ALL_GROUP.into(),
            gid: 1998,
            scope: Scope::System,
            descr: "All Users".into(),
            members: Vec::new(),
            privileges: Vec::new(),
        });
        config.groups.push(Group {
            name: "admins".into(),
            gid: 1999,
            scope: Scope::System,
            descr: "System Administrators".into(),
            members: vec![0],
            privileges: vec![PAGE_ALL.into()],
        });
        config
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn user(&self, id: EntityId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_mut(&mut self, id: EntityId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    pub fn user_by_name(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Names of the groups listing `uid` as a member.
    pub fn groups_of(&self, uid: u32) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| g.has_member(uid))
            .map(|g| g.name.clone())
            .collect()
    }

    pub fn ca(&self, refid: EntityId) -> Option<&CertificateAuthority> {
        self.cas.iter().find(|c| c.refid == refid)
    }

    pub fn cert(&self, refid: EntityId) -> Option<&Certificate> {
        self.certs.iter().find(|c| c.refid == refid)
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.captive_portal.get(name)
    }

    pub fn zone_mut(&mut self, name: &str) -> Option<&mut Zone> {
        self.captive_portal.get_mut(name)
    }

    // ── Mutation helpers ─────────────────────────────────────────────

    /// Hand out the next uid and advance the counter. Uids are never reused,
    /// so an exhausted counter is an error.
    pub fn allocate_uid(&mut self) -> Result<u32, CoreError> {
        let uid = self.next_uid;
        self.next_uid = uid
            .checked_add(1)
            .ok_or_else(|| CoreError::Internal("uid counter exhausted".into()))?;
        Ok(uid)
    }

    /// Make `uid` a member of exactly the named groups. Membership of `all`
    /// is left as it is.
    pub fn set_user_groups(&mut self, uid: u32, wanted: &[String]) {
        for group in &mut self.groups {
            if group.is_all() {
                continue;
            }
            if wanted.iter().any(|w| *w == group.name) {
                group.add_member(uid);
            } else {
                group.remove_member(uid);
            }
        }
    }

    /// Add `uid` to the `all` group.
    pub fn join_all_group(&mut self, uid: u32) {
        if let Some(all) = self.groups.iter_mut().find(|g| g.is_all()) {
            all.add_member(uid);
        }
    }

    /// Purge `uid` from every group.
    pub fn remove_from_groups(&mut self, uid: u32) {
        for group in &mut self.groups {
            group.remove_member(uid);
        }
    }

    pub(crate) fn record(&mut self, note: ChangeNote) {
        self.changelog.push(ChangeRecord {
            at: Utc::now(),
            actor: note.actor,
            message: note.message,
        });
    }

    /// Restore ordering and bounds invariants. Applied on every save.
    pub fn normalize(&mut self) {
        self.users.sort_by(|a, b| a.name.cmp(&b.name));
        for zone in self.captive_portal.values_mut() {
            zone.sort_hostnames();
        }
        for group in &mut self.groups {
            let mut seen = HashSet::new();
            group.members.retain(|m| seen.insert(*m));
        }
        if self.changelog.len() > CHANGELOG_LIMIT {
            let excess = self.changelog.len() - CHANGELOG_LIMIT;
            self.changelog.drain(..excess);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seeded_has_admin_in_admins() {
        let config = SystemConfig::seeded();
        let admin = config.user_by_name("admin").unwrap();
        assert!(admin.is_system());
        assert_eq!(config.groups_of(admin.uid), vec!["admins".to_owned()]);
        assert_eq!(config.next_uid, FIRST_DYNAMIC_ID);
    }

    #[test]
    fn normalize_sorts_users_bytewise() {
        let mut config = SystemConfig::default();
        for name in ["bob", "Zed", "alice"] {
            config.users.push(User::new(name, 0));
        }
        config.normalize();
        let names: Vec<_> = config.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "alice", "bob"]);
    }

    #[test]
    fn normalize_bounds_changelog_keeping_newest() {
        let mut config = SystemConfig::default();
        for i in 0..(CHANGELOG_LIMIT + 5) {
            config.record(ChangeNote::new("admin", format!("change {i}")));
        }
        config.normalize();
        assert_eq!(config.changelog.len(), CHANGELOG_LIMIT);
        assert_eq!(config.changelog[0].message, "change 5");
    }

    #[test]
    fn set_user_groups_leaves_all_membership_alone() {
        let mut config = SystemConfig::seeded();
        config.join_all_group(2000);
        config.set_user_groups(2000, &["admins".to_owned()]);
        assert_eq!(config.groups_of(2000), vec!["all".to_owned(), "admins".to_owned()]);
        config.set_user_groups(2000, &[]);
        assert_eq!(config.groups_of(2000), vec!["all".to_owned()]);

        config.set_user_groups(0, &["admins".to_owned(), "all".to_owned()]);
        assert_eq!(config.groups_of(0), vec!["admins".to_owned()]);
    }

    #[test]
    fn allocate_uid_advances_counter() {
        let mut config = SystemConfig::default();
        assert_eq!(config.allocate_uid().unwrap(), 2000);
        assert_eq!(config.allocate_uid().unwrap(), 2001);
        assert_eq!(config.next_uid, 2002);
    }

    #[test]
    fn allocate_uid_never_hands_out_the_same_uid_twice() {
        let mut config = SystemConfig {
            next_uid: u32::MAX - 1,
            ..SystemConfig::default()
        };
        assert_eq!(config.allocate_uid().unwrap(), u32::MAX - 1);
        assert!(matches!(config.allocate_uid(), Err(CoreError::Internal(_))));
        assert_eq!(config.next_uid, u32::MAX);
    }
}
