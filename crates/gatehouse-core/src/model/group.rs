// ── Local group ──

use serde::{Deserialize, Serialize};

use super::user::Scope;

/// Name of the distinguished group every operator-managed user joins.
pub const ALL_GROUP: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub gid: u32,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub descr: String,
    /// Member uids.
    #[serde(default)]
    pub members: Vec<u32>,
    #[serde(default)]
    pub privileges: Vec<String>,
}

impl Group {
    pub fn has_member(&self, uid: u32) -> bool {
        self.members.contains(&uid)
    }

    pub fn add_member(&mut self, uid: u32) {
        if !self.has_member(uid) {
            self.members.push(uid);
        }
    }

    pub fn remove_member(&mut self, uid: u32) {
        self.members.retain(|m| *m != uid);
    }

    pub fn is_all(&self) -> bool {
        self.name == ALL_GROUP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Group {
        Group {
            name: "admins".into(),
            gid: 1999,
            scope: Scope::System,
            descr: String::new(),
            members: vec![0],
            privileges: vec!["page-all".into()],
        }
    }

    #[test]
    fn add_member_is_idempotent() {
        let mut g = group();
        g.add_member(2000);
        g.add_member(2000);
        assert_eq!(g.members, vec![0, 2000]);
    }

    #[test]
    fn remove_member_drops_uid() {
        let mut g = group();
        g.remove_member(0);
        assert!(!g.has_member(0));
    }
}
