// ── Privilege catalog ──

use serde::Serialize;

use super::group::Group;
use super::user::User;

/// Holder may view but not change configuration.
pub const READ_ONLY: &str = "user-config-readonly";
/// Unrestricted console access.
pub const PAGE_ALL: &str = "page-all";

/// A known privilege and its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Privilege {
    pub name: &'static str,
    pub descr: &'static str,
    /// Grants administrator-equivalent access.
    pub admin: bool,
}

pub const CATALOG: &[Privilege] = &[
    Privilege {
        name: PAGE_ALL,
        descr: "WebCfg - All pages",
        admin: true,
    },
    Privilege {
        name: "page-dashboard-all",
        descr: "WebCfg - Dashboard (all)",
        admin: false,
    },
    Privilege {
        name: "page-system-usermanager",
        descr: "WebCfg - System: User Manager",
        admin: true,
    },
    Privilege {
        name: "page-services-captiveportal-editallowedhostnames",
        descr: "WebCfg - Services: Captive Portal: Edit Allowed Hostnames",
        admin: false,
    },
    Privilege {
        name: READ_ONLY,
        descr: "User - Config: Deny Config Write",
        admin: false,
    },
    Privilege {
        name: "user-shell-access",
        descr: "User - System: Shell account access",
        admin: true,
    },
    Privilege {
        name: "user-ssh-tunnel",
        descr: "User - System: SSH tunneling",
        admin: false,
    },
    Privilege {
        name: "user-copy-files",
        descr: "User - System: Copy files (scp)",
        admin: true,
    },
    Privilege {
        name: "user-ipsec-xauth-dialin",
        descr: "User - VPN: IPsec xauth Dialin",
        admin: false,
    },
];

/// Look up a privilege by name.
pub fn lookup(name: &str) -> Option<&'static Privilege> {
    CATALOG.iter().find(|p| p.name == name)
}

/// Human-readable description, falling back to the raw name.
pub fn describe(name: &str) -> String {
    lookup(name).map_or_else(|| name.to_owned(), |p| p.descr.to_owned())
}

/// A privilege as it applies to one user, direct or inherited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectivePrivilege {
    pub name: String,
    pub descr: String,
    /// Group the privilege is inherited from; `None` for direct grants.
    pub group: Option<String>,
    pub admin: bool,
}

/// Direct privileges first, then privileges inherited through group membership.
pub fn effective_privileges(user: &User, groups: &[Group]) -> Vec<EffectivePrivilege> {
    let direct = user.privileges.iter().map(|name| (name, None));
    let inherited = groups
        .iter()
        .filter(|g| g.has_member(user.uid))
        .flat_map(|g| g.privileges.iter().map(move |name| (name, Some(g.name.clone()))));

    direct
        .chain(inherited)
        .map(|(name, group)| EffectivePrivilege {
            name: name.clone(),
            descr: describe(name),
            group,
            admin: lookup(name).is_some_and(|p| p.admin),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::Scope;

    #[test]
    fn inherited_privileges_follow_direct_ones() {
        let mut user = User::new("alice", 2001);
        user.privileges.push("user-ssh-tunnel".into());
        let groups = vec![Group {
            name: "admins".into(),
            gid: 1999,
            scope: Scope::System,
            descr: String::new(),
            members: vec![2001],
            privileges: vec![PAGE_ALL.into()],
        }];

        let privs = effective_privileges(&user, &groups);
        assert_eq!(privs.len(), 2);
        assert_eq!(privs[0].group, None);
        assert_eq!(privs[1].group.as_deref(), Some("admins"));
        assert!(privs[1].admin);
    }

    #[test]
    fn unknown_privilege_describes_as_its_name() {
        assert_eq!(describe("custom-thing"), "custom-thing");
    }
}
