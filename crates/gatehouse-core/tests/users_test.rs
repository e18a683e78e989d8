#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use gatehouse_core::model::privilege::READ_ONLY;
use gatehouse_core::{
    Actor, CertificateAuthority, CoreError, EntityId, FileRepository, Gatehouse, HookCall,
    MemoryRepository, PasswordPolicy, RecordingHooks, Repository, SaveUserRequest, Scope, Settings,
    SystemConfig, User, UserAction, UserOutcome,
};
use pretty_assertions::assert_eq;
use secrecy::SecretString;

struct Fixture {
    gate: Gatehouse,
    repo: Arc<MemoryRepository>,
    hooks: Arc<RecordingHooks>,
}

fn settings() -> Settings {
    Settings {
        password_policy: PasswordPolicy {
            bcrypt_cost: 4,
            ..PasswordPolicy::default()
        },
        ..Settings::default()
    }
}

fn fixture_with(config: SystemConfig) -> Fixture {
    let repo = Arc::new(MemoryRepository::new(config));
    let hooks = Arc::new(RecordingHooks::new());
    let gate = Gatehouse::new(repo.clone(), hooks.clone(), settings()).unwrap();
    Fixture { gate, repo, hooks }
}

fn fixture() -> Fixture {
    fixture_with(SystemConfig::seeded())
}

fn admin() -> Actor {
    Actor::new("admin", ["page-all"])
}

fn seed_users(config: &mut SystemConfig, names: &[&str]) -> Vec<EntityId> {
    names
        .iter()
        .map(|name| {
            let uid = config.allocate_uid().unwrap();
            let user = User::new(*name, uid);
            let id = user.id;
            config.users.push(user);
            config.join_all_group(uid);
            id
        })
        .collect()
}

#[test]
fn create_assigns_counter_uid_and_joins_all() {
    let fx = fixture();
    let before = fx.repo.snapshot().next_uid;

    let request = SaveUserRequest::new_user("admin.user", "Secret123!");
    let saved = fx.gate.users().save(&admin(), None, &request).unwrap();

    assert!(saved.created);
    assert_eq!(saved.user.uid, before);
    assert_eq!(saved.message, "Successfully created user admin.user");

    let config = fx.repo.snapshot();
    assert_eq!(config.next_uid, before + 1);
    assert!(config.group("all").unwrap().has_member(before));
    let stored = config.user_by_name("admin.user").unwrap();
    assert!(stored.password_hash.as_deref().unwrap().starts_with("$2"));
    assert_eq!(fx.gate.user_id("admin.user"), Some(stored.id));
}

#[test]
fn create_runs_hooks_in_order() {
    let fx = fixture();
    fx.gate
        .users()
        .save(&admin(), None, &SaveUserRequest::new_user("carol", "Secret123!"))
        .unwrap();
    assert_eq!(
        fx.hooks.calls(),
        vec![
            HookCall::ProvisionAccount("carol".into()),
            HookCall::RunPrivilegeHooks,
        ]
    );
}

#[test]
fn users_stay_sorted_after_save() {
    let fx = fixture();
    for name in ["zoe", "bob", "mallory"] {
        fx.gate
            .users()
            .save(&admin(), None, &SaveUserRequest::new_user(name, "Secret123!"))
            .unwrap();
    }
    let names: Vec<_> = fx
        .repo
        .snapshot()
        .users
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["admin", "bob", "mallory", "zoe"]);
}

#[test]
fn edit_without_checkbox_clears_it() {
    let fx = fixture();
    let mut request = SaveUserRequest::new_user("carol", "Secret123!");
    request.prefs.interfaces_sort = true;
    request.disabled = true;
    let saved = fx.gate.users().save(&admin(), None, &request).unwrap();
    assert!(fx.repo.snapshot().user(saved.user.id).unwrap().prefs.interfaces_sort);

    let edit = SaveUserRequest {
        username: Some("carol".into()),
        ..SaveUserRequest::default()
    };
    let edited = fx
        .gate
        .users()
        .save(&admin(), Some(saved.user.id), &edit)
        .unwrap();
    assert_eq!(edited.message, "Successfully edited user carol");

    let stored = fx.repo.snapshot().user(saved.user.id).unwrap().clone();
    assert!(!stored.prefs.interfaces_sort);
    assert!(!stored.disabled);
    assert_eq!(stored.password_hash, saved.user.password_hash);
}

#[test]
fn group_membership_follows_submission() {
    let fx = fixture();
    let mut request = SaveUserRequest::new_user("carol", "Secret123!");
    request.groups = vec!["admins".into()];
    let saved = fx.gate.users().save(&admin(), None, &request).unwrap();
    let uid = saved.user.uid;
    assert_eq!(fx.repo.snapshot().groups_of(uid), vec!["all", "admins"]);

    let mut edit = fx.gate.users().edit_request(saved.user.id).unwrap();
    edit.groups.clear();
    fx.gate
        .users()
        .save(&admin(), Some(saved.user.id), &edit)
        .unwrap();
    assert_eq!(fx.repo.snapshot().groups_of(uid), vec!["all"]);
}

#[test]
fn rename_removes_old_account() {
    let fx = fixture();
    let saved = fx
        .gate
        .users()
        .save(&admin(), None, &SaveUserRequest::new_user("carol", "Secret123!"))
        .unwrap();
    fx.hooks.clear();

    let mut edit = fx.gate.users().edit_request(saved.user.id).unwrap();
    edit.username = Some("caroline".into());
    fx.gate
        .users()
        .save(&admin(), Some(saved.user.id), &edit)
        .unwrap();

    let calls = fx.hooks.calls();
    assert_eq!(calls[0], HookCall::RemoveAccount("carol".into()));
    assert_eq!(calls[1], HookCall::ProvisionAccount("caroline".into()));
    assert_eq!(fx.gate.user_id("carol"), None);
    assert!(fx.gate.user_id("caroline").is_some());
}

#[test]
fn saving_uid_zero_restarts_sshd() {
    let fx = fixture();
    let id = fx.gate.users().find("admin").unwrap();
    let edit = fx.gate.users().edit_request(id).unwrap();
    fx.gate.users().save(&admin(), Some(id), &edit).unwrap();
    assert_eq!(
        fx.hooks.calls().last(),
        Some(&HookCall::RestartService("sshd".into()))
    );
}

#[test]
fn editing_system_user_keeps_it_out_of_all() {
    let fx = fixture();
    let id = fx.gate.users().find("admin").unwrap();
    assert!(!fx.repo.snapshot().group("all").unwrap().has_member(0));

    let edit = fx.gate.users().edit_request(id).unwrap();
    fx.gate.users().save(&admin(), Some(id), &edit).unwrap();

    let config = fx.repo.snapshot();
    assert!(!config.group("all").unwrap().has_member(0));
    assert_eq!(config.groups_of(0), vec!["admins".to_owned()]);
}

#[test]
fn system_user_cannot_be_downgraded_then_deleted() {
    let fx = fixture();
    let ops = Actor::new("ops", ["page-all"]);
    let id = fx.gate.users().find("admin").unwrap();
    let before = fx.repo.snapshot();

    let mut edit = fx.gate.users().edit_request(id).unwrap();
    edit.utype = Some("user".into());
    let err = fx.gate.users().save(&ops, Some(id), &edit).unwrap_err();
    let CoreError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(
        errors.messages(),
        vec!["The user type of a system user cannot be changed."]
    );
    assert_eq!(fx.repo.snapshot(), before);

    let report = fx.gate.users().delete(&ops, id, "admin").unwrap();
    assert!(report.deleted.is_empty());
    let admin_user = fx.repo.snapshot().user(id).cloned().unwrap();
    assert_eq!(admin_user.scope, Scope::System);
}

#[test]
fn validation_failure_persists_nothing() {
    let fx = fixture();
    let mut request = SaveUserRequest::new_user("carol", "Secret123!");
    request.password_confirm = Some(SecretString::from("Other123!".to_owned()));

    let err = fx.gate.users().save(&admin(), None, &request).unwrap_err();
    let CoreError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.messages(), vec!["The passwords do not match."]);
    assert_eq!(fx.repo.save_count(), 0);
    assert!(fx.hooks.calls().is_empty());
}

#[test]
fn save_with_stale_id_is_not_found() {
    let fx = fixture();
    let err = fx
        .gate
        .users()
        .save(
            &admin(),
            Some(EntityId::new()),
            &SaveUserRequest::new_user("ghost", "Secret123!"),
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[test]
fn create_with_certificate_links_it() {
    let mut config = SystemConfig::seeded();
    let ca = CertificateAuthority {
        refid: EntityId::new(),
        descr: "Internal CA".into(),
        has_private_key: true,
        subject: Default::default(),
    };
    let caref = ca.refid;
    config.cas.push(ca);
    let fx = fixture_with(config);

    let mut request = SaveUserRequest::new_user("carol", "Secret123!");
    request.cert.name = Some("carol vpn".into());
    request.cert.caref = Some(caref.to_string());
    request.cert.keylen = Some("2048".into());
    request.cert.lifetime = Some("365".into());
    let saved = fx.gate.users().save(&admin(), None, &request).unwrap();

    let config = fx.repo.snapshot();
    assert_eq!(saved.user.certs.len(), 1);
    let cert = config.cert(saved.user.certs[0]).unwrap();
    assert_eq!(cert.caref, caref);
    assert_eq!(cert.lifetime_days, 365);
    assert_eq!(cert.subject.common_name.as_deref(), Some("carol"));

    let form = fx.gate.users().edit_form(&admin(), saved.user.id).unwrap();
    assert_eq!(form.certs[0].ca, "Internal CA");
}

// ── Deletion ────────────────────────────────────────────────────────

#[test]
fn cannot_delete_self_or_system_user() {
    let mut config = SystemConfig::seeded();
    let ids = seed_users(&mut config, &["carol"]);
    let fx = fixture_with(config);
    let before = fx.repo.snapshot();

    let carol = Actor::new("carol", ["page-all"]);
    let report = fx.gate.users().delete(&carol, ids[0], "carol").unwrap();
    assert_eq!(
        report.errors,
        vec!["Cannot delete user carol because you are currently logged in as that user."]
    );

    let admin_id = fx.gate.users().find("admin").unwrap();
    let report = fx.gate.users().delete(&carol, admin_id, "admin").unwrap();
    assert_eq!(
        report.errors,
        vec!["Cannot delete user admin because it is a system user."]
    );

    assert_eq!(fx.repo.snapshot(), before);
    assert_eq!(fx.repo.save_count(), 0);
}

#[test]
fn delete_one_removes_user_and_membership() {
    let mut config = SystemConfig::seeded();
    let ids = seed_users(&mut config, &["carol"]);
    let fx = fixture_with(config);

    let report = fx.gate.users().delete(&admin(), ids[0], "carol").unwrap();
    assert_eq!(report.message.as_deref(), Some("Successfully deleted user: carol"));

    let config = fx.repo.snapshot();
    assert!(config.user(ids[0]).is_none());
    assert!(!config.group("all").unwrap().has_member(2000));
    assert_eq!(fx.hooks.calls(), vec![HookCall::RemoveAccount("carol".into())]);
    assert_eq!(fx.gate.user_id("carol"), None);
}

#[test]
fn delete_with_mismatched_username_is_not_found() {
    let mut config = SystemConfig::seeded();
    let ids = seed_users(&mut config, &["carol"]);
    let fx = fixture_with(config);
    let err = fx.gate.users().delete(&admin(), ids[0], "dave").unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[test]
fn bulk_delete_skips_system_user_and_persists_rest() {
    let mut config = SystemConfig::seeded();
    let mut ids = seed_users(&mut config, &["bob", "carol"]);
    ids.push(config.user_by_name("admin").unwrap().id);
    let fx = fixture_with(config);

    let report = fx
        .gate
        .users()
        .delete_many(&Actor::new("operator", ["page-all"]), &ids)
        .unwrap();

    assert_eq!(report.deleted, vec!["bob", "carol"]);
    assert_eq!(
        report.errors,
        vec!["Cannot delete user admin because it is a system user."]
    );
    assert_eq!(
        report.message.as_deref(),
        Some("Successfully deleted users: bob, carol")
    );
    assert_eq!(fx.repo.save_count(), 1);

    let names: Vec<_> = fx
        .repo
        .snapshot()
        .users
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["admin"]);
}

#[test]
fn bulk_delete_singular_message_and_unknown_ids() {
    let mut config = SystemConfig::seeded();
    let ids = seed_users(&mut config, &["bob"]);
    let fx = fixture_with(config);
    let report = fx
        .gate
        .users()
        .delete_many(&admin(), &[ids[0], EntityId::new()])
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(report.message.as_deref(), Some("Successfully deleted user: bob"));
}

// ── Associations ────────────────────────────────────────────────────

#[test]
fn remove_privilege_and_certificate_association() {
    let mut config = SystemConfig::seeded();
    let ids = seed_users(&mut config, &["carol"]);
    let cert = EntityId::new();
    {
        let carol = config.user_mut(ids[0]).unwrap();
        carol.privileges.push("user-ssh-tunnel".into());
        carol.certs.push(cert);
    }
    let fx = fixture_with(config);

    let (form, message) = fx
        .gate
        .users()
        .delete_privilege(&admin(), ids[0], "user-ssh-tunnel")
        .unwrap();
    assert_eq!(
        message,
        "Removed Privilege \"User - System: SSH tunneling\" from user carol"
    );
    assert!(form.privileges.is_empty());
    assert_eq!(fx.hooks.calls(), vec![HookCall::ProvisionAccount("carol".into())]);

    let (_, message) = fx
        .gate
        .users()
        .delete_certificate(&admin(), ids[0], cert)
        .unwrap();
    assert_eq!(message, "Removed certificate association \"\" from user carol");
    assert!(fx.repo.snapshot().user(ids[0]).unwrap().certs.is_empty());
}

// ── Read-only gate ──────────────────────────────────────────────────

#[test]
fn read_only_actor_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let repo = Arc::new(FileRepository::new(&path));
    let mut config = repo.load().unwrap();
    let ids = seed_users(&mut config, &["carol"]);
    repo.persist(&config).unwrap();
    let bytes = std::fs::read(&path).unwrap();

    let hooks = Arc::new(RecordingHooks::new());
    let gate = Gatehouse::new(repo, hooks.clone(), settings()).unwrap();
    let viewer = Actor::new("viewer", [READ_ONLY]);

    let actions = vec![
        UserAction::Save {
            id: None,
            request: Box::new(SaveUserRequest::new_user("dave", "Secret123!")),
        },
        UserAction::Delete {
            id: ids[0],
            username: "carol".into(),
        },
        UserAction::DeleteMany { ids: ids.clone() },
        UserAction::DeletePrivilege {
            id: ids[0],
            privilege: "page-all".into(),
        },
        UserAction::DeleteCertificate {
            id: ids[0],
            cert: EntityId::new(),
        },
    ];
    for action in actions {
        let err = gate.users().dispatch(&viewer, action).unwrap_err();
        assert_eq!(
            err.form_messages().unwrap(),
            vec!["Insufficient privileges to make the requested change (read only)."]
        );
    }

    assert_eq!(std::fs::read(&path).unwrap(), bytes);
    assert!(hooks.calls().is_empty());
}

#[test]
fn read_only_actor_can_still_view() {
    let fx = fixture();
    let viewer = Actor::new("viewer", [READ_ONLY]);
    let UserOutcome::List(rows) = fx.gate.users().dispatch(&viewer, UserAction::List).unwrap()
    else {
        panic!("expected list");
    };
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].deletable);

    let UserOutcome::Form(form) = fx.gate.users().dispatch(&viewer, UserAction::New).unwrap()
    else {
        panic!("expected form");
    };
    assert!(form.read_only);
    assert_eq!(form.utype, "user");
    assert_eq!(form.cert.lifetime.as_deref(), Some("3650"));
    assert_eq!(form.cert.keylen.as_deref(), Some("2048"));
    assert_eq!(form.cert.ecname.as_deref(), Some("prime256v1"));
    assert_eq!(form.cert.digest.as_deref(), Some("sha256"));
}

#[test]
fn edit_form_flags_admin_privileges() {
    let fx = fixture();
    let id = fx.gate.users().find("admin").unwrap();
    let form = fx.gate.users().edit_form(&admin(), id).unwrap();
    assert!(form.admin_notice);
    assert_eq!(form.groups, vec!["admins"]);
    assert_eq!(form.privileges[0].group.as_deref(), Some("admins"));
}

#[test]
fn list_marks_self_as_not_deletable() {
    let mut config = SystemConfig::seeded();
    seed_users(&mut config, &["bob", "carol"]);
    let fx = fixture_with(config);
    let rows = fx.gate.users().list(&Actor::new("carol", ["page-all"])).unwrap();
    let flags: Vec<_> = rows.iter().map(|r| (r.name.as_str(), r.deletable)).collect();
    assert_eq!(flags, vec![("admin", false), ("bob", true), ("carol", false)]);
}
