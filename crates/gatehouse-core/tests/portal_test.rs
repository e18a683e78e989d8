#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use gatehouse_core::model::privilege::READ_ONLY;
use gatehouse_core::{
    Actor, CoreError, Direction, EntityId, Gatehouse, HookCall, MemoryRepository,
    RecordingHooks, SaveHostnameRequest, Settings, SystemConfig, Zone,
};
use pretty_assertions::assert_eq;

struct Fixture {
    gate: Gatehouse,
    repo: Arc<MemoryRepository>,
    hooks: Arc<RecordingHooks>,
}

fn fixture() -> Fixture {
    let mut config = SystemConfig::seeded();
    config.captive_portal.insert(
        "guest".into(),
        Zone {
            name: "guest".into(),
            zoneid: 2,
            descr: "Guest WiFi".into(),
            allowed_hostnames: Vec::new(),
        },
    );
    let repo = Arc::new(MemoryRepository::new(config));
    let hooks = Arc::new(RecordingHooks::new());
    let gate = Gatehouse::new(repo.clone(), hooks.clone(), Settings::default()).unwrap();
    Fixture { gate, repo, hooks }
}

fn admin() -> Actor {
    Actor::new("admin", ["page-all"])
}

fn request(hostname: &str) -> SaveHostnameRequest {
    SaveHostnameRequest {
        hostname: Some(hostname.into()),
        dir: Some("both".into()),
        ..SaveHostnameRequest::default()
    }
}

fn stored_names(fx: &Fixture) -> Vec<String> {
    fx.repo
        .snapshot()
        .zone("guest")
        .unwrap()
        .allowed_hostnames
        .iter()
        .map(|h| h.hostname.display())
        .collect()
}

#[test]
fn saved_entries_stay_sorted_by_display_form() {
    let fx = fixture();
    for name in ["zulu.example", "bücher.example", "alpha.example"] {
        fx.gate.portal().save(&admin(), "guest", None, &request(name)).unwrap();
    }
    assert_eq!(
        stored_names(&fx),
        vec!["alpha.example", "bücher.example", "zulu.example"]
    );
}

#[test]
fn idn_is_stored_as_punycode() {
    let fx = fixture();
    let entry = fx
        .gate
        .portal()
        .save(&admin(), "guest", None, &request("bücher.example"))
        .unwrap();
    assert_eq!(entry.hostname.as_ascii(), "xn--bcher-kva.example");

    let form = fx.gate.portal().form("guest", Some(entry.id)).unwrap();
    assert_eq!(form.hostname, "bücher.example");
}

#[test]
fn save_sequence_cleans_persists_then_reconfigures() {
    let fx = fixture();
    fx.gate
        .portal()
        .save(&admin(), "GUEST", None, &request("example.com"))
        .unwrap();
    assert_eq!(
        fx.hooks.calls(),
        vec![
            HookCall::CleanupAllowedHostnames("guest".into()),
            HookCall::ReconfigureAllowedHostnames("guest".into()),
        ]
    );
    let config = fx.repo.snapshot();
    assert_eq!(
        config.changelog.last().unwrap().message,
        "Captive portal allowed hostnames added"
    );
}

#[test]
fn duplicate_is_rejected_without_persisting() {
    let fx = fixture();
    fx.gate
        .portal()
        .save(&admin(), "guest", None, &request("example.com"))
        .unwrap();
    let saves = fx.repo.save_count();

    let err = fx
        .gate
        .portal()
        .save(&admin(), "guest", None, &request("example.com"))
        .unwrap_err();
    assert_eq!(
        err.form_messages().unwrap(),
        vec!["Hostname [example.com] already allowed."]
    );
    assert_eq!(fx.repo.save_count(), saves);
}

#[test]
fn editing_keeps_hostname_and_updates_fields() {
    let fx = fixture();
    let entry = fx
        .gate
        .portal()
        .save(&admin(), "guest", None, &request("example.com"))
        .unwrap();

    let mut edit = request("example.com");
    edit.dir = Some("to".into());
    edit.bw_up = Some("512".into());
    edit.descr = Some("updates".into());
    let updated = fx
        .gate
        .portal()
        .save(&admin(), "guest", Some(entry.id), &edit)
        .unwrap();

    assert_eq!(updated.id, entry.id);
    let config = fx.repo.snapshot();
    let zone = config.zone("guest").unwrap();
    assert_eq!(zone.allowed_hostnames.len(), 1);
    assert_eq!(zone.allowed_hostnames[0].dir, Direction::To);
    assert_eq!(zone.allowed_hostnames[0].bw_up, Some(512));
    assert_eq!(zone.allowed_hostnames[0].bw_down, None);
}

#[test]
fn unknown_zone_fails_fast() {
    let fx = fixture();
    assert!(matches!(
        fx.gate.portal().form("lobby", None),
        Err(CoreError::ZoneNotFound { .. })
    ));
    assert!(matches!(
        fx.gate.portal().save(&admin(), "lobby", None, &request("example.com")),
        Err(CoreError::ZoneNotFound { .. })
    ));
}

#[test]
fn blank_form_defaults_to_both_directions() {
    let fx = fixture();
    let form = fx.gate.portal().form("guest", None).unwrap();
    assert_eq!(form.dir, "both");
    assert_eq!(form.hostname, "");
    assert_eq!(form.id, None);
}

#[test]
fn read_only_actor_cannot_edit_hostnames() {
    let fx = fixture();
    let viewer = Actor::new("viewer", [READ_ONLY]);
    let err = fx
        .gate
        .portal()
        .save(&viewer, "guest", None, &request("example.com"))
        .unwrap_err();
    assert!(matches!(err, CoreError::ReadOnly));
    assert_eq!(fx.repo.save_count(), 0);
}

#[test]
fn delete_removes_entry() {
    let fx = fixture();
    let entry = fx
        .gate
        .portal()
        .save(&admin(), "guest", None, &request("example.com"))
        .unwrap();
    fx.gate.portal().delete(&admin(), "guest", entry.id).unwrap();
    assert!(stored_names(&fx).is_empty());

    let err = fx
        .gate
        .portal()
        .delete(&admin(), "guest", EntityId::new())
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[test]
fn zones_are_listed_with_counts() {
    let fx = fixture();
    fx.gate
        .portal()
        .save(&admin(), "guest", None, &request("example.com"))
        .unwrap();
    let zones = fx.gate.portal().zones().unwrap();
    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].name, "guest");
    assert_eq!(zones[0].hostnames, 1);
}
