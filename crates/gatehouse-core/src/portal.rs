// ── Captive portal allowed-hostname editor ──

use serde::Serialize;
use tracing::{debug, info};

use crate::Gatehouse;
use crate::actor::Actor;
use crate::command::SaveHostnameRequest;
use crate::error::CoreError;
use crate::model::hostname::{self, HostnameError};
use crate::model::zone::normalize_zone_name;
use crate::model::{AllowedHostname, Direction, EntityId, Hostname, Zone};
use crate::store::ChangeNote;
use crate::validation::{ValidationErrors, require};

pub const SAVED_MESSAGE: &str = "Captive portal allowed hostnames added";
pub const DELETED_MESSAGE: &str = "Captive portal allowed hostname deleted";

/// Largest subnet qualifier accepted (IPv6 prefix length).
const MAX_SUBNET_BITS: u8 = 128;

/// Zone summary for the zone list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneSummary {
    pub name: String,
    pub zoneid: u32,
    pub descr: String,
    pub hostnames: usize,
}

/// Field values for the editor form, all in display form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostnameForm {
    pub zone: String,
    pub id: Option<EntityId>,
    pub hostname: String,
    pub dir: String,
    pub sn: String,
    pub bw_up: String,
    pub bw_down: String,
    pub descr: String,
}

impl HostnameForm {
    fn blank(zone: &str) -> Self {
        Self {
            zone: zone.to_owned(),
            dir: Direction::default().to_string(),
            ..Self::default()
        }
    }

    fn from_entry(zone: &str, entry: &AllowedHostname) -> Self {
        Self {
            zone: zone.to_owned(),
            id: Some(entry.id),
            hostname: entry.hostname.display(),
            dir: entry.dir.to_string(),
            sn: entry.sn.map(|v| v.to_string()).unwrap_or_default(),
            bw_up: entry.bw_up.map(|v| v.to_string()).unwrap_or_default(),
            bw_down: entry.bw_down.map(|v| v.to_string()).unwrap_or_default(),
            descr: entry.descr.clone(),
        }
    }

    /// Echo a rejected submission back into the form.
    pub fn from_request(zone: &str, id: Option<EntityId>, request: &SaveHostnameRequest) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            zone: zone.to_owned(),
            id,
            hostname: text(&request.hostname),
            dir: request
                .dir
                .clone()
                .unwrap_or_else(|| Direction::default().to_string()),
            sn: text(&request.sn),
            bw_up: text(&request.bw_up),
            bw_down: text(&request.bw_down),
            descr: text(&request.descr),
        }
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidHostname {
    pub hostname: Hostname,
    pub dir: Direction,
    pub sn: Option<u8>,
    pub bw_up: Option<u32>,
    pub bw_down: Option<u32>,
    pub descr: String,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Check a submission against the zone's current entries. `editing` is
/// excluded from the duplicate check.
pub fn validate_hostname(
    zone: &Zone,
    editing: Option<EntityId>,
    request: &SaveHostnameRequest,
) -> Result<ValidHostname, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    require(
        &mut errors,
        "hostname",
        "Allowed Hostname",
        request.hostname.as_deref(),
    );

    let hostname = match non_empty(request.hostname.as_ref()) {
        None => None,
        Some(raw) => match Hostname::parse(raw) {
            Ok(h) => Some(h),
            Err(e) => {
                let shown = match e {
                    HostnameError::Syntax => hostname::to_ascii(raw)
                        .map_or_else(|| raw.to_owned(), |ascii| hostname::to_display(&ascii)),
                    HostnameError::Conversion => raw.to_owned(),
                };
                errors.push(
                    "hostname",
                    format!("A valid Hostname must be specified. [{shown}]"),
                );
                None
            }
        },
    };

    let bw_up = parse_speed(&mut errors, "bw_up", request.bw_up.as_ref(), "Upload");
    let bw_down = parse_speed(&mut errors, "bw_down", request.bw_down.as_ref(), "Download");

    let dir = match non_empty(request.dir.as_ref()) {
        None => Direction::default(),
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            errors.push("dir", "A valid direction must be selected.");
            Direction::default()
        }),
    };

    let sn = match non_empty(request.sn.as_ref()) {
        None => None,
        Some(raw) => match raw.parse::<u8>() {
            Ok(bits) if bits <= MAX_SUBNET_BITS => Some(bits),
            _ => {
                errors.push(
                    "sn",
                    "Subnet bits must be an integer between 0 and 128.",
                );
                None
            }
        },
    };

    if let Some(candidate) = &hostname {
        let duplicate = zone.allowed_hostnames.iter().any(|entry| {
            Some(entry.id) != editing
                && entry
                    .hostname
                    .as_ascii()
                    .eq_ignore_ascii_case(candidate.as_ascii())
        });
        if duplicate {
            errors.push(
                "hostname",
                format!("Hostname [{}] already allowed.", candidate.display()),
            );
        }
    }

    let descr = request.descr.clone().unwrap_or_default();
    match hostname {
        Some(hostname) if errors.is_empty() => Ok(ValidHostname {
            hostname,
            dir,
            sn,
            bw_up,
            bw_down,
            descr,
        }),
        _ => Err(errors),
    }
}

fn parse_speed(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&String>,
    label: &str,
) -> Option<u32> {
    let raw = non_empty(value)?;
    raw.parse().map_or_else(
        |_| {
            errors.push(field, format!("{label} speed needs to be an integer"));
            None
        },
        Some,
    )
}

/// Allowed-hostname operations for one captive portal zone at a time.
pub struct HostnameEditor<'a> {
    gate: &'a Gatehouse,
}

impl<'a> HostnameEditor<'a> {
    pub(crate) fn new(gate: &'a Gatehouse) -> Self {
        Self { gate }
    }

    pub fn zones(&self) -> Result<Vec<ZoneSummary>, CoreError> {
        let config = self.gate.repository.load()?;
        Ok(config
            .captive_portal
            .values()
            .map(|z| ZoneSummary {
                name: z.name.clone(),
                zoneid: z.zoneid,
                descr: z.descr.clone(),
                hostnames: z.allowed_hostnames.len(),
            })
            .collect())
    }

    pub fn list(&self, zone: &str) -> Result<Vec<AllowedHostname>, CoreError> {
        let zone_name = normalize_zone_name(zone);
        let config = self.gate.repository.load()?;
        let zone = config
            .zone(&zone_name)
            .ok_or(CoreError::ZoneNotFound { zone: zone_name })?;
        let mut entries = zone.allowed_hostnames.clone();
        entries.sort_by_cached_key(AllowedHostname::sort_key);
        Ok(entries)
    }

    /// Editor form: pre-filled for a known id, blank otherwise.
    pub fn form(&self, zone: &str, id: Option<EntityId>) -> Result<HostnameForm, CoreError> {
        let zone_name = normalize_zone_name(zone);
        let config = self.gate.repository.load()?;
        let zone = config
            .zone(&zone_name)
            .ok_or_else(|| CoreError::ZoneNotFound {
                zone: zone_name.clone(),
            })?;
        Ok(id
            .and_then(|id| zone.hostname(id))
            .map_or_else(
                || HostnameForm::blank(&zone_name),
                |entry| HostnameForm::from_entry(&zone_name, entry),
            ))
    }

    /// Create or update an entry. An id that no longer exists creates a new
    /// entry.
    pub fn save(
        &self,
        actor: &Actor,
        zone: &str,
        id: Option<EntityId>,
        request: &SaveHostnameRequest,
    ) -> Result<AllowedHostname, CoreError> {
        actor.ensure_writable()?;
        let zone_name = normalize_zone_name(zone);

        let _guard = self.gate.write_lock.lock();
        let mut config = self.gate.repository.load()?;
        let zone = config
            .zone_mut(&zone_name)
            .ok_or_else(|| CoreError::ZoneNotFound {
                zone: zone_name.clone(),
            })?;

        let existing = id.filter(|id| zone.hostname(*id).is_some());
        let valid = validate_hostname(zone, existing, request)?;

        let entry = AllowedHostname {
            id: existing.unwrap_or_default(),
            hostname: valid.hostname,
            dir: valid.dir,
            sn: valid.sn,
            bw_up: valid.bw_up,
            bw_down: valid.bw_down,
            descr: valid.descr,
        };
        match zone
            .allowed_hostnames
            .iter_mut()
            .find(|h| Some(h.id) == existing)
        {
            Some(slot) => *slot = entry.clone(),
            None => zone.allowed_hostnames.push(entry.clone()),
        }

        self.gate.hooks.cleanup_allowed_hostnames(&zone_name);
        self.gate
            .repository
            .save(&mut config, ChangeNote::new(&actor.username, SAVED_MESSAGE))?;
        self.gate.hooks.reconfigure_allowed_hostnames(&zone_name);

        info!(
            zone = %zone_name,
            hostname = %entry.hostname.as_ascii(),
            actor = %actor.username,
            "{SAVED_MESSAGE}"
        );
        Ok(entry)
    }

    pub fn delete(&self, actor: &Actor, zone: &str, id: EntityId) -> Result<AllowedHostname, CoreError> {
        actor.ensure_writable()?;
        let zone_name = normalize_zone_name(zone);

        let _guard = self.gate.write_lock.lock();
        let mut config = self.gate.repository.load()?;
        let zone = config
            .zone_mut(&zone_name)
            .ok_or_else(|| CoreError::ZoneNotFound {
                zone: zone_name.clone(),
            })?;
        let removed = zone
            .hostname(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("allowed hostname", id))?;
        zone.allowed_hostnames.retain(|h| h.id != id);

        self.gate.hooks.cleanup_allowed_hostnames(&zone_name);
        self.gate
            .repository
            .save(&mut config, ChangeNote::new(&actor.username, DELETED_MESSAGE))?;
        self.gate.hooks.reconfigure_allowed_hostnames(&zone_name);

        debug!(zone = %zone_name, hostname = %removed.hostname.as_ascii(), "{DELETED_MESSAGE}");
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn zone_with(names: &[&str]) -> Zone {
        Zone {
            name: "guest".into(),
            zoneid: 2,
            descr: String::new(),
            allowed_hostnames: names
                .iter()
                .map(|n| AllowedHostname {
                    id: EntityId::new(),
                    hostname: Hostname::parse(n).unwrap(),
                    dir: Direction::Both,
                    sn: None,
                    bw_up: None,
                    bw_down: None,
                    descr: String::new(),
                })
                .collect(),
        }
    }

    fn request(hostname: &str) -> SaveHostnameRequest {
        SaveHostnameRequest {
            hostname: Some(hostname.into()),
            dir: Some("both".into()),
            ..SaveHostnameRequest::default()
        }
    }

    #[test]
    fn missing_hostname_is_required() {
        let err = validate_hostname(&zone_with(&[]), None, &SaveHostnameRequest::default())
            .unwrap_err();
        assert_eq!(err.messages(), vec!["The field 'Allowed Hostname' is required."]);
    }

    #[test]
    fn empty_speeds_are_omitted() {
        let mut req = request("example.com");
        req.bw_up = Some(String::new());
        req.bw_down = Some("  ".into());
        let valid = validate_hostname(&zone_with(&[]), None, &req).unwrap();
        assert_eq!(valid.bw_up, None);
        assert_eq!(valid.bw_down, None);
    }

    #[test]
    fn errors_follow_field_order() {
        let mut req = request("bad host");
        req.bw_up = Some("fast".into());
        req.bw_down = Some("slow".into());
        let err = validate_hostname(&zone_with(&[]), None, &req).unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "A valid Hostname must be specified. [bad host]",
                "Upload speed needs to be an integer",
                "Download speed needs to be an integer",
            ]
        );
    }

    #[test]
    fn duplicate_is_reported_once_and_case_insensitively() {
        let zone = zone_with(&["example.com", "other.example"]);
        let err = validate_hostname(&zone, None, &request("EXAMPLE.com")).unwrap_err();
        assert_eq!(err.messages(), vec!["Hostname [example.com] already allowed."]);
    }

    #[test]
    fn editing_keeps_own_hostname() {
        let zone = zone_with(&["example.com"]);
        let own = zone.allowed_hostnames[0].id;
        assert!(validate_hostname(&zone, Some(own), &request("example.com")).is_ok());
    }

    #[test]
    fn subnet_bits_are_bounded() {
        let mut req = request("example.com");
        req.sn = Some("129".into());
        let err = validate_hostname(&zone_with(&[]), None, &req).unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["Subnet bits must be an integer between 0 and 128."]
        );
        req.sn = Some("24".into());
        assert_eq!(
            validate_hostname(&zone_with(&[]), None, &req).unwrap().sn,
            Some(24)
        );
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let mut req = request("example.com");
        req.dir = Some("sideways".into());
        let err = validate_hostname(&zone_with(&[]), None, &req).unwrap_err();
        assert_eq!(err.messages(), vec!["A valid direction must be selected."]);
    }
}
