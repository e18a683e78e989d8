//! `gatehouse hostnames`: a zone's allowed hostnames.

use tabled::Tabled;

use gatehouse_core::model::hostname::to_ascii;
use gatehouse_core::model::zone::normalize_zone_name;
use gatehouse_core::{AllowedHostname, EntityId, HostnameForm, SaveHostnameRequest};

use crate::cli::{HostnameFieldArgs, HostnamesArgs, HostnamesCommand};
use crate::commands::{Session, util};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct HostnameRow {
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Direction")]
    dir: &'static str,
    #[tabled(rename = "Subnet")]
    sn: String,
    #[tabled(rename = "Up (Kbit/s)")]
    bw_up: String,
    #[tabled(rename = "Down (Kbit/s)")]
    bw_down: String,
    #[tabled(rename = "Description")]
    descr: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&AllowedHostname> for HostnameRow {
    fn from(h: &AllowedHostname) -> Self {
        let text = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            hostname: h.hostname.display(),
            dir: h.dir.label(),
            sn: h.sn.map(|n| n.to_string()).unwrap_or_default(),
            bw_up: text(h.bw_up),
            bw_down: text(h.bw_down),
            descr: h.descr.clone(),
            id: h.id.to_string(),
        }
    }
}

/// Find an entry by id, or by hostname in either Unicode or ASCII form.
fn resolve_entry(session: &Session<'_>, zone: &str, entry: &str) -> Result<EntityId, CliError> {
    let entries = session.gate.portal().list(zone)?;
    let ascii = to_ascii(entry);
    entries
        .iter()
        .find(|h| {
            h.id.to_string() == entry || ascii.as_deref() == Some(h.hostname.as_ascii())
        })
        .map(|h| h.id)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "allowed hostname".into(),
            identifier: entry.into(),
            list_command: format!("hostnames list --zone {zone}"),
        })
}

/// Apply flag values over the fields already on the request.
fn apply_fields(request: &mut SaveHostnameRequest, fields: HostnameFieldArgs) {
    let HostnameFieldArgs {
        dir,
        sn,
        bw_up,
        bw_down,
        descr,
    } = fields;
    request.dir = dir.or(request.dir.take());
    request.sn = sn.or(request.sn.take());
    request.bw_up = bw_up.or(request.bw_up.take());
    request.bw_down = bw_down.or(request.bw_down.take());
    request.descr = descr.or(request.descr.take());
}

/// Request carrying an entry's stored values.
fn stored_request(form: HostnameForm) -> SaveHostnameRequest {
    SaveHostnameRequest {
        hostname: Some(form.hostname),
        dir: Some(form.dir),
        sn: Some(form.sn),
        bw_up: Some(form.bw_up),
        bw_down: Some(form.bw_down),
        descr: Some(form.descr),
    }
}

fn print_entry(session: &Session<'_>, entry: &AllowedHostname) -> Result<(), CliError> {
    let rendered = output::render_single(
        session.format,
        entry,
        |h| {
            let row = HostnameRow::from(h);
            output::detail_lines(&[
                ("ID", row.id),
                ("Hostname", row.hostname),
                ("Direction", row.dir.to_owned()),
                ("Subnet", row.sn),
                ("Up (Kbit/s)", row.bw_up),
                ("Down (Kbit/s)", row.bw_down),
                ("Description", row.descr),
            ])
        },
        |h| h.id.to_string(),
    )?;
    session.print(&rendered);
    Ok(())
}

pub fn handle(args: HostnamesArgs, session: &Session<'_>) -> Result<(), CliError> {
    let zone = args.zone.ok_or(CliError::ZoneRequired)?;
    let portal = session.gate.portal();

    match args.command {
        HostnamesCommand::List => {
            let entries = portal.list(&zone)?;
            let rendered = output::render_list(
                session.format,
                &entries,
                |h| HostnameRow::from(h),
                |h| h.hostname.as_ascii().to_owned(),
            )?;
            session.print(&rendered);
            Ok(())
        }

        HostnamesCommand::Add(add) => {
            let mut request = SaveHostnameRequest {
                hostname: Some(add.hostname),
                ..SaveHostnameRequest::default()
            };
            apply_fields(&mut request, add.fields);
            let entry = portal.save(&session.actor, &zone, None, &request)?;
            session.status(&format!(
                "Allowed {} in zone {}",
                entry.hostname.display(),
                normalize_zone_name(&zone)
            ));
            print_entry(session, &entry)
        }

        HostnamesCommand::Edit(edit) => {
            let id = resolve_entry(session, &zone, &edit.entry)?;
            let mut request = stored_request(portal.form(&zone, Some(id))?);
            if let Some(hostname) = edit.hostname {
                request.hostname = Some(hostname);
            }
            apply_fields(&mut request, edit.fields);
            let entry = portal.save(&session.actor, &zone, Some(id), &request)?;
            session.status(&format!("Updated {}", entry.hostname.display()));
            print_entry(session, &entry)
        }

        HostnamesCommand::Delete { entry } => {
            let id = resolve_entry(session, &zone, &entry)?;
            let prompt = format!("Remove {entry} from zone {zone}?");
            if !util::confirm(&prompt, session.global.yes, "hostnames delete")? {
                return Ok(());
            }
            let removed = portal.delete(&session.actor, &zone, id)?;
            session.status(&format!("Removed {}", removed.hostname.display()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_stored_values_only_when_given() {
        let mut request = SaveHostnameRequest {
            hostname: Some("example.com".into()),
            dir: Some("both".into()),
            descr: Some("docs".into()),
            ..SaveHostnameRequest::default()
        };
        apply_fields(
            &mut request,
            HostnameFieldArgs {
                dir: Some("to".into()),
                sn: None,
                bw_up: Some("512".into()),
                bw_down: None,
                descr: None,
            },
        );
        assert_eq!(request.dir.as_deref(), Some("to"));
        assert_eq!(request.bw_up.as_deref(), Some("512"));
        assert_eq!(request.descr.as_deref(), Some("docs"));
        assert_eq!(request.sn, None);
    }
}
