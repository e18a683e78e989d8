//! `gatehouse users`: local console accounts.

use std::path::Path;

use serde::Serialize;
use tabled::Tabled;

use gatehouse_core::model::privilege::EffectivePrivilege;
use gatehouse_core::users::CertificateRow;
use gatehouse_core::{CertRequest, EntityId, SaveUserRequest, UserForm, UserSummary};

use crate::cli::{UserAddArgs, UserEditArgs, UserFieldArgs, UsersArgs, UsersCommand};
use crate::commands::{Session, util};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Username")]
    name: String,
    #[tabled(rename = "Full name")]
    descr: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Groups")]
    groups: String,
    #[tabled(rename = "ID")]
    id: String,
}

fn user_row(user: &UserSummary, color: bool) -> UserRow {
    UserRow {
        name: user.name.clone(),
        descr: user.descr.clone(),
        scope: user.scope.to_string(),
        status: output::status_cell(user.disabled, color),
        groups: user.groups.join(", "),
        id: user.id.to_string(),
    }
}

// ── Detail view ─────────────────────────────────────────────────────

/// What `users show` prints: the stored account without editor choices.
#[derive(Debug, Serialize)]
struct UserDetail {
    id: Option<EntityId>,
    username: String,
    descr: String,
    scope: String,
    uid: Option<u32>,
    disabled: bool,
    expires: String,
    groups: Vec<String>,
    privileges: Vec<EffectivePrivilege>,
    certificates: Vec<CertificateRow>,
    authorized_keys: bool,
    admin: bool,
}

impl From<UserForm> for UserDetail {
    fn from(form: UserForm) -> Self {
        Self {
            id: form.id,
            username: form.username,
            descr: form.descr,
            scope: form.utype,
            uid: form.uid,
            disabled: form.disabled,
            expires: form.expires,
            groups: form.groups,
            privileges: form.privileges,
            certificates: form.certs,
            authorized_keys: !form.authorized_keys.trim().is_empty(),
            admin: form.admin_notice,
        }
    }
}

fn detail(user: &UserDetail, color: bool) -> String {
    let privileges = user
        .privileges
        .iter()
        .map(|p| match &p.group {
            Some(group) => format!("{} (via {group})", p.name),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>();
    let certificates = user
        .certificates
        .iter()
        .map(|c| {
            let revoked = if c.revoked { ", revoked" } else { "" };
            format!("{} [{}{revoked}] {}", c.descr, c.ca, c.refid)
        })
        .collect::<Vec<_>>();
    let or_dash = |s: String| if s.is_empty() { "-".to_owned() } else { s };

    output::detail_lines(&[
        ("ID", user.id.map(|id| id.to_string()).unwrap_or_default()),
        ("Username", user.username.clone()),
        ("Full name", or_dash(user.descr.clone())),
        ("Scope", user.scope.clone()),
        ("UID", user.uid.map(|u| u.to_string()).unwrap_or_default()),
        ("Status", output::status_cell(user.disabled, color)),
        ("Expires", or_dash(user.expires.clone())),
        ("Groups", or_dash(user.groups.join(", "))),
        ("Privileges", or_dash(privileges.join(", "))),
        ("Certificates", or_dash(certificates.join("; "))),
        ("SSH keys", if user.authorized_keys { "yes" } else { "no" }.into()),
    ])
}

fn show(session: &Session<'_>, id: EntityId) -> Result<(), CliError> {
    let form = session.gate.users().edit_form(&session.actor, id)?;
    let user = UserDetail::from(form);
    let rendered = output::render_single(
        session.format,
        &user,
        |u| detail(u, session.color),
        |u| u.username.clone(),
    )?;
    session.print(&rendered);
    Ok(())
}

// ── Request building ────────────────────────────────────────────────

fn read_keys(path: &Path) -> Result<String, CliError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Copy flag values onto a save request; unset flags leave it untouched.
fn apply_fields(request: &mut SaveUserRequest, fields: UserFieldArgs) -> Result<(), CliError> {
    if let Some(descr) = fields.descr {
        request.descr = Some(descr);
    }
    if let Some(expires) = fields.expires {
        request.expires = Some(expires);
    }
    if !fields.groups.is_empty() {
        request.groups = fields.groups;
    }
    if let Some(path) = fields.authorized_keys_file {
        request.authorized_keys = Some(read_keys(&path)?);
    }
    if let Some(psk) = fields.ipsecpsk {
        request.ipsecpsk = util::non_empty(Some(psk));
    }
    if fields.keep_history {
        request.keep_history = true;
    }
    if fields.theme.is_some() || fields.dashboard_columns.is_some() {
        request.prefs.custom_settings = true;
        if fields.theme.is_some() {
            request.prefs.webgui_css = fields.theme;
        }
        if fields.dashboard_columns.is_some() {
            request.prefs.dashboard_columns = fields.dashboard_columns;
        }
    }
    Ok(())
}

fn add_request(args: UserAddArgs) -> Result<SaveUserRequest, CliError> {
    let (password, confirm) = util::read_password(args.password_stdin)?;
    let mut request = SaveUserRequest {
        username: Some(args.username),
        password: Some(password),
        password_confirm: Some(confirm),
        disabled: args.disabled,
        cert: CertRequest {
            name: args.cert_name,
            caref: args.cert_ca,
            keytype: args.key_type,
            keylen: args.key_length,
            ecname: args.curve,
            digest: args.digest,
            lifetime: args.lifetime,
        },
        ..SaveUserRequest::default()
    };
    apply_fields(&mut request, args.fields)?;
    Ok(request)
}

fn edit_request(
    session: &Session<'_>,
    id: EntityId,
    args: UserEditArgs,
) -> Result<SaveUserRequest, CliError> {
    let mut request = session.gate.users().edit_request(id)?;
    if let Some(name) = args.rename {
        request.username = Some(name);
    }
    if args.disable {
        request.disabled = true;
    }
    if args.enable {
        request.disabled = false;
    }
    if args.no_groups {
        request.groups.clear();
    }
    if args.password || args.password_stdin {
        let (password, confirm) = util::read_password(args.password_stdin)?;
        request.password = Some(password);
        request.password_confirm = Some(confirm);
    }
    apply_fields(&mut request, args.fields)?;
    Ok(request)
}

// ── Deletion ────────────────────────────────────────────────────────

fn delete(session: &Session<'_>, identifiers: &[String]) -> Result<(), CliError> {
    let users = session.gate.users();
    let ids = identifiers
        .iter()
        .map(|ident| util::resolve_user_id(&session.gate, ident))
        .collect::<Result<Vec<_>, _>>()?;

    let prompt = match identifiers {
        [one] => format!("Delete user {one}?"),
        many => format!("Delete {} users?", many.len()),
    };
    if !util::confirm(&prompt, session.global.yes, "users delete")? {
        return Ok(());
    }

    let report = match ids.as_slice() {
        [id] => {
            let name = users.get(*id)?.name;
            users.delete(&session.actor, *id, &name)?
        }
        _ => users.delete_many(&session.actor, &ids)?,
    };

    if let Some(message) = &report.message {
        session.status(message);
    }
    if report.is_clean() {
        return Ok(());
    }
    let summary = if report.deleted.is_empty() {
        "No users were deleted".to_owned()
    } else {
        format!("{} of {} users could not be deleted", report.errors.len(), ids.len())
    };
    Err(CliError::Refused {
        summary,
        details: Some(report.errors.join("\n")),
    })
}

fn parse_cert_id(raw: &str) -> Result<EntityId, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "cert".into(),
        reason: format!("not a certificate reference id: {raw}"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: UsersArgs, session: &Session<'_>) -> Result<(), CliError> {
    let users = session.gate.users();
    match args.command {
        UsersCommand::List => {
            let list = users.list(&session.actor)?;
            let rendered = output::render_list(
                session.format,
                &list,
                |u| user_row(u, session.color),
                |u| u.name.clone(),
            )?;
            session.print(&rendered);
            Ok(())
        }

        UsersCommand::Show { user } => show(session, util::resolve_user_id(&session.gate, &user)?),

        UsersCommand::Add(args) => {
            let request = add_request(args)?;
            let saved = users.save(&session.actor, None, &request)?;
            session.status(&saved.message);
            show(session, saved.user.id)
        }

        UsersCommand::Edit(args) => {
            let id = util::resolve_user_id(&session.gate, &args.user)?;
            let request = edit_request(session, id, args)?;
            let saved = users.save(&session.actor, Some(id), &request)?;
            session.status(&saved.message);
            show(session, id)
        }

        UsersCommand::Delete { users: identifiers } => delete(session, &identifiers),

        UsersCommand::RemoveCert { user, cert } => {
            let id = util::resolve_user_id(&session.gate, &user)?;
            let (_, message) =
                users.delete_certificate(&session.actor, id, parse_cert_id(&cert)?)?;
            session.status(&message);
            Ok(())
        }

        UsersCommand::RemovePriv { user, privilege } => {
            let id = util::resolve_user_id(&session.gate, &user)?;
            let (_, message) = users.delete_privilege(&session.actor, id, &privilege)?;
            session.status(&message);
            Ok(())
        }
    }
}
