// ── Local user manager pages ──

use axum::Form;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde_json::json;

use gatehouse_core::model::cert::{EC_CURVES, RSA_KEY_LENGTHS};
use gatehouse_core::model::{DigestAlgorithm, KeyType};
use gatehouse_core::users::{HOSTNAME_MENU_VALUES, MAX_DASHBOARD_COLUMNS};
use gatehouse_core::{Actor, CoreError, Scope, UserAction, UserForm, UserOutcome, UserSummary};

use crate::error::WebError;
use crate::form::{self, FormData};
use crate::render::{Choice, choices};
use crate::routes::USERS_PATH;
use crate::state::{AppState, CurrentActor};

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub act: Option<String>,
    pub userid: Option<String>,
}

enum Page {
    List {
        users: Vec<UserSummary>,
        errors: Vec<String>,
        message: Option<String>,
    },
    Form {
        form: Box<UserForm>,
        errors: Vec<String>,
        message: Option<String>,
    },
    Redirect,
}

/// Map a submitted body onto a user manager action.
fn parse_action(data: &FormData) -> Result<UserAction, WebError> {
    match data.get("act") {
        Some("deluser") => Ok(UserAction::Delete {
            id: data.require_id("userid")?,
            username: data.text("username").unwrap_or_default(),
        }),
        Some("delcert") => Ok(UserAction::DeleteCertificate {
            id: data.require_id("userid")?,
            cert: data.require_id("certid")?,
        }),
        Some("delprivid") => Ok(UserAction::DeletePrivilege {
            id: data.require_id("userid")?,
            privilege: data
                .text("privid")
                .ok_or_else(|| WebError::BadRequest("missing privid".into()))?,
        }),
        _ if data.flag("dellall") => Ok(UserAction::DeleteMany {
            ids: data.ids("delete_check")?,
        }),
        _ if data.flag("save") => Ok(UserAction::Save {
            id: data.id("userid")?,
            request: Box::new(form::user_request(data)),
        }),
        Some(other) => Err(WebError::BadRequest(format!("unsupported action: {other}"))),
        None => Err(WebError::BadRequest("no action submitted".into())),
    }
}

fn selected(value: Option<&str>) -> Vec<String> {
    value.map(str::to_owned).into_iter().collect()
}

fn render_form(
    state: &AppState,
    actor: &Actor,
    form: &UserForm,
    errors: &[String],
    message: Option<&str>,
) -> Result<Response, WebError> {
    let title = if form.id.is_some() {
        "System: User Manager: Users: Edit"
    } else {
        "System: User Manager: Users: Add"
    };
    let utypes = [Scope::User, Scope::System]
        .into_iter()
        .map(|s| {
            let label = match s {
                Scope::System => "System Defined",
                Scope::User => "User Defined",
            };
            Choice::new(s.to_string(), label, form.utype == s.to_string())
        })
        .collect::<Vec<_>>();
    let cas = form
        .cas
        .iter()
        .map(|ca| {
            let value = ca.refid.to_string();
            let is_selected = form.cert.caref.as_deref() == Some(value.as_str());
            Choice::new(value, ca.descr.clone(), is_selected)
        })
        .collect::<Vec<_>>();
    let hostname_menu = std::iter::once(Choice::new(
        "",
        "Default",
        form.prefs.webgui_hostname_menu.is_none(),
    ))
    .chain(choices(
        HOSTNAME_MENU_VALUES.iter().copied(),
        &selected(form.prefs.webgui_hostname_menu.as_deref()),
    ))
    .collect::<Vec<_>>();

    state
        .templates
        .render(
            "user_edit",
            &json!({
                "title": title,
                "actor": actor.username,
                "read_only": form.read_only,
                "errors": errors,
                "message": message,
                "utypes": utypes,
                "groups": choices(form.available_groups.iter().cloned(), &form.groups),
                "themes": choices(form.themes.iter().cloned(), &selected(form.prefs.webgui_css.as_deref())),
                "fixed_menu": form.prefs.webgui_fixed_menu.as_deref() == Some("fixed"),
                "hostname_menu": hostname_menu,
                "max_columns": MAX_DASHBOARD_COLUMNS,
                "cas": cas,
                "keytypes": choices(
                    [KeyType::Rsa, KeyType::Ecdsa].iter().map(ToString::to_string),
                    &selected(form.cert.keytype.as_deref()),
                ),
                "keylens": choices(
                    RSA_KEY_LENGTHS.iter().map(ToString::to_string),
                    &selected(form.cert.keylen.as_deref()),
                ),
                "curves": choices(EC_CURVES.iter().copied(), &selected(form.cert.ecname.as_deref())),
                "digests": choices(
                    [
                        DigestAlgorithm::Sha1,
                        DigestAlgorithm::Sha224,
                        DigestAlgorithm::Sha256,
                        DigestAlgorithm::Sha384,
                        DigestAlgorithm::Sha512,
                    ]
                    .iter()
                    .map(ToString::to_string),
                    &selected(form.cert.digest.as_deref()),
                ),
                "form": form,
            }),
        )
        .map(IntoResponse::into_response)
}

fn render(state: &AppState, actor: &Actor, page: Page) -> Result<Response, WebError> {
    match page {
        Page::Redirect => Ok(Redirect::to(USERS_PATH).into_response()),
        Page::List {
            users,
            errors,
            message,
        } => state
            .templates
            .render(
                "users",
                &json!({
                    "title": "System: User Manager: Users",
                    "actor": actor.username,
                    "read_only": actor.is_read_only(),
                    "errors": errors,
                    "message": message,
                    "users": users,
                }),
            )
            .map(IntoResponse::into_response),
        Page::Form {
            form,
            errors,
            message,
        } => render_form(state, actor, &form, &errors, message.as_deref()),
    }
}

/// `GET /system/usermanager`, `?act=new`, `?act=edit&userid=`
pub async fn index(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<UserQuery>,
) -> Result<Response, WebError> {
    let action = match query.act.as_deref() {
        Some("new") => UserAction::New,
        Some("edit") => UserAction::Edit {
            id: form::parse_id("userid", query.userid.as_deref())?
                .ok_or_else(|| WebError::BadRequest("missing userid".into()))?,
        },
        _ => UserAction::List,
    };

    let who = actor.clone();
    let page = state
        .blocking(move |gate| {
            Ok(match gate.users().dispatch(&who, action)? {
                UserOutcome::List(users) => Page::List {
                    users,
                    errors: Vec::new(),
                    message: None,
                },
                UserOutcome::Form(form) => Page::Form {
                    form,
                    errors: Vec::new(),
                    message: None,
                },
                _ => Page::Redirect,
            })
        })
        .await?;
    render(&state, &actor, page)
}

/// `POST /system/usermanager`
pub async fn submit(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, WebError> {
    let action = parse_action(&FormData::from(pairs))?;

    let who = actor.clone();
    let page = state
        .blocking(move |gate| {
            let users = gate.users();
            if let UserAction::Save { id, request } = action {
                return match users.save(&who, id, &request) {
                    Ok(_) => Ok(Page::Redirect),
                    Err(err) => match err.form_messages() {
                        Some(errors) => Ok(Page::Form {
                            form: Box::new(users.rejected_form(&who, id, &request)?),
                            errors,
                            message: None,
                        }),
                        None => Err(err.into()),
                    },
                };
            }

            match users.dispatch(&who, action) {
                Ok(UserOutcome::Deleted(report)) if report.is_clean() => Ok(Page::Redirect),
                Ok(UserOutcome::Deleted(report)) => Ok(Page::List {
                    users: users.list(&who)?,
                    errors: report.errors,
                    message: report.message,
                }),
                Ok(UserOutcome::Updated { form, message }) => Ok(Page::Form {
                    form,
                    errors: Vec::new(),
                    message: Some(message),
                }),
                // Stale row or association: the list is already current.
                Ok(_) | Err(CoreError::NotFound { .. }) => Ok(Page::Redirect),
                Err(err) => match err.form_messages() {
                    Some(errors) => Ok(Page::List {
                        users: users.list(&who)?,
                        errors,
                        message: None,
                    }),
                    None => Err(err.into()),
                },
            }
        })
        .await?;
    render(&state, &actor, page)
}
