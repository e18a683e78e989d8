// ── Captive portal zones and allowed hostnames ──

use axum::Form;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use gatehouse_core::model::zone::normalize_zone_name;
use gatehouse_core::{AllowedHostname, CoreError, Direction, HostnameForm};

use crate::error::WebError;
use crate::form::{self, FormData};
use crate::render::Choice;
use crate::routes::{HOSTNAMES_PATH, ZONES_PATH};
use crate::state::{AppState, CurrentActor};

#[derive(Debug, Default, Deserialize)]
pub struct ZoneQuery {
    #[serde(default)]
    pub zone: String,
    pub id: Option<String>,
}

/// Display row for the hostname list.
#[derive(Debug, Serialize)]
struct HostnameRow {
    id: String,
    hostname: String,
    dir: &'static str,
    sn: String,
    bw_up: String,
    bw_down: String,
    descr: String,
}

impl From<&AllowedHostname> for HostnameRow {
    fn from(entry: &AllowedHostname) -> Self {
        let text = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            id: entry.id.to_string(),
            hostname: entry.hostname.display(),
            dir: entry.dir.label(),
            sn: entry.sn.map(|n| n.to_string()).unwrap_or_default(),
            bw_up: text(entry.bw_up),
            bw_down: text(entry.bw_down),
            descr: entry.descr.clone(),
        }
    }
}

enum Page {
    List {
        zone: String,
        entries: Vec<AllowedHostname>,
        errors: Vec<String>,
    },
    Edit {
        form: Box<HostnameForm>,
        errors: Vec<String>,
    },
    Redirect(String),
}

fn list_location(zone: &str) -> String {
    format!("{HOSTNAMES_PATH}?zone={zone}")
}

fn direction_choices(selected: &str) -> Vec<Choice> {
    [Direction::Both, Direction::From, Direction::To]
        .into_iter()
        .map(|d| {
            let value = d.to_string();
            let is_selected = value == selected;
            Choice::new(value, d.label(), is_selected)
        })
        .collect()
}

fn render(state: &AppState, actor: &CurrentActor, page: Page) -> Result<Response, WebError> {
    let actor = &actor.0;
    match page {
        Page::Redirect(location) => Ok(Redirect::to(&location).into_response()),
        Page::List {
            zone,
            entries,
            errors,
        } => {
            let rows: Vec<HostnameRow> = entries.iter().map(HostnameRow::from).collect();
            state
                .templates
                .render(
                    "hostnames",
                    &json!({
                        "title": format!("Captive Portal: {zone}: Allowed Hostnames"),
                        "actor": actor.username,
                        "read_only": actor.is_read_only(),
                        "errors": errors,
                        "zone": zone,
                        "entries": rows,
                    }),
                )
                .map(IntoResponse::into_response)
        }
        Page::Edit { form, errors } => state
            .templates
            .render(
                "hostname_edit",
                &json!({
                    "title": format!("Captive Portal: {}: Allowed Hostnames: Edit", form.zone),
                    "actor": actor.username,
                    "read_only": actor.is_read_only(),
                    "errors": errors,
                    "directions": direction_choices(&form.dir),
                    "form": form,
                }),
            )
            .map(IntoResponse::into_response),
    }
}

/// An unknown zone sends the operator back to the zone list.
fn zone_fallback<T>(result: Result<T, CoreError>) -> Result<Result<T, Page>, WebError> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(CoreError::ZoneNotFound { .. }) => Ok(Err(Page::Redirect(ZONES_PATH.to_owned()))),
        Err(err) => Err(err.into()),
    }
}

/// `GET /services/captiveportal/zones`
pub async fn zones(State(state): State<AppState>, actor: CurrentActor) -> Result<Response, WebError> {
    let zones = state.blocking(|gate| Ok(gate.portal().zones()?)).await?;
    let who = &actor.0;
    state
        .templates
        .render(
            "zones",
            &json!({
                "title": "Captive Portal Zones",
                "actor": who.username,
                "read_only": who.is_read_only(),
                "errors": Vec::<String>::new(),
                "zones": zones,
            }),
        )
        .map(IntoResponse::into_response)
}

/// `GET /services/captiveportal/hostname?zone=`
pub async fn list(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<ZoneQuery>,
) -> Result<Response, WebError> {
    let page = state
        .blocking(move |gate| {
            Ok(match zone_fallback(gate.portal().list(&query.zone))? {
                Ok(entries) => Page::List {
                    zone: normalize_zone_name(&query.zone),
                    entries,
                    errors: Vec::new(),
                },
                Err(page) => page,
            })
        })
        .await?;
    render(&state, &actor, page)
}

/// `POST /services/captiveportal/hostname?zone=` with `act=del&id=`
pub async fn delete(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<ZoneQuery>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, WebError> {
    let data = FormData::from(pairs);
    if data.get("act") != Some("del") {
        return Err(WebError::BadRequest("unsupported action".into()));
    }
    let id = data.require_id("id")?;
    let who = actor.0.clone();

    let page = state
        .blocking(move |gate| {
            let portal = gate.portal();
            match portal.delete(&who, &query.zone, id) {
                Ok(_) | Err(CoreError::NotFound { .. }) => {
                    Ok(Page::Redirect(list_location(&normalize_zone_name(&query.zone))))
                }
                Err(CoreError::ZoneNotFound { .. }) => Ok(Page::Redirect(ZONES_PATH.to_owned())),
                Err(err) => match err.form_messages() {
                    Some(errors) => Ok(Page::List {
                        zone: normalize_zone_name(&query.zone),
                        entries: portal.list(&query.zone)?,
                        errors,
                    }),
                    None => Err(err.into()),
                },
            }
        })
        .await?;
    render(&state, &actor, page)
}

/// `GET /services/captiveportal/hostname/edit?zone=&id=`
pub async fn edit(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<ZoneQuery>,
) -> Result<Response, WebError> {
    let id = form::parse_id("id", query.id.as_deref())?;
    let page = state
        .blocking(move |gate| {
            Ok(match zone_fallback(gate.portal().form(&query.zone, id))? {
                Ok(form) => Page::Edit {
                    form: Box::new(form),
                    errors: Vec::new(),
                },
                Err(page) => page,
            })
        })
        .await?;
    render(&state, &actor, page)
}

/// `POST /services/captiveportal/hostname/edit?zone=`
pub async fn save(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<ZoneQuery>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, WebError> {
    let data = FormData::from(pairs);
    let id = match data.id("id")? {
        Some(id) => Some(id),
        None => form::parse_id("id", query.id.as_deref())?,
    };
    let request = form::hostname_request(&data);
    let who = actor.0.clone();

    let page = state
        .blocking(move |gate| {
            let result = gate.portal().save(&who, &query.zone, id, &request);
            match zone_fallback(result) {
                Ok(Ok(_)) => Ok(Page::Redirect(list_location(&normalize_zone_name(&query.zone)))),
                Ok(Err(page)) => Ok(page),
                Err(WebError::Core(err)) => match err.form_messages() {
                    Some(errors) => Ok(Page::Edit {
                        form: Box::new(HostnameForm::from_request(
                            &normalize_zone_name(&query.zone),
                            id,
                            &request,
                        )),
                        errors,
                    }),
                    None => Err(err.into()),
                },
                Err(err) => Err(err),
            }
        })
        .await?;
    render(&state, &actor, page)
}
