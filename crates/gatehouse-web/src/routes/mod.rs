pub mod portal;
pub mod users;

use axum::Router;
use axum::response::Redirect;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub const USERS_PATH: &str = "/system/usermanager";
pub const ZONES_PATH: &str = "/services/captiveportal/zones";
pub const HOSTNAMES_PATH: &str = "/services/captiveportal/hostname";
pub const HOSTNAME_EDIT_PATH: &str = "/services/captiveportal/hostname/edit";

/// Build the console router with its shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route(USERS_PATH, get(users::index).post(users::submit))
        .route(ZONES_PATH, get(portal::zones))
        .route(HOSTNAMES_PATH, get(portal::list).post(portal::delete))
        .route(HOSTNAME_EDIT_PATH, get(portal::edit).post(portal::save))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /`
async fn root() -> Redirect {
    Redirect::to(USERS_PATH)
}

/// `GET /healthz`
async fn healthz() -> &'static str {
    "ok"
}
