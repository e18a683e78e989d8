use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use gatehouse_core::{Actor, Gatehouse};

use crate::error::WebError;
use crate::render::Templates;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<Gatehouse>,
    pub templates: Arc<Templates>,
    /// Lowercase name of the header carrying the authenticated username.
    pub user_header: Arc<str>,
}

impl AppState {
    pub fn new(gate: Arc<Gatehouse>, user_header: &str) -> Result<Self, WebError> {
        Ok(Self {
            gate,
            templates: Arc::new(Templates::new()?),
            user_header: Arc::from(user_header.to_ascii_lowercase()),
        })
    }

    /// Run a core call on the blocking pool. Store access is file IO and
    /// password hashing is CPU bound.
    pub(crate) async fn blocking<T, F>(&self, f: F) -> Result<T, WebError>
    where
        F: FnOnce(&Gatehouse) -> Result<T, WebError> + Send + 'static,
        T: Send + 'static,
    {
        let gate = Arc::clone(&self.gate);
        tokio::task::spawn_blocking(move || f(&gate)).await?
    }
}

/// The operator making the request, resolved from the trusted header.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(state.user_header.as_ref())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(WebError::Unauthorized)?
            .to_owned();

        let lookup = username.clone();
        let actor = state
            .blocking(move |gate| Ok(gate.actor(&lookup)?))
            .await?;
        actor.map(Self).ok_or(WebError::Forbidden(username))
    }
}
