use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use gatehouse_core::CoreError;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("authentication required")]
    Unauthorized,

    #[error("user '{0}' is not permitted to use the console")]
    Forbidden(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("template error: {0}")]
    Template(Box<handlebars::TemplateError>),

    #[error("render error: {0}")]
    Render(Box<handlebars::RenderError>),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<handlebars::TemplateError> for WebError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(Box::new(err))
    }
}

impl From<handlebars::RenderError> for WebError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Render(Box::new(err))
    }
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::Core(CoreError::ReadOnly) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Core(CoreError::NotFound { .. } | CoreError::ZoneNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            Self::Core(CoreError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Core(_) | Self::Template(_) | Self::Render(_) | Self::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        let mut headers = axum::http::HeaderMap::new();
        if matches!(self, Self::Unauthorized) {
            headers.insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Basic realm=\"gatehouse\""),
            );
        }
        (status, headers, self.to_string()).into_response()
    }
}
