use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

/// Error returned from route handlers.
///
/// Anything convertible into `anyhow::Error` becomes `Internal`, so handlers
/// can use `?` on storage calls directly.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(message) => {
                tracing::warn!(%message, "rejected request");
                message
            }
            Self::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                "Something went wrong, try refreshing".to_string()
            }
        };
        let body = html! {
            div class="rounded bg-red-100 text-red-700 p-4" role="alert" { (message) }
        };
        (status, body).into_response()
    }
}
