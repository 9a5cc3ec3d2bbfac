use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::templates;

/// Failures a handler can end with. Validation problems are not errors here:
/// they re-render the form.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, templates::errors::not_found()).into_response()
            }
            AppError::Forbidden => {
                (StatusCode::FORBIDDEN, templates::errors::forbidden()).into_response()
            }
            AppError::BadRequest(msg) => {
                warn!(%msg, "bad request");
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
            AppError::Internal(e) => {
                error!(error = %format!("{e:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    templates::errors::server_error(),
                )
                    .into_response()
            }
        }
    }
}

pub trait OrNotFound<T> {
    fn or_not_found(self) -> Result<T, AppError>;
}

impl<T> OrNotFound<T> for anyhow::Result<Option<T>> {
    fn or_not_found(self) -> Result<T, AppError> {
        self?.ok_or(AppError::NotFound)
    }
}
