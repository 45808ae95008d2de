use std::collections::BTreeMap;

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Field name to message, rendered as `details` in 400 responses.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("sign in required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = match &self {
            AppError::Internal(err) => {
                tracing::error!("request failed: {err:?}");
                json!({
                    "success": false,
                    "error": code,
                    "message": "something went wrong",
                })
            }
            AppError::Validation(details) => json!({
                "success": false,
                "error": code,
                "message": self.to_string(),
                "details": details,
            }),
            _ => json!({
                "success": false,
                "error": code,
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        let mut errors = FieldErrors::default();
        for (path, error) in report.iter() {
            let field = camel_case(&path.to_string());
            let field = if field.is_empty() { "body".to_owned() } else { field };
            errors.add(field, error.message().to_string());
        }
        AppError::Validation(errors)
    }
}

/// `experiences[0].start_date` -> `experiences[0].startDate`, matching the wire names.
fn camel_case(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut upper = false;
    for c in path.chars() {
        match c {
            '_' if out.ends_with(|p: char| p.is_alphanumeric()) => upper = true,
            c if upper => {
                out.extend(c.to_uppercase());
                upper = false;
            }
            c => out.push(c),
        }
    }
    out
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(serde_json::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(time::error::Format);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_paths_use_wire_names() {
        assert_eq!(camel_case("start_date"), "startDate");
        assert_eq!(camel_case("experiences[0].start_date"), "experiences[0].startDate");
        assert_eq!(camel_case("links[2].url"), "links[2].url");
        assert_eq!(camel_case(""), "");
    }
}
