use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use derive_more::Display;
use serde_json::json;

pub const SELECT_SUBJECT_PATH: &str = "/select_subject";

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// No subject in the session. Pages redirect, the JSON API answers 400.
    #[display(fmt = "No subject selected")]
    SubjectRequired { api: bool },

    #[display(fmt = "Database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "Template error: {}", _0)]
    Template(tera::Error),

    #[display(fmt = "Session error: {}", _0)]
    Session(jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<tera::Error> for AppError {
    fn from(e: tera::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Session(e)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SubjectRequired { api: true } => StatusCode::BAD_REQUEST,
            AppError::SubjectRequired { api: false } => StatusCode::SEE_OTHER,
            AppError::Database(_) | AppError::Template(_) | AppError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::SubjectRequired { api: false } => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, SELECT_SUBJECT_PATH))
                .finish(),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database operation failed");
                internal_error()
            }
            AppError::Template(e) => {
                tracing::error!(error = ?e, "Template rendering failed");
                internal_error()
            }
            AppError::Session(e) => {
                tracing::error!(error = %e, "Session token could not be issued");
                internal_error()
            }
            other => HttpResponse::build(other.status_code()).json(json!({
                "message": other.to_string()
            })),
        }
    }
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "message": "Internal Server Error"
    }))
}

/// True when the store rejected a write because of a UNIQUE constraint.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn missing_subject_redirects_pages() {
        let resp = AppError::SubjectRequired { api: false }.error_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            SELECT_SUBJECT_PATH
        );
    }

    #[actix_web::test]
    async fn missing_subject_is_bad_request_for_api() {
        let resp = AppError::SubjectRequired { api: true }.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "No subject selected");
    }

    #[actix_web::test]
    async fn database_errors_hide_details() {
        let resp = AppError::Database(sqlx::Error::RowNotFound).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("RowNotFound"));
    }
}
