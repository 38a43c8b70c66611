//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler can produce ends up here and is rendered as the same JSON
//! envelope, `{"success": false, "message": ...}`, so clients never see partial responses.
//!
//! `AppError` implements `actix_web::error::ResponseError`. `From` conversions exist for
//! `sqlx::Error`, `validator::ValidationErrors`, `jsonwebtoken::errors::Error` and
//! `bcrypt::BcryptError`, which keeps the `?` operator usable in handlers and services.
//! The extractor error handlers at the bottom route malformed bodies, query strings and
//! path segments into the same envelope.

use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::StatusCode,
    HttpRequest, HttpResponse,
};
use lazy_static::lazy_static;
use serde_json::json;
use validator::ValidationErrors;

lazy_static! {
    /// Error detail (the `stack` field) is only exposed when `APP_ENV=development`.
    static ref EXPOSE_ERROR_DETAIL: bool = std::env::var("APP_ENV")
        .map(|env| env.eq_ignore_ascii_case("development"))
        .unwrap_or(false);
}

const GENERIC_SERVER_ERROR: &str = "Server Error";

/// Represents all possible errors that can occur within the application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed request input (HTTP 400).
    #[error("{0}")]
    BadRequest(String),
    /// Input that failed field validation or referenced something invalid (HTTP 400).
    #[error("{0}")]
    Validation(String),
    /// A unique constraint was hit, e.g. an email that is already registered (HTTP 400).
    #[error("{0}")]
    Duplicate(String),
    /// Authentication is missing, invalid or expired, or credentials are wrong (HTTP 401).
    #[error("{0}")]
    Unauthorized(String),
    /// The actor is authenticated but not allowed to perform the action (HTTP 403).
    #[error("{0}")]
    Forbidden(String),
    /// The requested resource does not exist (HTTP 404).
    #[error("{0}")]
    NotFound(String),
    /// Any other store failure (HTTP 500).
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
    /// Unexpected server-side failure (HTTP 500).
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) if !*EXPOSE_ERROR_DETAIL => {
                GENERIC_SERVER_ERROR.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::Duplicate(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{:?}", self);
        }

        let mut body = json!({
            "success": false,
            "message": self.client_message(),
        });
        if *EXPOSE_ERROR_DETAIL {
            body["stack"] = json!(format!("{:?}", self));
        }

        HttpResponse::build(status).json(body)
    }
}

/// Maps store failures onto the error taxonomy.
///
/// `RowNotFound` becomes `NotFound`; constraint violations are client errors
/// (unique → `Duplicate`, foreign key and check → `Validation`); everything else
/// is an internal `Database` error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        let code = match &error {
            sqlx::Error::Database(db_error) => db_error.code().map(|code| code.into_owned()),
            _ => None,
        };

        match (error, code.as_deref()) {
            (sqlx::Error::RowNotFound, _) => AppError::NotFound("Resource not found".into()),
            (_, Some("23505")) => AppError::Duplicate("Duplicate field value entered".into()),
            (_, Some("23503")) => {
                AppError::Validation("Referenced resource does not exist".into())
            }
            (_, Some("23514")) => AppError::Validation("Value is out of the allowed range".into()),
            (error, _) => AppError::Database(error),
        }
    }
}

/// Joins the messages of all failed fields, ordered by field name.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        let message = fields
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect::<Vec<_>>()
            .join(", ");

        AppError::Validation(message)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        match error.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Unauthorized("Token expired".into())
            }
            _ => AppError::Unauthorized("Invalid token".into()),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(format!("Password hashing failed: {}", error))
    }
}

/// Malformed or mistyped JSON bodies (including unknown enum values) are a 400.
pub fn json_error_handler(error: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid request body: {}", error)).into()
}

/// Unparseable query strings are a 400.
pub fn query_error_handler(error: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid query parameters: {}", error)).into()
}

/// A path id that cannot be parsed can never resolve to a record.
pub fn path_error_handler(_error: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound("Resource not found".into()).into()
}
