use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::response::{ErrResp, MsgResp};

/// Failures that can stop the process from starting.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration Error: {0}")]
    Config(String),
}

/// Every way a request can fail, as seen by the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The body is not syntactically valid JSON.
    #[error("bad JSON")]
    BadJson,

    /// Valid JSON that is missing a field, has an empty field or a wrong type.
    #[error("invalid JSON")]
    InvalidJson,

    /// A date or query parameter was rejected before reaching storage.
    #[error("{error}: {param}={value}")]
    BadParam {
        param: &'static str,
        value: String,
        error: &'static str,
    },

    #[error("invalid task id")]
    NotFound,

    /// The store refused the due date.
    #[error("bad date: {value}")]
    DateRejected { value: String },

    /// Any other storage failure. Details are logged, never returned.
    #[error("action fail: {id}")]
    ActionFailed { id: String },
}

impl ApiError {
    pub fn bad_date_format(value: impl Into<String>) -> Self {
        Self::BadParam {
            param: "date",
            value: value.into(),
            error: "bad date format",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadJson | ApiError::BadParam { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::DateRejected { .. } => StatusCode::CONFLICT,
            ApiError::ActionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            ApiError::BadJson => (status, Json(ErrResp::bare("bad JSON"))).into_response(),
            ApiError::InvalidJson => (status, Json(ErrResp::bare("invalid JSON"))).into_response(),
            ApiError::BadParam {
                param,
                value,
                error,
            } => (status, Json(ErrResp::new(param, value, error))).into_response(),
            ApiError::NotFound => (status, Json(MsgResp::new("invalid task id"))).into_response(),
            ApiError::DateRejected { value } => {
                (status, Json(ErrResp::new("date", value, "bad date"))).into_response()
            }
            ApiError::ActionFailed { id } => {
                (status, Json(ErrResp::new("id", id, "action fail"))).into_response()
            }
        }
    }
}
