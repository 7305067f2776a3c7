use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::error::Category;

use crate::domain::{DATE_FORMAT, ListQuery, TaskRequest};
use crate::errors::ApiError;

/// Request body for creating or replacing a task.
#[derive(Debug, Deserialize)]
pub struct TaskBody {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub status: bool,
}

impl TaskBody {
    /// Checks field presence first, then the due date format.
    pub fn validate(self) -> Result<TaskRequest, ApiError> {
        if self.title.is_empty() || self.description.is_empty() || self.due_date.is_empty() {
            return Err(ApiError::InvalidJson);
        }

        let due_date = parse_date(&self.due_date)?;

        Ok(TaskRequest {
            title: self.title,
            description: self.description,
            due_date,
            status: self.status,
        })
    }
}

/// Extractor yielding a validated [`TaskRequest`] from a JSON body.
///
/// Unparseable JSON is rejected as [`ApiError::BadJson`], well-formed JSON that
/// does not fit [`TaskBody`] as [`ApiError::InvalidJson`]. The content type is
/// not checked.
pub struct TaskPayload(pub TaskRequest);

impl<S> FromRequest<S> for TaskPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|err| {
            tracing::error!(error = %err, "failed to read request body");
            ApiError::BadJson
        })?;

        let body: TaskBody = serde_json::from_slice(&bytes).map_err(|err| {
            tracing::error!(error = %err, "request body rejected");
            match err.classify() {
                Category::Data => ApiError::InvalidJson,
                Category::Syntax | Category::Eof | Category::Io => ApiError::BadJson,
            }
        })?;

        let req = body.validate().inspect_err(|err| {
            tracing::error!(error = %err, "request body failed validation");
        })?;

        tracing::info!("request body decoded");
        Ok(TaskPayload(req))
    }
}

/// Raw query parameters of the list endpoint. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    /// Validates `date`, `status` and `page`, in that order.
    pub fn validate(&self) -> Result<ListQuery, ApiError> {
        let due_date = present(&self.date).map(parse_date).transpose()?;

        let status = present(&self.status)
            .map(|value| {
                parse_status(value).ok_or_else(|| ApiError::BadParam {
                    param: "status",
                    value: value.to_owned(),
                    error: "bad status",
                })
            })
            .transpose()?;

        let page = present(&self.page)
            .map(|value| {
                parse_page(value).ok_or_else(|| ApiError::BadParam {
                    param: "page",
                    value: value.to_owned(),
                    error: "bad page",
                })
            })
            .transpose()?
            .unwrap_or(0);

        Ok(ListQuery {
            page,
            due_date,
            status,
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    let shaped = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !shaped {
        return Err(ApiError::bad_date_format(value));
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ApiError::bad_date_format(value))
}

fn parse_status(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_page(value: &str) -> Option<u32> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
