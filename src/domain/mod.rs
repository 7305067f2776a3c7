use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Number of tasks returned per page by the list operation.
pub const PAGE_SIZE: u32 = 10;

/// External date representation, used on the wire and in the database.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Mutable fields of a task, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: bool,
}

/// A live task as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: bool,
}

impl Task {
    /// Builds a new task from a request, assigning a fresh random identifier.
    pub fn new(req: TaskRequest) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), req)
    }

    pub fn with_id(id: impl Into<String>, req: TaskRequest) -> Self {
        Self {
            id: id.into(),
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            status: req.status,
        }
    }
}

/// Filters and page selection for listing live tasks.
///
/// `None` means "no constraint" for both filters. Pages are zero-indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub due_date: Option<NaiveDate>,
    pub status: Option<bool>,
}

impl ListQuery {
    /// Number of rows skipped before the requested page starts.
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(PAGE_SIZE)
    }
}
