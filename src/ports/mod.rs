//! Storage port: the contract the request handlers depend on.

use crate::domain::{ListQuery, Task, TaskRequest};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Task persistence contract. Every call targets live (not soft-deleted) rows only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// [`StoreError::DateConstraintViolation`] when the store rejects the due date.
    async fn create(&self, req: TaskRequest) -> StoreResult<Task>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no live task has this id.
    async fn get(&self, id: &str) -> StoreResult<Task>;

    /// Replaces every mutable field of a live task.
    ///
    /// The returned task is built from the input and the id, not re-read.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no live row was affected,
    /// [`StoreError::DateConstraintViolation`] when the due date is rejected.
    async fn update(&self, id: &str, req: TaskRequest) -> StoreResult<Task>;

    /// Soft deletes a live task.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no live row was affected.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Returns one page of live tasks ordered by due date. An empty page is not an error.
    async fn list(&self, query: ListQuery) -> StoreResult<Vec<Task>>;
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid task id")]
    NotFound,

    #[error("bad date")]
    DateConstraintViolation,

    #[error("{operation} failed: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl StoreError {
    pub fn storage(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Storage { operation, source }
    }
}
