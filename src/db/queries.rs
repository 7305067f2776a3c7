use crate::domain::{ListQuery, PAGE_SIZE, Task, TaskRequest};
use crate::ports::{StoreError, StoreResult, TaskStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::error::ErrorKind;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use std::future::Future;
use std::time::Duration;

/// Ceiling applied to every store operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const INSERT_TASK: &str = r#"
    INSERT INTO tasks (id, title, description, due_date, status)
    VALUES (?, ?, ?, ?, ?)
"#;

const SELECT_LIVE_TASK: &str = r#"
    SELECT id, title, description, due_date, status
    FROM tasks
    WHERE id = ? AND deleted_at IS NULL
"#;

const UPDATE_LIVE_TASK: &str = r#"
    UPDATE tasks
    SET title = ?, description = ?, due_date = ?, status = ?
    WHERE id = ? AND deleted_at IS NULL
"#;

const SOFT_DELETE_TASK: &str = r#"
    UPDATE tasks
    SET deleted_at = ?
    WHERE id = ? AND deleted_at IS NULL
"#;

/// SQLite-backed [`TaskStore`].
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs `fut` under the store's timeout; expiry abandons the operation.
    pub(crate) async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation,
                after: self.timeout,
            }),
        }
    }

    async fn begin(&self, operation: &'static str) -> StoreResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| StoreError::storage(operation, e))
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create(&self, req: TaskRequest) -> StoreResult<Task> {
        const OP: &str = "create task";
        let task = Task::new(req);

        self.bounded(OP, async {
            let mut tx = self.begin(OP).await?;
            let outcome = sqlx::query(INSERT_TASK)
                .bind(&task.id)
                .bind(&task.title)
                .bind(&task.description)
                .bind(task.due_date)
                .bind(task.status)
                .execute(&mut *tx)
                .await
                .map(|_| ())
                .map_err(|e| classify(OP, e));

            finish(tx, outcome, OP).await
        })
        .await?;

        Ok(task)
    }

    async fn get(&self, id: &str) -> StoreResult<Task> {
        const OP: &str = "get task";

        self.bounded(OP, async {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| StoreError::storage(OP, e))?;

            sqlx::query_as::<_, Task>(SELECT_LIVE_TASK)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| classify(OP, e))?
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn update(&self, id: &str, req: TaskRequest) -> StoreResult<Task> {
        const OP: &str = "update task";

        self.bounded(OP, async {
            let mut tx = self.begin(OP).await?;
            let outcome = sqlx::query(UPDATE_LIVE_TASK)
                .bind(&req.title)
                .bind(&req.description)
                .bind(req.due_date)
                .bind(req.status)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(OP, e))
                .and_then(|result| match result.rows_affected() {
                    0 => Err(StoreError::NotFound),
                    _ => Ok(()),
                });

            finish(tx, outcome, OP).await
        })
        .await?;

        Ok(Task::with_id(id, req))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        const OP: &str = "delete task";

        self.bounded(OP, async {
            let mut tx = self.begin(OP).await?;
            let outcome = sqlx::query(SOFT_DELETE_TASK)
                .bind(Utc::now())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(OP, e))
                .and_then(|result| match result.rows_affected() {
                    0 => Err(StoreError::NotFound),
                    _ => Ok(()),
                });

            finish(tx, outcome, OP).await
        })
        .await
    }

    async fn list(&self, query: ListQuery) -> StoreResult<Vec<Task>> {
        const OP: &str = "list tasks";

        self.bounded(OP, async {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| StoreError::storage(OP, e))?;

            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT id, title, description, due_date, status FROM tasks WHERE deleted_at IS NULL",
            );
            if let Some(due_date) = query.due_date {
                qb.push(" AND due_date = ").push_bind(due_date);
            }
            if let Some(status) = query.status {
                qb.push(" AND status = ").push_bind(status);
            }
            qb.push(" ORDER BY due_date ASC, id ASC LIMIT ")
                .push_bind(i64::from(PAGE_SIZE))
                .push(" OFFSET ")
                .push_bind(query.offset());

            qb.build_query_as::<Task>()
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| StoreError::storage(OP, e))
        })
        .await
    }
}

/// Commits on success, rolls back otherwise.
///
/// Commit and rollback failures are logged. A failed rollback returns the
/// original error unchanged.
async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    outcome: StoreResult<T>,
    operation: &'static str,
) -> StoreResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(|e| {
                tracing::error!(operation, error = %e, "transaction commit failed");
                StoreError::storage(operation, e)
            })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(operation, error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}

/// Maps backend errors onto the store's closed error set.
fn classify(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(ref db_err) if matches!(db_err.kind(), ErrorKind::CheckViolation) => {
            StoreError::DateConstraintViolation
        }
        other => StoreError::storage(operation, other),
    }
}
