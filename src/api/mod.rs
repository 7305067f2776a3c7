pub mod dto;
pub mod response;

use crate::api::dto::{ListParams, TaskPayload};
use crate::api::response::MsgResp;
use crate::domain::Task;
use crate::errors::ApiError;
use crate::ports::{StoreError, TaskStore};
use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, Request, State, rejection::QueryRejection},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use uuid::Uuid;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
}

#[derive(Clone, Copy)]
pub struct MakeUuidRequest;

impl MakeRequestId for MakeUuidRequest {
    fn make_request_id<B>(&mut self, _: &axum::http::Request<B>) -> Option<RequestId> {
        let uuid = Uuid::new_v4().to_string();

        let header_value =
            HeaderValue::from_str(&uuid).unwrap_or(HeaderValue::from_static("invalid-uuid"));

        Some(RequestId::new(header_value))
    }
}

/// Build the application router with all routes and middleware
///
/// # Arguments
///
/// * `store` - The storage port the handlers delegate to
///
/// # Returns
/// * `Router` - The configured Axum router, serving everything under `/api`
pub fn router(store: Arc<dyn TaskStore>) -> Router {
    let state = AppState { store };

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .route("/task", post(create_task))
        .route(
            "/task/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks", get(list_tasks));

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let req_id = request
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or("bad-ascii"))
                        .unwrap_or("unknown");

                    tracing::info_span!(
                        "http_request",
                        request_id = %req_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeUuidRequest))
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("handler panicked");
    ApiError::ActionFailed { id: String::new() }.into_response()
}

/// Translates a storage failure into the client-facing error.
///
/// `date` and `id` are the values the client submitted, echoed back where the
/// response shape calls for them. The underlying error is only logged.
fn store_failure(err: StoreError, date: &str, id: &str) -> ApiError {
    match err {
        StoreError::NotFound => {
            tracing::warn!(id, "task not found");
            ApiError::NotFound
        }
        StoreError::DateConstraintViolation => {
            tracing::warn!(date, "due date rejected by store");
            ApiError::DateRejected {
                value: date.to_owned(),
            }
        }
        other @ (StoreError::Storage { .. } | StoreError::Timeout { .. }) => {
            tracing::error!(id, error = ?other, "storage operation failed");
            ApiError::ActionFailed { id: id.to_owned() }
        }
    }
}

/// Handler to create a new task
///
/// # Errors
///
/// * `ApiError::BadJson` / `ApiError::InvalidJson` / `ApiError::BadParam` - If the body is rejected
/// * `ApiError::DateRejected` - If the store refuses the due date
async fn create_task(
    State(state): State<AppState>,
    TaskPayload(req): TaskPayload,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let due_date = req.due_date.to_string();

    let task = state
        .store
        .create(req)
        .await
        .map_err(|err| store_failure(err, &due_date, ""))?;

    tracing::info!(task_id = %task.id, "task created successfully");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler to fetch a single live task
async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    tracing::info!(id = %task_id, "task id received");

    let task = state
        .store
        .get(&task_id)
        .await
        .map_err(|err| store_failure(err, "", &task_id))?;

    tracing::info!(id = %task_id, "received successfully");

    Ok(Json(task))
}

/// Handler to replace every mutable field of a task
///
/// # Errors
///
/// * `ApiError::NotFound` - If no live task has the given id
/// * `ApiError::DateRejected` - If the store refuses the due date
async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    TaskPayload(req): TaskPayload,
) -> Result<Json<Task>, ApiError> {
    tracing::info!(id = %task_id, "task id received");
    let due_date = req.due_date.to_string();

    let task = state
        .store
        .update(&task_id, req)
        .await
        .map_err(|err| store_failure(err, &due_date, &task_id))?;

    tracing::info!(id = %task_id, "task updated successfully");

    Ok(Json(task))
}

/// Handler to soft delete a task by its ID
async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<MsgResp>, ApiError> {
    tracing::info!(id = %task_id, "task id received");

    state
        .store
        .delete(&task_id)
        .await
        .map_err(|err| store_failure(err, "", &task_id))?;

    tracing::info!(id = %task_id, "deleted successfully");

    Ok(Json(MsgResp::new("success")))
}

/// Handler to list live tasks, filtered by `status` and `date`, paginated by `page`
///
/// An empty page is a successful, empty array.
async fn list_tasks(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let Query(params) = params.map_err(|err| {
        tracing::error!(error = %err, "query string rejected");
        ApiError::BadParam {
            param: "query",
            value: raw.unwrap_or_default(),
            error: "bad query",
        }
    })?;

    let query = params.validate().inspect_err(|err| {
        tracing::error!(error = %err, "list parameters rejected");
    })?;

    tracing::info!(?query, "params received");

    let tasks = state
        .store
        .list(query)
        .await
        .map_err(|err| store_failure(err, "", ""))?;

    if tasks.is_empty() {
        tracing::warn!(?query, "nothing found");
    } else {
        tracing::info!(amount = tasks.len(), "found successfully");
    }

    Ok(Json(tasks))
}
