use crate::api::router;
use crate::domain::{ListQuery, Task, TaskRequest};
use crate::ports::{MockTaskStore, StoreError};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::util::ServiceExt;

const VALID_BODY: &str =
    r#"{"title":"test","description":"test","due_date":"2024-10-26","status":false}"#;
const TEST_TASK: &str =
    r#"{"id":"test","title":"test","description":"test","due_date":"2024-10-26","status":false}"#;

fn task_request() -> TaskRequest {
    TaskRequest {
        title: "test".into(),
        description: "test".into(),
        due_date: NaiveDate::from_ymd_opt(2024, 10, 26).unwrap(),
        status: false,
    }
}

fn storage_failure() -> StoreError {
    StoreError::storage("test", sqlx::Error::PoolTimedOut)
}

fn app(store: MockTaskStore) -> Router {
    router(Arc::new(store))
}

async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

// --- create ---

#[tokio::test]
async fn test_create_task_success() {
    let mut store = MockTaskStore::new();
    store
        .expect_create()
        .withf(|req| *req == task_request())
        .times(1)
        .returning(|req| Ok(Task::with_id("test", req)));

    let (status, body) = send(app(store), "POST", "/api/task", VALID_BODY).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, TEST_TASK);
}

#[tokio::test]
async fn test_create_task_storage_failure_hides_details() {
    let mut store = MockTaskStore::new();
    store
        .expect_create()
        .times(1)
        .returning(|_| Err(storage_failure()));

    let (status, body) = send(app(store), "POST", "/api/task", VALID_BODY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"param":"id","error":"action fail"}"#);
}

#[tokio::test]
async fn test_create_task_timeout_is_action_fail() {
    let mut store = MockTaskStore::new();
    store.expect_create().times(1).returning(|_| {
        Err(StoreError::Timeout {
            operation: "create task",
            after: std::time::Duration::from_secs(10),
        })
    });

    let (status, body) = send(app(store), "POST", "/api/task", VALID_BODY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"param":"id","error":"action fail"}"#);
}

#[tokio::test]
async fn test_create_task_date_constraint_conflict() {
    let mut store = MockTaskStore::new();
    store
        .expect_create()
        .times(1)
        .returning(|_| Err(StoreError::DateConstraintViolation));

    let (status, body) = send(app(store), "POST", "/api/task", VALID_BODY).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        r#"{"param":"date","value":"2024-10-26","error":"bad date"}"#
    );
}

#[tokio::test]
async fn test_create_task_bad_date_format() {
    let body = r#"{"title":"test","description":"test","due_date":"12345","status":false}"#;

    let (status, body) = send(app(MockTaskStore::new()), "POST", "/api/task", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"param":"date","value":"12345","error":"bad date format"}"#
    );
}

#[tokio::test]
async fn test_create_task_missing_field_is_invalid_json() {
    let body = r#"{"fail":"test","description":"test","due_date":"2024-10-26","status":false}"#;

    let (status, body) = send(app(MockTaskStore::new()), "POST", "/api/task", body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"error":"invalid JSON"}"#);
}

#[tokio::test]
async fn test_create_task_null_status_is_invalid_json() {
    let body = r#"{"title":"test","description":"test","due_date":"2024-10-26","status":null}"#;

    let (status, body) = send(app(MockTaskStore::new()), "POST", "/api/task", body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"error":"invalid JSON"}"#);
}

#[tokio::test]
async fn test_create_task_empty_title_is_invalid_json() {
    let body = r#"{"title":"","description":"test","due_date":"2024-10-26","status":true}"#;

    let (status, body) = send(app(MockTaskStore::new()), "POST", "/api/task", body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"error":"invalid JSON"}"#);
}

#[tokio::test]
async fn test_create_task_malformed_json() {
    let (status, body) = send(app(MockTaskStore::new()), "POST", "/api/task", r#"{"fail"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"bad JSON"}"#);
}

#[tokio::test]
async fn test_create_task_without_content_type() {
    let mut store = MockTaskStore::new();
    store
        .expect_create()
        .times(1)
        .returning(|req| Ok(Task::with_id("test", req)));

    let req = Request::builder()
        .method("POST")
        .uri("/api/task")
        .body(Body::from(VALID_BODY))
        .unwrap();
    let response = app(store).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

// --- get ---

#[tokio::test]
async fn test_get_task_success() {
    let mut store = MockTaskStore::new();
    store
        .expect_get()
        .withf(|id| id == "test")
        .times(1)
        .returning(|id| Ok(Task::with_id(id, task_request())));

    let (status, body) = send(app(store), "GET", "/api/task/test", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, TEST_TASK);
}

#[tokio::test]
async fn test_get_task_storage_failure() {
    let mut store = MockTaskStore::new();
    store
        .expect_get()
        .times(1)
        .returning(|_| Err(storage_failure()));

    let (status, body) = send(app(store), "GET", "/api/task/test", "").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"param":"id","value":"test","error":"action fail"}"#);
}

#[tokio::test]
async fn test_get_task_not_found() {
    let mut store = MockTaskStore::new();
    store
        .expect_get()
        .times(1)
        .returning(|_| Err(StoreError::NotFound));

    let (status, body) = send(app(store), "GET", "/api/task/unknown-id", "").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"message":"invalid task id"}"#);
}

// --- delete ---

#[tokio::test]
async fn test_delete_task_success() {
    let mut store = MockTaskStore::new();
    store
        .expect_delete()
        .withf(|id| id == "test")
        .times(1)
        .returning(|_| Ok(()));

    let (status, body) = send(app(store), "DELETE", "/api/task/test", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"success"}"#);
}

#[tokio::test]
async fn test_delete_task_storage_failure() {
    let mut store = MockTaskStore::new();
    store
        .expect_delete()
        .times(1)
        .returning(|_| Err(storage_failure()));

    let (status, body) = send(app(store), "DELETE", "/api/task/test", "").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"param":"id","value":"test","error":"action fail"}"#);
}

#[tokio::test]
async fn test_delete_task_not_found() {
    let mut store = MockTaskStore::new();
    store
        .expect_delete()
        .times(1)
        .returning(|_| Err(StoreError::NotFound));

    let (status, body) = send(app(store), "DELETE", "/api/task/test", "").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"message":"invalid task id"}"#);
}

// --- update ---

#[tokio::test]
async fn test_update_task_success() {
    let mut store = MockTaskStore::new();
    store
        .expect_update()
        .withf(|id, req| id == "test" && *req == task_request())
        .times(1)
        .returning(|id, req| Ok(Task::with_id(id, req)));

    let (status, body) = send(app(store), "PUT", "/api/task/test", VALID_BODY).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, TEST_TASK);
}

#[tokio::test]
async fn test_update_task_storage_failure() {
    let mut store = MockTaskStore::new();
    store
        .expect_update()
        .times(1)
        .returning(|_, _| Err(storage_failure()));

    let (status, body) = send(app(store), "PUT", "/api/task/test", VALID_BODY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"param":"id","value":"test","error":"action fail"}"#);
}

#[tokio::test]
async fn test_update_task_date_constraint_conflict() {
    let mut store = MockTaskStore::new();
    store
        .expect_update()
        .times(1)
        .returning(|_, _| Err(StoreError::DateConstraintViolation));

    let (status, body) = send(app(store), "PUT", "/api/task/test", VALID_BODY).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        r#"{"param":"date","value":"2024-10-26","error":"bad date"}"#
    );
}

#[tokio::test]
async fn test_update_task_not_found() {
    let mut store = MockTaskStore::new();
    store
        .expect_update()
        .times(1)
        .returning(|_, _| Err(StoreError::NotFound));

    let (status, body) = send(app(store), "PUT", "/api/task/missing", VALID_BODY).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"message":"invalid task id"}"#);
}

#[tokio::test]
async fn test_update_task_impossible_date() {
    let body = r#"{"title":"test","description":"test","due_date":"2024-13-40","status":false}"#;

    let (status, body) = send(app(MockTaskStore::new()), "PUT", "/api/task/test", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"param":"date","value":"2024-13-40","error":"bad date format"}"#
    );
}

#[tokio::test]
async fn test_update_task_missing_field_is_invalid_json() {
    let body = r#"{"fail":"test","description":"test","due_date":"2024-10-26","status":false}"#;

    let (status, body) = send(app(MockTaskStore::new()), "PUT", "/api/task/test", body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"error":"invalid JSON"}"#);
}

#[tokio::test]
async fn test_update_task_malformed_json() {
    let (status, body) =
        send(app(MockTaskStore::new()), "PUT", "/api/task/test", r#"{"fail"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"bad JSON"}"#);
}

// --- list ---

#[tokio::test]
async fn test_list_tasks_passes_filters_to_store() {
    let mut store = MockTaskStore::new();
    store
        .expect_list()
        .withf(|query| {
            *query
                == ListQuery {
                    page: 1,
                    due_date: NaiveDate::from_ymd_opt(2024, 10, 26),
                    status: Some(false),
                }
        })
        .times(1)
        .returning(|_| Ok(vec![Task::with_id("test", task_request())]));

    let (status, body) = send(
        app(store),
        "GET",
        "/api/tasks?status=false&date=2024-10-26&page=1",
        "",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("[{}]", TEST_TASK));
}

#[tokio::test]
async fn test_list_tasks_defaults_to_first_page() {
    let mut store = MockTaskStore::new();
    store
        .expect_list()
        .withf(|query| *query == ListQuery::default())
        .times(1)
        .returning(|_| Ok(vec![]));

    let (status, body) = send(app(store), "GET", "/api/tasks", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn test_list_tasks_rejects_bad_params() {
    let cases = [
        (
            "/api/tasks?date=26-10-2024",
            r#"{"param":"date","value":"26-10-2024","error":"bad date format"}"#,
        ),
        (
            "/api/tasks?status=maybe",
            r#"{"param":"status","value":"maybe","error":"bad status"}"#,
        ),
        (
            "/api/tasks?page=-1",
            r#"{"param":"page","value":"-1","error":"bad page"}"#,
        ),
    ];

    for (uri, expected) in cases {
        let (status, body) = send(app(MockTaskStore::new()), "GET", uri, "").await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, expected, "{uri}");
    }
}

#[tokio::test]
async fn test_list_tasks_repeated_key_echoes_query() {
    let (status, body) = send(
        app(MockTaskStore::new()),
        "GET",
        "/api/tasks?page=1&page=2",
        "",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        r#"{"param":"query","value":"page=1&page=2","error":"bad query"}"#
    );
}

#[tokio::test]
async fn test_list_tasks_storage_failure() {
    let mut store = MockTaskStore::new();
    store
        .expect_list()
        .times(1)
        .returning(|_| Err(storage_failure()));

    let (status, body) = send(app(store), "GET", "/api/tasks?page=3", "").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"param":"id","error":"action fail"}"#);
}

// --- middleware ---

#[tokio::test]
async fn test_handler_panic_is_action_fail() {
    let mut store = MockTaskStore::new();
    store
        .expect_delete()
        .returning(|_| panic!("store exploded"));

    let (status, body) = send(app(store), "DELETE", "/api/task/test", "").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"param":"id","error":"action fail"}"#);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let mut store = MockTaskStore::new();
    store
        .expect_get()
        .returning(|_| Err(StoreError::NotFound));

    let req = Request::builder()
        .uri("/api/task/test")
        .body(Body::empty())
        .unwrap();
    let response = app(store).oneshot(req).await.unwrap();

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("request id header");
    assert!(uuid::Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
}
