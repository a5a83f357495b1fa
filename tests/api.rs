use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use love_unfolds::{
    config::AllowedOrigins,
    domain::{MomentFilter, MomentRepository, MomentSlice},
    errors::RepoError,
    memory::InMemoryMomentRepository,
    models::{Moment, MAX_MOMENT_BYTES},
    routes::{create_router, BODY_LIMIT_BYTES},
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn app_with(repo: Arc<dyn MomentRepository>) -> Router {
    create_router(AppState::new(repo), &AllowedOrigins::Any)
}

fn app() -> (Router, Arc<InMemoryMomentRepository>) {
    let repo = Arc::new(InMemoryMomentRepository::new());
    (app_with(repo.clone()), repo)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).expect("request should build"))
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create(app: &Router, title: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/moments",
        Some(json!({ "title": title, "message": "A day to remember" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn health_route_responds() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Love Unfolds Backend Running"));
}

#[tokio::test]
async fn create_returns_stored_moment() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/moments",
        Some(json!({
            "title": "First date",
            "message": "Coffee that lasted five hours",
            "creator": "sam",
            "tags": ["coffee", "firsts"],
            "selectedFile": "data:image/png;base64,iVBORw0KGgo="
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(Uuid::parse_str(body["_id"].as_str().unwrap()).is_ok());
    assert_eq!(body["title"], "First date");
    assert_eq!(body["creator"], "sam");
    assert_eq!(body["tags"], json!(["coffee", "firsts"]));
    assert_eq!(body["selectedFile"], "data:image/png;base64,iVBORw0KGgo=");
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn create_without_message_is_rejected_and_not_stored() {
    let (app, repo) = app();
    let (status, body) = send(&app, Method::POST, "/moments", Some(json!({ "title": "Lonely" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("message"));
    assert_eq!(repo.len().await, 0);
}

#[tokio::test]
async fn create_with_malformed_json_is_rejected() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::post("/moments")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_defaults_to_first_page_of_five_newest_first() {
    let (app, _) = app();
    for i in 0..6 {
        create(&app, &format!("Moment {i}")).await;
    }

    let (status, body) = send(&app, Method::GET, "/moments", None).await;
    assert_eq!(status, StatusCode::OK);
    let moments = body["moments"].as_array().unwrap();
    assert_eq!(moments.len(), 5);
    assert_eq!(moments[0]["title"], "Moment 5");
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 1);
}

#[tokio::test]
async fn second_page_of_seven_holds_two() {
    let (app, _) = app();
    for i in 0..7 {
        create(&app, &format!("Moment {i}")).await;
    }

    let (status, body) = send(&app, Method::GET, "/moments?page=2&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["moments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Moment 1", "Moment 0"]);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 2);
}

#[tokio::test]
async fn search_matches_title_case_insensitively() {
    let (app, _) = app();
    create(&app, "Abc Day").await;
    create(&app, "Picnic").await;

    let (_, body) = send(&app, Method::GET, "/moments?search=ab&page=1&limit=5", None).await;
    let moments = body["moments"].as_array().unwrap();
    assert_eq!(moments.len(), 1);
    assert_eq!(moments[0]["title"], "Abc Day");
    assert_eq!(body["totalPages"], 1);
}

#[tokio::test]
async fn space_search_only_matches_titles_with_a_space() {
    let (app, _) = app();
    create(&app, "Abc Day").await;
    create(&app, "Picnic").await;

    let (_, body) = send(&app, Method::GET, "/moments?search=%20", None).await;
    let moments = body["moments"].as_array().unwrap();
    assert_eq!(moments.len(), 1);
    assert_eq!(moments[0]["title"], "Abc Day");
}

#[tokio::test]
async fn empty_store_has_zero_pages() {
    let (app, _) = app();
    let (_, body) = send(&app, Method::GET, "/moments?search=", None).await;
    assert_eq!(body["moments"], json!([]));
    assert_eq!(body["totalPages"], 0);
    assert_eq!(body["currentPage"], 1);
}

#[tokio::test]
async fn oversized_image_is_rejected_and_not_stored() {
    let (app, repo) = app();
    let image = format!("data:image/jpeg;base64,{}", "A".repeat(MAX_MOMENT_BYTES));
    let (status, body) = send(
        &app,
        Method::POST,
        "/moments",
        Some(json!({ "title": "Phone photo", "message": "Too big", "selectedFile": image })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("too large"));
    assert_eq!(repo.len().await, 0);
}

#[tokio::test]
async fn body_over_the_router_limit_is_a_client_error() {
    let (app, repo) = app();
    let image = "A".repeat(BODY_LIMIT_BYTES + 1);
    let (status, _) = send(
        &app,
        Method::POST,
        "/moments",
        Some(json!({ "title": "Huge", "message": "Way too big", "selectedFile": image })),
    )
    .await;

    assert!(status.is_client_error());
    assert_eq!(repo.len().await, 0);
}

#[tokio::test]
async fn non_numeric_page_is_rejected() {
    let (app, _) = app();
    let (status, _) = send(&app, Method::GET, "/moments?page=two", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_moment() {
    let (app, repo) = app();
    let created = create(&app, "Temporary").await;
    let id = created["_id"].as_str().unwrap();

    let (status, body) = send(&app, Method::DELETE, &format!("/moments/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Moment deleted");
    assert_eq!(repo.len().await, 0);
}

#[tokio::test]
async fn delete_of_unknown_id_succeeds_and_keeps_others() {
    let (app, repo) = app();
    create(&app, "Keeper").await;

    let (status, _) = send(&app, Method::DELETE, &format!("/moments/{}", Uuid::now_v7()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn delete_with_malformed_id_is_rejected() {
    let (app, _) = app();
    let (status, _) = send(&app, Method::DELETE, "/moments/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Store whose every call fails, standing in for an unreachable database.
struct FailingRepository;

#[async_trait::async_trait]
impl MomentRepository for FailingRepository {
    async fn insert(&self, _moment: &Moment) -> Result<(), RepoError> {
        Err(RepoError::BackendError(anyhow::anyhow!("store unreachable")))
    }

    async fn list(&self, _filter: &MomentFilter, _skip: u64, _limit: u64) -> Result<MomentSlice, RepoError> {
        Err(RepoError::BackendError(anyhow::anyhow!("store unreachable")))
    }

    async fn delete_by_id(&self, _id: Uuid) -> Result<(), RepoError> {
        Err(RepoError::BackendError(anyhow::anyhow!("store unreachable")))
    }
}

#[tokio::test]
async fn store_failures_surface_as_server_errors() {
    let app = app_with(Arc::new(FailingRepository));

    let (status, body) = send(&app, Method::GET, "/moments", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("store unreachable"));

    let (status, _) = send(&app, Method::DELETE, &format!("/moments/{}", Uuid::now_v7()), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn failed_store_write_on_create_is_a_server_error() {
    let app = app_with(Arc::new(FailingRepository));
    let (status, body) = send(
        &app,
        Method::POST,
        "/moments",
        Some(json!({ "title": "Sunset", "message": "On the pier" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("store unreachable"));
}

#[tokio::test]
async fn validation_runs_before_the_store_is_touched() {
    let app = app_with(Arc::new(FailingRepository));
    let (status, _) = send(&app, Method::POST, "/moments", Some(json!({ "message": "no title" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
