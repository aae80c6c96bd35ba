//! End-to-end request tests against the router with the in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use listy::db::{Gateway, MemoryGateway};
use listy::repo::{TaskRepo, TASK_COLLECTION};
use listy::{build_router, AppState};
use listy_shared::Task;
use tower::ServiceExt;

async fn setup() -> (Router, MemoryGateway) {
    let gateway = MemoryGateway::new("listy");
    gateway.bootstrap(TASK_COLLECTION).await.unwrap();
    let router = build_router(AppState::new(Arc::new(gateway.clone())));
    (router, gateway)
}

async fn stored_tasks(gateway: &MemoryGateway) -> Vec<Task> {
    let mut conn = gateway.acquire().await.unwrap();
    TaskRepo::new(&mut conn).list_all().await.unwrap()
}

async fn get(router: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn post_form(router: &Router, body: &'static str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn assert_redirects_home(response: &Response) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn index_renders_empty_list_and_form() {
    let (router, gateway) = setup().await;

    let response = get(&router, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("<form"));
    assert!(body.contains("Nothing to do."));
    assert_eq!(gateway.open_connections(), 0);
}

#[tokio::test]
async fn create_redirects_and_persists_one_task() {
    let (router, gateway) = setup().await;
    let before = stored_tasks(&gateway).await;

    let response = post_form(&router, "label=Buy+milk").await;
    assert_redirects_home(&response);

    let after = stored_tasks(&gateway).await;
    let new: Vec<_> = after.iter().filter(|t| !before.contains(t)).collect();
    assert_eq!(new.len(), 1);
    assert_eq!(new[0].name, "Buy milk");
    assert!(before.iter().all(|t| t.id != new[0].id));

    let body = body_text(get(&router, "/").await).await;
    assert!(body.contains("Buy milk"));
    assert!(body.contains(&format!("/delete/{}", new[0].id)));
}

#[tokio::test]
async fn empty_label_rerenders_form_with_message() {
    let (router, gateway) = setup().await;
    post_form(&router, "label=Walk+dog").await;
    let before = stored_tasks(&gateway).await;

    for body in ["label=", "label=+++", ""] {
        let response = post_form(&router, body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("label cannot be empty"));
        assert!(html.contains("Walk dog"));
    }

    assert_eq!(stored_tasks(&gateway).await, before);
    assert_eq!(gateway.open_connections(), 0);
}

#[tokio::test]
async fn delete_removes_task_and_redirects() {
    let (router, gateway) = setup().await;
    post_form(&router, "label=Buy+milk").await;
    let id = stored_tasks(&gateway).await[0].id.clone();

    let response = get(&router, &format!("/delete/{id}")).await;
    assert_redirects_home(&response);

    assert!(stored_tasks(&gateway).await.iter().all(|t| t.id != id));
}

#[tokio::test]
async fn deleting_unknown_id_is_a_no_op() {
    let (router, gateway) = setup().await;
    post_form(&router, "label=Buy+milk").await;
    let before = stored_tasks(&gateway).await;

    let response = get(&router, "/delete/does-not-exist").await;
    assert_redirects_home(&response);

    assert_eq!(stored_tasks(&gateway).await, before);
}

#[tokio::test]
async fn create_list_delete_scenario() {
    let (router, gateway) = setup().await;
    assert!(stored_tasks(&gateway).await.is_empty());

    post_form(&router, "label=Buy+milk").await;
    let tasks = stored_tasks(&gateway).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "Buy milk");

    post_form(&router, "label=Walk+dog").await;
    let tasks = stored_tasks(&gateway).await;
    assert_eq!(tasks.len(), 2);

    get(&router, &format!("/delete/{}", tasks[0].id)).await;
    let tasks = stored_tasks(&gateway).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "Walk dog");
}

#[tokio::test]
async fn unreachable_database_returns_503() {
    let (router, gateway) = setup().await;
    post_form(&router, "label=Buy+milk").await;
    gateway.set_offline(true);

    let response = get(&router, "/").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_text(response).await;
    assert!(body.contains("Database connection could not be established."));
    assert!(!body.contains("Buy milk"));

    let response = post_form(&router, "label=Walk+dog").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = get(&router, "/delete/anything").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    gateway.set_offline(false);
    let tasks = stored_tasks(&gateway).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(gateway.open_connections(), 0);
}

#[tokio::test]
async fn storage_failure_mid_request_is_500() {
    // Never bootstrapped: connections open but the collection is missing.
    let gateway = MemoryGateway::new("listy");
    let router = build_router(AppState::new(Arc::new(gateway.clone())));

    let response = get(&router, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(gateway.open_connections(), 0);
}

#[tokio::test]
async fn concurrent_creates_are_all_accepted() {
    let (router, gateway) = setup().await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move { post_form(&router, "label=Parallel").await.status() })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::SEE_OTHER);
    }

    let tasks = stored_tasks(&gateway).await;
    assert_eq!(tasks.len(), 10);
    assert_eq!(gateway.open_connections(), 0);
}

#[tokio::test]
async fn non_form_post_is_rejected_without_storing() {
    let (router, gateway) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"label":"Buy milk"}"#))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(stored_tasks(&gateway).await.is_empty());
    assert_eq!(gateway.open_connections(), 0);
}

#[tokio::test]
async fn markup_in_labels_is_served_escaped() {
    let (router, _gateway) = setup().await;
    post_form(&router, "label=%3Cscript%3Ealert(1)%3C%2Fscript%3E").await;

    let body = body_text(get(&router, "/").await).await;
    assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!body.contains("<script>"));
}
