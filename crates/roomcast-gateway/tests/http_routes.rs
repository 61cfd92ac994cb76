#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

use roomcast_gateway::{app_state::AppState, config::GatewayConfig, router};

fn app() -> (AppState, Router) {
    let state = AppState::new(GatewayConfig::default()).unwrap();
    let app = router::build_router(state.clone());
    (state, app)
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn create(display_name: &str) -> Request<Body> {
    Request::post("/session/create")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("display_name={display_name}")))
        .unwrap()
}

#[tokio::test]
async fn home_page_has_create_form() {
    let (_, app) = app();
    let resp = get(app, "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("/session/create"));
}

#[tokio::test]
async fn create_redirects_to_a_resolvable_session_page() {
    let (state, app) = app();

    let resp = app.clone().oneshot(create("Alice")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with("/session/"));
    assert_eq!(state.sessions().len(), 1);

    let page = get(app, &location).await;
    assert_eq!(page.status(), StatusCode::OK);
    let html = body_text(page).await;
    let token = location.trim_start_matches("/session/");
    assert!(html.contains("<h1>Alice</h1>"), "{html}");
    assert!(html.contains(&format!("data-token=\"{token}\"")), "{html}");
    assert!(html.contains("data-unix=\""), "{html}");
}

#[tokio::test]
async fn blank_display_name_is_rejected() {
    let (state, app) = app();
    let resp = app.oneshot(create("+++")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(state.sessions().is_empty());
}

#[tokio::test]
async fn unknown_and_malformed_tokens_get_the_same_404() {
    let (_, app) = app();

    let unknown = get(app.clone(), "/session/6f1c1f8e-8f5e-4f43-9a57-0d7f1e0f2b11").await;
    let malformed = get(app.clone(), "/session/nope").await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(malformed.status(), StatusCode::NOT_FOUND);
    let page = body_text(unknown).await;
    assert!(page.contains("No such session."), "{page}");
    assert_eq!(page, body_text(malformed).await);

    let ws = get(app, "/ws/nope").await;
    assert_eq!(ws.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ops_endpoints() {
    let (state, app) = app();
    state.sessions().create("Alice");

    assert_eq!(get(app.clone(), "/healthz").await.status(), StatusCode::OK);
    assert_eq!(get(app.clone(), "/readyz").await.status(), StatusCode::OK);

    let metrics = body_text(get(app.clone(), "/metrics").await).await;
    assert!(metrics.contains("# TYPE roomcast_sessions gauge\nroomcast_sessions 1\n"), "{metrics}");
    assert!(metrics.contains("# TYPE roomcast_sessions_created_total counter\n"), "{metrics}");
    assert!(metrics.contains("roomcast_sessions_created_total 1"), "{metrics}");
    assert!(metrics.contains("roomcast_draining 0"), "{metrics}");

    state.begin_drain();
    assert_eq!(get(app, "/readyz").await.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_route_falls_back_to_404_page() {
    let (_, app) = app();
    let resp = get(app, "/no/such/page").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let ct = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(ct.starts_with("text/html"), "{ct}");
    assert!(body_text(resp).await.contains("<title>Not found</title>"));
}
