use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use entry_router::{
    AppConfig, AppState, MockIdentityResolver, StaticLanding,
    auth::ResolverError,
    create_router,
    models::{Metadata, User},
};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

fn app(resolver: Arc<MockIdentityResolver>) -> axum::Router {
    let state = AppState {
        resolver,
        landing: Arc::new(StaticLanding),
        config: AppConfig::default(),
    };
    create_router(state)
}

fn entry_request() -> Request<Body> {
    Request::builder()
        .uri("/")
        .header(header::COOKIE, "sb-access-token=some-session")
        .body(Body::empty())
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn user_with(user_metadata: Metadata, app_metadata: Metadata) -> User {
    User {
        user_metadata,
        app_metadata,
        ..User::default()
    }
}

#[tokio::test]
async fn test_user_metadata_username_redirects_to_library() {
    let resolver = Arc::new(MockIdentityResolver::returning_user(user_with(
        Metadata::from([("username", json!("alice"))]),
        Metadata::default(),
    )));

    let response = app(resolver.clone()).oneshot(entry_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/library");
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_app_metadata_username_redirects_to_library() {
    let resolver = Arc::new(MockIdentityResolver::returning_user(user_with(
        Metadata::default(),
        Metadata::from([("username", json!("bob"))]),
    )));

    let response = app(resolver).oneshot(entry_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/library");
}

#[tokio::test]
async fn test_incomplete_profile_redirects_to_onboarding() {
    let resolver = Arc::new(MockIdentityResolver::returning_user(user_with(
        Metadata::default(),
        Metadata::default(),
    )));

    let response = app(resolver).oneshot(entry_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/onboarding");
}

#[tokio::test]
async fn test_anonymous_visitor_gets_landing_page() {
    let resolver = Arc::new(MockIdentityResolver::anonymous());

    let response = app(resolver).oneshot(entry_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "private, no-store"
    );
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    assert!(body_string(response).await.contains("<html"));
}

#[tokio::test]
async fn test_expired_session_falls_back_to_landing() {
    let resolver = Arc::new(MockIdentityResolver::failing(ResolverError::Auth(
        "session expired".to_string(),
    )));

    let response = app(resolver.clone()).oneshot(entry_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("<html"));
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_unexpected_fault_falls_back_to_landing() {
    let resolver = Arc::new(MockIdentityResolver::failing(ResolverError::Unexpected(
        "connection refused".to_string(),
    )));

    let response = app(resolver).oneshot(entry_request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("<html"));
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let resolver = Arc::new(MockIdentityResolver::anonymous());

    let response = app(resolver).oneshot(entry_request()).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_health_check() {
    let resolver = Arc::new(MockIdentityResolver::anonymous());

    let response = app(resolver.clone())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_caller_request_id_is_echoed_back() {
    let resolver = Arc::new(MockIdentityResolver::anonymous());

    let request = Request::builder()
        .uri("/?code=one-time-callback-code")
        .header("x-request-id", "req-from-edge-proxy")
        .body(Body::empty())
        .unwrap();

    let response = app(resolver).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-from-edge-proxy");
}
