//! In-process router tests.
//!
//! The pool is lazy and never connects: every request below is answered by
//! the permission layer, the body extractor or the response cache.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use libris_server::{
    api,
    config::AppConfig,
    models::{
        author::Author,
        user::{TokenType, User, UserClaims},
    },
    repository::Repository,
    services::{
        cache::{self, CacheStore, MemoryStore},
        Services,
    },
    AppState,
};

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    secret: String,
}

fn test_app() -> TestApp {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(Repository::new(pool), &config, store.clone());
    let secret = config.auth.jwt_secret.clone();

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    TestApp {
        router: api::create_router(state),
        store,
        secret,
    }
}

fn user(is_staff: bool, is_superuser: bool) -> User {
    User {
        id: 42,
        username: "reader".to_string(),
        email: None,
        first_name: String::new(),
        last_name: String::new(),
        password: String::new(),
        is_staff,
        is_superuser,
        is_active: true,
        date_joined: Utc::now(),
    }
}

fn token(app: &TestApp, is_staff: bool, is_superuser: bool, token_type: TokenType) -> String {
    UserClaims::for_user(&user(is_staff, is_superuser), token_type, chrono::Duration::minutes(5))
        .create_token(&app.secret)
        .expect("token")
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

#[tokio::test]
async fn test_health_does_not_need_database() {
    let app = test_app();

    let (status, body) = send(&app, request(Method::GET, "/api/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_catalog_writes_require_staff() {
    let app = test_app();
    let member = token(&app, false, false, TokenType::Access);
    let author = r#"{"name": "Ursula K. Le Guin"}"#;
    let book = r#"{"title": "The Dispossessed", "author": 1}"#;

    let cases = [
        (Method::POST, "/api/authors/create/", Some(author)),
        (Method::PUT, "/api/authors/1/update/", Some(author)),
        (Method::DELETE, "/api/authors/1/delete/", None),
        (Method::POST, "/api/books/create/", Some(book)),
        (Method::PUT, "/api/books/1/update/", Some(book)),
        (Method::DELETE, "/api/books/1/delete/", None),
        (Method::GET, "/api/library/statistics/", None),
        (Method::GET, "/api/borrowers/", None),
    ];

    for (method, uri, body) in cases {
        let (status, json) = send(&app, request(method.clone(), uri, Some(&member), body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(json["error"], "PermissionDenied");
    }
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = test_app();

    for uri in ["/api/books/borrow/", "/api/books/return/"] {
        let (status, _) = send(&app, request(Method::POST, uri, None, Some(r#"{"book_id": 1}"#))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let (status, _) = send(&app, request(Method::GET, "/api/auth/me/", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_superuser_without_staff_flag_cannot_read_statistics() {
    let app = test_app();
    let admin = token(&app, false, true, TokenType::Access);

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/library/statistics/", Some(&admin), None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_staff_cannot_change_roles() {
    let app = test_app();
    let staff = token(&app, true, false, TokenType::Access);

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            "/api/users/1/roles/",
            Some(&staff),
            Some(r#"{"is_staff": true, "is_superuser": true}"#),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Administrator privileges required");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = test_app();
    let refresh = token(&app, true, true, TokenType::Refresh);

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/library/statistics/", Some(&refresh), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_borrow_body_is_bad_request() {
    let app = test_app();
    let member = token(&app, false, false, TokenType::Access);

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/books/borrow/", Some(&member), Some(r#"{"book_id": "#)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn test_author_list_served_from_cache() {
    let app = test_app();
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let cached = vec![Author {
        id: 1,
        name: "Octavia E. Butler".to_string(),
        bio: None,
        birth_date: None,
        created_at: created,
        updated_at: created,
    }];
    app.store
        .set(
            cache::AUTHOR_LIST,
            serde_json::to_string(&cached).unwrap(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let (status, body) = send(&app, request(Method::GET, "/api/authors/", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Octavia E. Butler");
}

#[tokio::test]
async fn test_empty_cached_book_list_is_returned() {
    let app = test_app();
    app.store
        .set(cache::BOOK_LIST, "[]".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    let (status, body) = send(&app, request(Method::GET, "/api/books/", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_search_cached_per_raw_query() {
    let app = test_app();
    app.store
        .set(
            &cache::search_key("title=dune&available=true"),
            "[]".to_string(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/search-filter/?title=dune&available=true", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unparsable_id_returns_error_body() {
    let app = test_app();

    let (status, body) = send(&app, request(Method::GET, "/api/books/abc/", None, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);
    assert_eq!(body["error"], "BadValue");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_unparsable_id_behind_permission_layer_returns_error_body() {
    let app = test_app();
    let staff = token(&app, true, false, TokenType::Access);

    let (status, body) = send(
        &app,
        request(Method::DELETE, "/api/authors/abc/delete/", Some(&staff), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_duplicate_search_parameter_returns_error_body() {
    let app = test_app();

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/search-filter/?available=true&available=false", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 5);
}

#[tokio::test]
async fn test_borrow_without_book_id_is_not_found() {
    let app = test_app();
    let member = token(&app, false, false, TokenType::Access);

    for uri in ["/api/books/borrow/", "/api/books/return/"] {
        let (status, body) = send(&app, request(Method::POST, uri, Some(&member), Some("{}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["message"], "Book not found");
    }
}
